//! Door entity components.

use dungeon_logic::lighting::Fade;

/// Runtime door state.
///
/// Locked doors refuse to open until unlocked. Unlocking a door that was
/// open before it was locked opens it again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Door {
    pub open: bool,
    pub locked: bool,
    pub is_boss_room_door: bool,
    pub previously_opened: bool,
}

impl Door {
    pub fn new(is_boss_room_door: bool) -> Self {
        Self {
            open: false,
            locked: is_boss_room_door,
            is_boss_room_door,
            previously_opened: false,
        }
    }

    /// Open the door if it is not locked. Returns whether it is now open.
    pub fn open(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.open = true;
        self.previously_opened = true;
        true
    }

    pub fn lock(&mut self) {
        self.open = false;
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
        if self.previously_opened {
            self.open = true;
        }
    }
}

/// Door fade-in state.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoorLighting {
    pub is_lit: bool,
    pub fade: Option<Fade>,
}
