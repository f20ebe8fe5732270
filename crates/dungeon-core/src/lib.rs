//! Dungeon Core - procedural dungeon assembly engine
//!
//! Builds a playable level from a designer-authored room node graph and a
//! library of room templates, then runs it.
//!
//! # Architecture
//!
//! - **Generation**: seeded backtracking search placing one template per
//!   graph node so that every graph edge is a pair of mated doorways and no
//!   two rooms overlap
//! - **Stitching**: seals the doorways the layout left unused and spawns door
//!   entities on the connected ones (locked in boss rooms)
//! - **Session**: an ECS world (via `hecs`) of room and door entities plus
//!   the current/previous room, room-changed observers and lighting fades
//!
//! # Example
//!
//! ```rust,no_run
//! use dungeon_core::prelude::*;
//!
//! let loaded = load_level_from_file("data/sample_level.json").unwrap();
//! let layout = generate_level(&loaded.level, &loaded.layout).unwrap();
//! let mut session = DungeonSession::new(layout, &loaded.level.templates, loaded.settings).unwrap();
//!
//! session.subscribe(|e| println!("entered room {}", e.entered));
//! let start = session.player_start_position();
//! session.update_player_position(start);
//! session.tick(1.0 / 60.0);
//! ```

pub mod assets;
pub mod components;
pub mod events;
pub mod generation;
pub mod session;
pub mod stitching;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::assets::{load_level_from_file, load_level_from_str, AssetError, LoadedLevel};
    pub use crate::components::*;
    pub use crate::events::{ObserverId, RoomChanged};
    pub use crate::generation::{generate_layout, generate_level, LayoutConfig, LayoutFailure, SelectionPolicy};
    pub use crate::session::DungeonSession;
    pub use crate::stitching::{StitchError, StitchReport};
}
