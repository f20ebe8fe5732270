//! Room-changed notifications.
//!
//! Observers are called synchronously, in subscription order, before
//! [`DungeonSession::update_player_position`](crate::session::DungeonSession::update_player_position)
//! returns. They receive the event by reference and cannot reach back into
//! the session.

use dungeon_logic::graph::NodeId;

/// The player entered a different room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomChanged {
    pub entered: NodeId,
    pub previous: Option<NodeId>,
    /// True the first time the room is entered
    pub first_visit: bool,
}

/// Handle returned by [`RoomObservers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

type Observer = Box<dyn FnMut(&RoomChanged)>;

/// Ordered list of room-changed observers.
#[derive(Default)]
pub struct RoomObservers {
    observers: Vec<(ObserverId, Observer)>,
    next_id: u32,
}

impl RoomObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&RoomChanged) + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(i, _)| *i != id);
        self.observers.len() != before
    }

    pub fn notify(&mut self, event: &RoomChanged) {
        for (_, observer) in &mut self.observers {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for RoomObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomObservers")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn event(n: u32) -> RoomChanged {
        RoomChanged {
            entered: NodeId(n),
            previous: None,
            first_visit: true,
        }
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut observers = RoomObservers::new();
        for tag in ["lighting", "minimap", "camera"] {
            let log = Rc::clone(&log);
            observers.subscribe(move |e| log.borrow_mut().push((tag, e.entered)));
        }
        observers.notify(&event(4));
        assert_eq!(
            *log.borrow(),
            vec![("lighting", NodeId(4)), ("minimap", NodeId(4)), ("camera", NodeId(4))]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut observers = RoomObservers::new();
        let c = Rc::clone(&count);
        let id = observers.subscribe(move |_| *c.borrow_mut() += 1);
        observers.notify(&event(1));
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.notify(&event(2));
        assert_eq!(*count.borrow(), 1);
        assert!(observers.is_empty());
    }
}
