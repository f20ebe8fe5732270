//! Component definitions for the dungeon session's ECS world.
//!
//! Components are plain data attached to room and door entities.
//! Behaviour lives on the session.

mod door;
mod room;

pub use door::*;
pub use room::*;
