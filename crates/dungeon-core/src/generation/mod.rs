//! Generation - procedural layout of dungeon levels.

mod config;
mod layout;

pub use config::*;
pub use layout::*;
