//! Pure dungeon assembly logic.
//!
//! This crate contains the data model and every algorithm that does not
//! need randomness, an ECS world, or I/O. Functions take plain data and
//! return results, so they are unit-testable on their own and shared by the
//! layout engine, the runtime session and the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`doors`] | Door object placement for connected doorways, boss-room locking |
//! | [`geometry`] | Tile positions, inclusive tile rectangles, world positions |
//! | [`graph`] | Room node graph arena, editor connection rules, validation, placement order |
//! | [`level`] | Level definitions (templates + candidate graphs) and designer checks |
//! | [`lighting`] | Suspension-free fade-in interpolation |
//! | [`placement`] | Placed rooms and doorways, the layout engine's output |
//! | [`room_types`] | Room node type registry and facets |
//! | [`settings`] | Tile size, fade timing, door offsets |
//! | [`spawn`] | Nearest spawn point resolution |
//! | [`template`] | Room templates, doorways, template library |
//! | [`tilemap`] | Tile layers and doorway sealing |
//! | [`validate`] | Layout invariant checks (coverage, overlap, doorway mating, connectivity) |

pub mod doors;
pub mod geometry;
pub mod graph;
pub mod level;
pub mod lighting;
pub mod placement;
pub mod room_types;
pub mod settings;
pub mod spawn;
pub mod template;
pub mod tilemap;
pub mod validate;
