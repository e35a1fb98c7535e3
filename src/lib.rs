//! This is a plugin for Bevy game engine to build walkable maps of a world
//! and move agents along paths found through them.
//!
//! Maps come in three flavours, a uniform grid, a point cloud and a
//! triangulated navigation mesh. Paths are computed off the main thread by a
//! request manager and handed back to agents on a fixed polling cadence
//!

pub mod navigation;
pub mod plugin;

pub mod prelude;
