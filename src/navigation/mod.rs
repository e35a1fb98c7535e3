//! Everything needed to turn world geometry into walkable maps and serve
//! paths through them
//!

pub mod error;
pub mod follower;
pub mod geometry;
pub mod maps;
pub mod pathing;
pub mod request_manager;
pub mod settings;
pub mod triangulation;
pub mod world;
