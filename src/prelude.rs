//! `use bevy_navigator_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::navigation::{
	error::*,
	follower::*,
	geometry::*,
	maps::{grid::*, navmesh::*, point_cloud::*, terrain::*, *},
	pathing::{astar::*, line::*, search::*, smoothing::*, *},
	request_manager::*,
	settings::*,
	triangulation::{ear_clipping::*, *},
	world::*,
	*,
};

#[doc(hidden)]
pub use crate::plugin::{follow_layer::*, request_layer::*, *};
