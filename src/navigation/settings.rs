//! Tunable values used while building maps, scheduling requests and steering
//! agents. Every default matches a value that has proven itself in play.
//!
//! With the `ron` feature the whole set can be loaded from disk, the format
//! is the serde representation of [NavigatorSettings]:
//!
//! ```text
//! (
//! 	grid: (center: (0.0, 0.0, 0.0), region: (100.0, 100.0), node_radius: 0.5),
//! 	follower: (speed: 7.5, smooth: false),
//! )
//! ```
//!
//! Omitted fields fall back to their defaults
//!

use std::time::Duration;

use crate::prelude::*;
use bevy::prelude::*;

/// Every group of settings used by the navigator
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Clone, Debug, Default, PartialEq, Reflect)]
pub struct NavigatorSettings {
	/// Sampling of grids and point clouds
	pub grid: GridSettings,
	/// Navmesh generation
	pub navmesh: NavMeshSettings,
	/// Request scheduling
	pub request: RequestSettings,
	/// Agent steering
	pub follower: FollowerSettings,
}

impl NavigatorSettings {
	/// Load [NavigatorSettings] from a `.ron` file
	#[cfg(feature = "ron")]
	pub fn from_ron(path: impl AsRef<std::path::Path>) -> Result<Self, NavError> {
		let file = std::fs::File::open(path)?;
		let settings = ron::de::from_reader(file)?;
		Ok(settings)
	}
}

/// How a rectangular region is sampled into a lattice of points
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct GridSettings {
	/// Middle of the sampled region
	pub center: Vec3,
	/// Width (`x`) and depth (`z`) of the sampled region
	pub region: Vec2,
	/// Half the spacing between two sample points
	pub node_radius: f32,
	/// Height above the region a probe starts from, also the height of the
	/// volume checked for obstacles
	pub height_clearance: f32,
	/// How far below its start a probe may travel
	pub probe_depth: f32,
	/// Penalty given to samples that are blocked or have no surface
	pub obstacle_proximity_penalty: i32,
	/// Extent of the box blur applied to penalties, the window is
	/// `2 * size + 1` samples wide
	pub blur_size: Option<usize>,
}

impl Default for GridSettings {
	fn default() -> Self {
		GridSettings {
			center: Vec3::ZERO,
			region: Vec2::new(100.0, 100.0),
			node_radius: 0.5,
			height_clearance: 4.5,
			probe_depth: 100.0,
			obstacle_proximity_penalty: 20,
			blur_size: None,
		}
	}
}

impl GridSettings {
	/// Spacing between two sample points
	pub fn node_diameter(&self) -> f32 {
		self.node_radius * 2.0
	}
	/// Number of samples along `x` and `z`
	pub fn grid_size(&self) -> UVec2 {
		let diameter = self.node_diameter();
		UVec2::new(
			(self.region.x / diameter).ceil().max(1.0) as u32,
			(self.region.y / diameter).ceil().max(1.0) as u32,
		)
	}
	/// Corner of the region with the smallest `x` and `z`
	pub fn bottom_left(&self) -> Vec3 {
		self.center - Vec3::new(self.region.x * 0.5, 0.0, self.region.y * 0.5)
	}
}

/// Values steering navmesh generation
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct NavMeshSettings {
	/// Triangles with a larger area gain a centroid node
	pub large_triangle_area: f32,
	/// Triangles with a smaller area are discarded as slivers
	pub min_triangle_area: f32,
	/// Consecutive boundary vertices closer than this are merged
	pub vertex_merge_distance: f32,
	/// Obstacle footprints are grown by this much before being removed
	pub obstacle_padding: f32,
}

impl Default for NavMeshSettings {
	fn default() -> Self {
		NavMeshSettings {
			large_triangle_area: 10.0,
			min_triangle_area: 0.01,
			vertex_merge_distance: 0.8,
			obstacle_padding: 1.0,
		}
	}
}

/// Cadence of result delivery and worker teardown
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct RequestSettings {
	/// Seconds between result polls when serving a grid
	pub grid_poll_interval: f32,
	/// Seconds between result polls when serving a point cloud
	pub point_cloud_poll_interval: f32,
	/// Seconds between result polls when serving a navmesh
	pub navmesh_poll_interval: f32,
	/// Seconds to wait for running workers on shutdown
	pub shutdown_timeout: f32,
}

impl Default for RequestSettings {
	fn default() -> Self {
		RequestSettings {
			grid_poll_interval: 0.9,
			point_cloud_poll_interval: 0.9,
			navmesh_poll_interval: 0.2,
			shutdown_timeout: 1.5,
		}
	}
}

impl RequestSettings {
	/// The poll interval used when serving a map of the given kind
	pub fn poll_interval(&self, kind: MapKind) -> Duration {
		let seconds = match kind {
			MapKind::Grid => self.grid_poll_interval,
			MapKind::PointCloud => self.point_cloud_poll_interval,
			MapKind::NavMesh => self.navmesh_poll_interval,
		};
		Duration::from_secs_f32(seconds.max(0.0))
	}
	/// The bounded wait applied on shutdown
	pub fn shutdown_wait(&self) -> Duration {
		Duration::from_secs_f32(self.shutdown_timeout.max(0.0))
	}
}

/// How an agent moves along its path
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct FollowerSettings {
	/// Units per second at full speed
	pub speed: f32,
	/// Rate of turning towards the next waypoint when smoothing
	pub turn_speed: f32,
	/// How early before a waypoint a smoothed turn begins
	pub turn_distance: f32,
	/// Distance over which the agent slows down before the end of the path
	pub stop_distance: f32,
	/// Follow turn boundaries instead of chasing waypoints
	pub smooth: bool,
	/// A target moving further than this from where it was when the last path
	/// was requested causes a new request
	pub repath_threshold: f32,
	/// Seconds between checks of whether the target moved
	pub repath_interval: f32,
	/// Distance at which a waypoint counts as reached when not smoothing
	pub arrival_radius: f32,
}

impl Default for FollowerSettings {
	fn default() -> Self {
		FollowerSettings {
			speed: 5.0,
			turn_speed: 3.0,
			turn_distance: 1.0,
			stop_distance: 3.0,
			smooth: true,
			repath_threshold: 0.5,
			repath_interval: 0.5,
			arrival_radius: 1.0,
		}
	}
}
