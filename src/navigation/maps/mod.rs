//! Spatial maps describe where agents can walk and what it costs them.
//!
//! Three representations are supported:
//!
//! * [GridMap] - a uniform lattice of sample points with 8-way adjacency
//! * [PointCloudMap] - the same samples held in a kd-tree, adjacency is
//!   found by proximity
//! * [NavMesh] - the walkable surface triangulated around obstacles with a
//!   waypoint graph through the triangles
//!
//! A [MapBuilder] constructs any of them from a [NavigationWorld] and the
//! result is held as a [SpatialMap]
//!

pub mod grid;
pub mod navmesh;
pub mod point_cloud;
pub mod terrain;

use std::time::Duration;

use crate::prelude::*;
use bevy::prelude::*;

/// The representation a [SpatialMap] uses
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum MapKind {
	/// Uniform lattice
	#[default]
	Grid,
	/// Proximity searched samples
	PointCloud,
	/// Triangulated surface
	NavMesh,
}

/// A single sample of the world taken by a grid or point cloud
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SamplePoint {
	/// Column and row of the sample in the lattice
	grid: UVec2,
	/// Position of the sample on the surface below it
	world: Vec3,
	/// Whether agents may stand on the sample
	walkable: bool,
	/// Cost of moving onto the sample
	penalty: i32,
}

impl SamplePoint {
	/// Create a new instance of [SamplePoint]
	pub fn new(grid: UVec2, world: Vec3, walkable: bool, penalty: i32) -> Self {
		SamplePoint {
			grid,
			world,
			walkable,
			penalty,
		}
	}
	/// Get the column and row
	pub fn get_grid(&self) -> UVec2 {
		self.grid
	}
	/// Get the world position
	pub fn get_world(&self) -> Vec3 {
		self.world
	}
	/// Get whether the sample is walkable
	pub fn is_walkable(&self) -> bool {
		self.walkable
	}
	/// Get the movement penalty
	pub fn get_penalty(&self) -> i32 {
		self.penalty
	}
	/// Set the movement penalty
	pub fn set_penalty(&mut self, penalty: i32) {
		self.penalty = penalty;
	}
}

/// Sample the region described by `settings` into a row-major list of
/// [SamplePoint] (index `y * size.x + x`)
pub fn sample_region(
	settings: &GridSettings,
	world: &dyn NavigationWorld,
	terrain: &TerrainTable,
) -> (UVec2, Vec<SamplePoint>) {
	let size = settings.grid_size();
	let diameter = settings.node_diameter();
	let radius = settings.node_radius;
	let bottom_left = settings.bottom_left();
	let mut points = Vec::with_capacity((size.x * size.y) as usize);
	for y in 0..size.y {
		for x in 0..size.x {
			let lattice = bottom_left
				+ Vec3::new(
					x as f32 * diameter + radius,
					0.0,
					y as f32 * diameter + radius,
				);
			points.push(sample_point(
				UVec2::new(x, y),
				lattice,
				settings,
				world,
				terrain,
			));
		}
	}
	(size, points)
}

/// Probe the world beneath a lattice point and classify what is found
fn sample_point(
	grid: UVec2,
	lattice: Vec3,
	settings: &GridSettings,
	world: &dyn NavigationWorld,
	terrain: &TerrainTable,
) -> SamplePoint {
	let origin = lattice + Vec3::Y * settings.height_clearance;
	let Some(hit) = world.cast_down(origin, settings.probe_depth) else {
		return SamplePoint::new(grid, lattice, false, settings.obstacle_proximity_penalty);
	};
	let position = Vec3::new(lattice.x, hit.position.y, lattice.z);
	let half_extents = Vec3::new(
		settings.node_radius,
		settings.height_clearance * 0.5,
		settings.node_radius,
	);
	if world.overlaps_obstacle(position, half_extents) {
		SamplePoint::new(grid, position, false, settings.obstacle_proximity_penalty)
	} else {
		let penalty = terrain.penalty_for(hit.layers).unwrap_or(0);
		SamplePoint::new(grid, position, true, penalty)
	}
}

/// Smallest and largest penalty of a set of samples, `(0, 0)` when empty
pub fn penalty_bounds(points: &[SamplePoint]) -> (i32, i32) {
	let min = points.iter().map(|p| p.penalty).min().unwrap_or(0);
	let max = points.iter().map(|p| p.penalty).max().unwrap_or(0);
	(min, max)
}

/// A built map of any kind
#[derive(Clone, Debug)]
pub enum SpatialMap {
	/// Uniform lattice
	Grid(GridMap),
	/// Proximity searched samples
	PointCloud(PointCloudMap),
	/// Triangulated surface
	NavMesh(NavMesh),
}

impl SpatialMap {
	/// The representation in use
	pub fn kind(&self) -> MapKind {
		match self {
			SpatialMap::Grid(_) => MapKind::Grid,
			SpatialMap::PointCloud(_) => MapKind::PointCloud,
			SpatialMap::NavMesh(_) => MapKind::NavMesh,
		}
	}
	/// Number of samples or graph nodes
	pub fn node_count(&self) -> usize {
		match self {
			SpatialMap::Grid(g) => g.get_points().len(),
			SpatialMap::PointCloud(p) => p.get_points().len(),
			SpatialMap::NavMesh(n) => n.get_nodes().len(),
		}
	}
	/// How often results computed against this map are collected
	pub fn poll_interval(&self, settings: &RequestSettings) -> Duration {
		settings.poll_interval(self.kind())
	}
	/// Find the raw waypoints between two world positions, `None` when no
	/// route exists
	pub fn find_waypoints(&self, start: Vec3, end: Vec3) -> Option<Vec<Vec3>> {
		match self {
			SpatialMap::Grid(g) => find_weighted_path(g, start, end),
			SpatialMap::PointCloud(p) => find_weighted_path(p, start, end),
			SpatialMap::NavMesh(n) => n.find_path(start, end),
		}
	}
	/// Get the grid if this is one
	pub fn as_grid(&self) -> Option<&GridMap> {
		match self {
			SpatialMap::Grid(g) => Some(g),
			_ => None,
		}
	}
	/// Get the grid mutably if this is one
	pub fn as_grid_mut(&mut self) -> Option<&mut GridMap> {
		match self {
			SpatialMap::Grid(g) => Some(g),
			_ => None,
		}
	}
	/// Get the navmesh if this is one
	pub fn as_navmesh(&self) -> Option<&NavMesh> {
		match self {
			SpatialMap::NavMesh(n) => Some(n),
			_ => None,
		}
	}
}

impl PathFinder for SpatialMap {
	fn find_path(&self, query: &PathQuery) -> Option<Path> {
		let waypoints = self.find_waypoints(query.get_start(), query.get_end())?;
		if waypoints.is_empty() {
			return None;
		}
		if query.is_smooth() {
			Some(Path::Smooth(SmoothPath::new(
				waypoints,
				query.get_start(),
				query.get_turn_distance(),
				query.get_stop_distance(),
			)))
		} else {
			Some(Path::Basic(waypoints))
		}
	}
}

/// Builds any kind of [SpatialMap] with one set of settings and terrain
#[derive(Clone, Debug, Default)]
pub struct MapBuilder {
	/// Sampling and generation settings
	settings: NavigatorSettings,
	/// Terrain penalties
	terrain: TerrainTable,
}

impl MapBuilder {
	/// Create a new instance of [MapBuilder]
	pub fn new(settings: NavigatorSettings, terrain: TerrainTable) -> Self {
		MapBuilder { settings, terrain }
	}
	/// Get the settings
	pub fn get_settings(&self) -> &NavigatorSettings {
		&self.settings
	}
	/// Get the terrain table
	pub fn get_terrain(&self) -> &TerrainTable {
		&self.terrain
	}
	/// Build a map of the requested kind from the world
	pub fn build(
		&self,
		kind: MapKind,
		world: &dyn NavigationWorld,
	) -> Result<SpatialMap, NavError> {
		let map = match kind {
			MapKind::Grid => {
				let mut grid = GridMap::build(&self.settings.grid, world, &self.terrain);
				if let Some(size) = self.settings.grid.blur_size {
					grid.blur(size);
				}
				SpatialMap::Grid(grid)
			}
			MapKind::PointCloud => SpatialMap::PointCloud(PointCloudMap::build(
				&self.settings.grid,
				world,
				&self.terrain,
			)),
			MapKind::NavMesh => {
				let ground = world.ground_footprint().ok_or(NavError::MissingGround)?;
				let obstacles = world.obstacle_footprints();
				SpatialMap::NavMesh(NavMesh::build(&ground, &obstacles, &self.settings.navmesh))
			}
		};
		debug!("Built {:?} map with {} nodes", kind, map.node_count());
		Ok(map)
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// Flat 10x10 world with a sandy strip along `x = 0`
	fn world() -> BoxWorld {
		BoxWorld::new(WorldBox::new(
			Vec3::new(-0.5, -1.0, -0.5),
			Vec3::new(9.5, 0.0, 9.5),
		))
		.with_surface(
			WorldBox::new(Vec3::new(-0.5, -1.0, -0.5), Vec3::new(0.5, 0.0, 9.5))
				.with_layers(1 << 7),
		)
		.with_obstacle(WorldBox::new(
			Vec3::new(4.5, 0.0, 4.5),
			Vec3::new(5.5, 2.0, 5.5),
		))
	}
	/// Settings covering [world] with one sample per unit
	fn settings() -> NavigatorSettings {
		NavigatorSettings {
			grid: GridSettings {
				center: Vec3::new(4.5, 0.0, 4.5),
				region: Vec2::new(10.0, 10.0),
				..default()
			},
			..default()
		}
	}
	#[test]
	fn samples_classified() {
		let settings = settings();
		let (size, points) = sample_region(&settings.grid, &world(), &TerrainTable::default());
		assert_eq!(UVec2::new(10, 10), size);
		assert_eq!(100, points.len());
		// sand strip
		assert_eq!(20, points[0].get_penalty());
		assert!(points[0].is_walkable());
		// plain ground
		assert_eq!(0, points[1].get_penalty());
		// the obstacle
		let blocked = points[5 * 10 + 5];
		assert!(!blocked.is_walkable());
		assert_eq!(20, blocked.get_penalty());
		assert_eq!(Vec3::new(5.0, 2.0, 5.0), blocked.get_world());
		// next to the obstacle is still walkable
		assert!(points[5 * 10 + 6].is_walkable());
	}
	#[test]
	fn builder_builds_every_kind() {
		let builder = MapBuilder::new(settings(), TerrainTable::default());
		for kind in [MapKind::Grid, MapKind::PointCloud, MapKind::NavMesh] {
			let map = builder.build(kind, &world()).unwrap();
			assert_eq!(kind, map.kind());
			assert!(map.node_count() > 0);
		}
	}
	#[test]
	fn navmesh_needs_ground() {
		/// A world without anything in it
		struct Void;
		impl NavigationWorld for Void {
			fn cast_down(&self, _: Vec3, _: f32) -> Option<ProbeHit> {
				None
			}
			fn overlaps_obstacle(&self, _: Vec3, _: Vec3) -> bool {
				false
			}
		}
		let builder = MapBuilder::default();
		let result = builder.build(MapKind::NavMesh, &Void);
		assert!(matches!(result, Err(NavError::MissingGround)));
	}
	#[test]
	fn smooth_query_gives_smooth_path() {
		let builder = MapBuilder::new(settings(), TerrainTable::default());
		let map = builder.build(MapKind::Grid, &world()).unwrap();
		let query = PathQuery::new(Vec3::new(1.0, 0.0, 1.0), Vec3::new(8.0, 0.0, 8.0))
			.smoothed(1.0, 2.0);
		let path = map.find_path(&query).unwrap();
		assert!(path.is_smooth());
		let basic = map
			.find_path(&PathQuery::new(Vec3::new(1.0, 0.0, 1.0), Vec3::new(8.0, 0.0, 8.0)))
			.unwrap();
		assert!(!basic.is_smooth());
	}
}
