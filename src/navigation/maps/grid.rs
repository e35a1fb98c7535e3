//! A uniform lattice of [SamplePoint] with 8-way adjacency.
//!
//! Grids can be persisted as a flat run of little-endian `f32`:
//!
//! ```text
//! count,
//! grid_x, grid_y, world_x, world_y, world_z, walkable, penalty, // count / 7 times
//! size_x, size_y, min_penalty, max_penalty
//! ```
//!
//! where `count` is the number of per-point floats that follow it
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Number of floats describing a single point in a persisted grid
const FLOATS_PER_POINT: usize = 7;
/// Number of floats after the points in a persisted grid
const TRAILER_FLOATS: usize = 4;
/// Payloads with fewer floats than this are rejected outright
const MIN_PAYLOAD_FLOATS: usize = 9;

/// Dimensions and penalty bounds of a grid. A default (all zero) summary
/// signals that no grid could be imported
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub struct GridSummary {
	/// Number of columns
	pub size_x: u32,
	/// Number of rows
	pub size_y: u32,
	/// Smallest penalty
	pub min_penalty: i32,
	/// Largest penalty
	pub max_penalty: i32,
}

/// Sampled lattice covering a rectangular region
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridMap {
	/// Number of columns and rows
	size: UVec2,
	/// Corner of the region with the smallest `x` and `z`
	bottom_left: Vec3,
	/// Half the spacing of the lattice
	node_radius: f32,
	/// Row-major samples, index `y * size.x + x`
	points: Vec<SamplePoint>,
	/// Smallest penalty of any sample
	min_penalty: i32,
	/// Largest penalty of any sample
	max_penalty: i32,
}

impl GridMap {
	/// Create a new instance of [GridMap] by sampling the world
	pub fn build(
		settings: &GridSettings,
		world: &dyn NavigationWorld,
		terrain: &TerrainTable,
	) -> Self {
		let (size, points) = sample_region(settings, world, terrain);
		let (min_penalty, max_penalty) = penalty_bounds(&points);
		GridMap {
			size,
			bottom_left: settings.bottom_left(),
			node_radius: settings.node_radius,
			points,
			min_penalty,
			max_penalty,
		}
	}
	/// Get the number of columns and rows
	pub fn get_size(&self) -> UVec2 {
		self.size
	}
	/// Get the lattice spacing halved
	pub fn get_node_radius(&self) -> f32 {
		self.node_radius
	}
	/// Get every sample in row-major order
	pub fn get_points(&self) -> &[SamplePoint] {
		&self.points
	}
	/// Get the smallest penalty
	pub fn get_min_penalty(&self) -> i32 {
		self.min_penalty
	}
	/// Get the largest penalty
	pub fn get_max_penalty(&self) -> i32 {
		self.max_penalty
	}
	/// Dimensions and penalty bounds
	pub fn summary(&self) -> GridSummary {
		GridSummary {
			size_x: self.size.x,
			size_y: self.size.y,
			min_penalty: self.min_penalty,
			max_penalty: self.max_penalty,
		}
	}
	/// Index into [GridMap::get_points] of a column and row
	pub fn index_of(&self, cell: UVec2) -> Option<usize> {
		if cell.x < self.size.x && cell.y < self.size.y {
			Some((cell.y * self.size.x + cell.x) as usize)
		} else {
			None
		}
	}
	/// Get the sample at a column and row
	pub fn get_point(&self, cell: UVec2) -> Option<&SamplePoint> {
		self.index_of(cell).map(|i| &self.points[i])
	}
	/// Column and row containing a world position, positions outside the
	/// region are clamped onto its edge
	pub fn node_from_world_point(&self, position: Vec3) -> UVec2 {
		let diameter = self.node_radius * 2.0;
		let local = position - self.bottom_left;
		let clamp = |value: f32, count: u32| -> u32 {
			let cell = (value / diameter).floor();
			if cell.is_nan() || cell < 0.0 {
				0
			} else {
				(cell as u32).min(count.saturating_sub(1))
			}
		};
		UVec2::new(clamp(local.x, self.size.x), clamp(local.z, self.size.y))
	}
	/// Indices of the up to 8 samples around a sample
	pub fn neighbour_indices(&self, index: usize) -> Vec<usize> {
		let mut neighbours = Vec::with_capacity(8);
		let Some(point) = self.points.get(index) else {
			return neighbours;
		};
		let cell = point.get_grid().as_ivec2();
		for dy in -1..=1 {
			for dx in -1..=1 {
				if dx == 0 && dy == 0 {
					continue;
				}
				let n = cell + IVec2::new(dx, dy);
				if n.x < 0 || n.y < 0 {
					continue;
				}
				if let Some(i) = self.index_of(n.as_uvec2()) {
					neighbours.push(i);
				}
			}
		}
		neighbours
	}
	/// Smooth the penalties with a box blur of `2 * blur_size + 1` samples
	/// square, sample indices past the edges are clamped. The penalty bounds
	/// are recalculated afterwards
	pub fn blur(&mut self, blur_size: usize) {
		if blur_size == 0 || self.points.is_empty() {
			return;
		}
		let width = self.size.x as usize;
		let height = self.size.y as usize;
		let extent = blur_size as isize;
		let kernel = (2 * blur_size + 1) as f32;
		let clamp = |v: isize, len: usize| v.clamp(0, len as isize - 1) as usize;
		let mut horizontal = vec![0i64; self.points.len()];
		for y in 0..height {
			for x in 0..width {
				let mut sum = 0i64;
				for k in -extent..=extent {
					let sx = clamp(x as isize + k, width);
					sum += self.points[y * width + sx].get_penalty() as i64;
				}
				horizontal[y * width + x] = sum;
			}
		}
		for y in 0..height {
			for x in 0..width {
				let mut sum = 0i64;
				for k in -extent..=extent {
					let sy = clamp(y as isize + k, height);
					sum += horizontal[sy * width + x];
				}
				let blurred = (sum as f32 / (kernel * kernel)).round() as i32;
				self.points[y * width + x].set_penalty(blurred);
			}
		}
		let (min, max) = penalty_bounds(&self.points);
		self.min_penalty = min;
		self.max_penalty = max;
	}
	/// Serialise the grid to the persisted float layout
	pub fn export(&self) -> Vec<u8> {
		let count = self.points.len() * FLOATS_PER_POINT;
		let mut floats: Vec<f32> = Vec::with_capacity(1 + count + TRAILER_FLOATS);
		floats.push(count as f32);
		for p in self.points.iter() {
			let world = p.get_world();
			floats.extend_from_slice(&[
				p.get_grid().x as f32,
				p.get_grid().y as f32,
				world.x,
				world.y,
				world.z,
				if p.is_walkable() { 1.0 } else { 0.0 },
				p.get_penalty() as f32,
			]);
		}
		floats.extend_from_slice(&[
			self.size.x as f32,
			self.size.y as f32,
			self.min_penalty as f32,
			self.max_penalty as f32,
		]);
		floats.iter().flat_map(|f| f.to_le_bytes()).collect()
	}
	/// Deserialise a grid from the persisted float layout
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, NavError> {
		if bytes.len() % 4 != 0 {
			return Err(NavError::CorruptPayload(format!(
				"{} bytes is not a whole number of floats",
				bytes.len()
			)));
		}
		let floats: Vec<f32> = bytes
			.chunks_exact(4)
			.map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
			.collect();
		if floats.len() < MIN_PAYLOAD_FLOATS {
			return Err(NavError::UndersizedPayload {
				floats: floats.len(),
			});
		}
		let count = floats[0] as usize;
		let expected = count.checked_add(1 + TRAILER_FLOATS);
		if count % FLOATS_PER_POINT != 0 || expected != Some(floats.len()) {
			return Err(NavError::CorruptPayload(format!(
				"header announces {} point floats but {} floats were found",
				count,
				floats.len()
			)));
		}
		let trailer = &floats[1 + count..];
		let size = UVec2::new(trailer[0] as u32, trailer[1] as u32);
		let points: Vec<SamplePoint> = floats[1..1 + count]
			.chunks_exact(FLOATS_PER_POINT)
			.map(|f| {
				SamplePoint::new(
					UVec2::new(f[0] as u32, f[1] as u32),
					Vec3::new(f[2], f[3], f[4]),
					f[5] != 0.0,
					f[6] as i32,
				)
			})
			.collect();
		if size.x.checked_mul(size.y).map(|n| n as usize) != Some(points.len()) {
			return Err(NavError::CorruptPayload(format!(
				"a {}x{} grid cannot hold {} points",
				size.x,
				size.y,
				points.len()
			)));
		}
		// the lattice spacing is recovered from the first two samples
		let first = points[0].get_world();
		let diameter = if size.x > 1 {
			points[1].get_world().x - first.x
		} else if size.y > 1 {
			points[size.x as usize].get_world().z - first.z
		} else {
			1.0
		};
		if diameter <= 0.0 || !diameter.is_finite() {
			return Err(NavError::CorruptPayload(
				"samples are not laid out as a lattice".to_string(),
			));
		}
		let node_radius = diameter * 0.5;
		Ok(GridMap {
			size,
			bottom_left: Vec3::new(first.x - node_radius, 0.0, first.z - node_radius),
			node_radius,
			points,
			min_penalty: trailer[2] as i32,
			max_penalty: trailer[3] as i32,
		})
	}
	/// Import a persisted grid. A rejected payload yields a zeroed
	/// [GridSummary] and no grid, the caller should regenerate the map
	pub fn import(bytes: &[u8]) -> (GridSummary, Option<GridMap>) {
		match GridMap::from_bytes(bytes) {
			Ok(grid) => (grid.summary(), Some(grid)),
			Err(e) => {
				warn!("Grid import rejected: {}", e);
				(GridSummary::default(), None)
			}
		}
	}
	/// Persist the grid to a file
	pub fn write_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), NavError> {
		std::fs::write(path, self.export())?;
		Ok(())
	}
	/// Import a grid persisted to a file, see [GridMap::import]
	pub fn read_from_file(path: impl AsRef<std::path::Path>) -> (GridSummary, Option<GridMap>) {
		match std::fs::read(path) {
			Ok(bytes) => GridMap::import(&bytes),
			Err(e) => {
				warn!("Grid file could not be read: {}", e);
				(GridSummary::default(), None)
			}
		}
	}
}

impl WeightedLattice for GridMap {
	fn sample(&self, index: usize) -> Option<&SamplePoint> {
		self.points.get(index)
	}
	fn nearest_index(&self, position: Vec3) -> Option<usize> {
		if self.points.is_empty() {
			return None;
		}
		self.index_of(self.node_from_world_point(position))
	}
	fn neighbours(&self, index: usize) -> Vec<usize> {
		self.neighbour_indices(index)
	}
	fn node_count(&self) -> usize {
		self.points.len()
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// 10x10 settings with one sample per unit centred on `(4.5, 4.5)`
	fn settings() -> GridSettings {
		GridSettings {
			center: Vec3::new(4.5, 0.0, 4.5),
			region: Vec2::new(10.0, 10.0),
			..default()
		}
	}
	/// Flat floor under [settings]
	fn floor() -> BoxWorld {
		BoxWorld::new(WorldBox::new(
			Vec3::new(-0.5, -1.0, -0.5),
			Vec3::new(9.5, 0.0, 9.5),
		))
	}
	#[test]
	fn lattice_positions() {
		let grid = GridMap::build(&settings(), &floor(), &TerrainTable::default());
		assert_eq!(UVec2::new(10, 10), grid.get_size());
		let p = grid.get_point(UVec2::new(3, 7)).unwrap();
		assert_eq!(Vec3::new(3.0, 0.0, 7.0), p.get_world());
		assert_eq!(UVec2::new(3, 7), p.get_grid());
	}
	#[test]
	fn world_point_to_node() {
		let grid = GridMap::build(&settings(), &floor(), &TerrainTable::default());
		assert_eq!(UVec2::new(0, 0), grid.node_from_world_point(Vec3::ZERO));
		assert_eq!(UVec2::new(9, 9), grid.node_from_world_point(Vec3::new(9.0, 0.0, 9.0)));
		assert_eq!(UVec2::new(2, 6), grid.node_from_world_point(Vec3::new(2.4, 3.0, 5.6)));
		// clamped
		assert_eq!(UVec2::new(0, 9), grid.node_from_world_point(Vec3::new(-50.0, 0.0, 50.0)));
	}
	#[test]
	fn neighbours_of_corner_and_middle() {
		let grid = GridMap::build(&settings(), &floor(), &TerrainTable::default());
		assert_eq!(3, grid.neighbour_indices(0).len());
		let middle = grid.index_of(UVec2::new(5, 5)).unwrap();
		assert_eq!(8, grid.neighbour_indices(middle).len());
	}
	#[test]
	fn blur_spreads_penalty() {
		let world = floor().with_surface(
			WorldBox::new(Vec3::new(4.5, -1.0, 4.5), Vec3::new(5.5, 0.0, 5.5)).with_layers(1 << 7),
		);
		let mut grid = GridMap::build(&settings(), &world, &TerrainTable::default());
		assert_eq!(20, grid.get_max_penalty());
		grid.blur(1);
		// 20 spread over a 3x3 window
		let centre = grid.get_point(UVec2::new(5, 5)).unwrap().get_penalty();
		let side = grid.get_point(UVec2::new(4, 5)).unwrap().get_penalty();
		let far = grid.get_point(UVec2::new(0, 0)).unwrap().get_penalty();
		assert_eq!(2, centre);
		assert_eq!(2, side);
		assert_eq!(0, far);
		assert_eq!(2, grid.get_max_penalty());
		assert_eq!(0, grid.get_min_penalty());
	}
	#[test]
	fn blur_zero_is_noop() {
		let mut grid = GridMap::build(&settings(), &floor(), &TerrainTable::default());
		let before = grid.clone();
		grid.blur(0);
		assert_eq!(before, grid);
	}
	#[test]
	fn export_import_round_trip() {
		let world = floor()
			.with_obstacle(WorldBox::new(Vec3::new(2.5, 0.0, 2.5), Vec3::new(3.5, 1.0, 3.5)))
			.with_surface(
				WorldBox::new(Vec3::new(6.5, -1.0, 6.5), Vec3::new(9.5, 0.0, 9.5))
					.with_layers(1 << 6),
			);
		let grid = GridMap::build(&settings(), &world, &TerrainTable::default());
		let bytes = grid.export();
		assert_eq!((1 + 700 + 4) * 4, bytes.len());
		let (summary, imported) = GridMap::import(&bytes);
		let imported = imported.unwrap();
		assert_eq!(grid.summary(), summary);
		assert_eq!(grid, imported);
	}
	#[test]
	fn undersized_payload_rejected() {
		let bytes: Vec<u8> = [0.0f32; 8].iter().flat_map(|f| f.to_le_bytes()).collect();
		let (summary, grid) = GridMap::import(&bytes);
		assert_eq!(GridSummary::default(), summary);
		assert!(grid.is_none());
		assert!(matches!(
			GridMap::from_bytes(&bytes),
			Err(NavError::UndersizedPayload { floats: 8 })
		));
	}
	#[test]
	fn mismatched_count_rejected() {
		let grid = GridMap::build(&settings(), &floor(), &TerrainTable::default());
		let mut bytes = grid.export();
		bytes.truncate(bytes.len() - 4);
		assert!(matches!(
			GridMap::from_bytes(&bytes),
			Err(NavError::CorruptPayload(_))
		));
	}
	#[test]
	fn oversized_trailer_rejected() {
		let mut floats = vec![7.0f32, 0.0, 0.0, 0.5, 0.0, 0.5, 1.0, 0.0];
		floats.extend_from_slice(&[100000.0, 100000.0, 0.0, 0.0]);
		let bytes: Vec<u8> = floats.iter().flat_map(|f| f.to_le_bytes()).collect();
		let (summary, grid) = GridMap::import(&bytes);
		assert_eq!(GridSummary::default(), summary);
		assert!(grid.is_none());
		assert!(matches!(
			GridMap::from_bytes(&bytes),
			Err(NavError::CorruptPayload(_))
		));
	}
	#[test]
	fn oversized_header_rejected() {
		let mut floats = vec![f32::MAX, 0.0, 0.0, 0.5, 0.0, 0.5, 1.0, 0.0];
		floats.extend_from_slice(&[1.0, 1.0, 0.0, 0.0]);
		let bytes: Vec<u8> = floats.iter().flat_map(|f| f.to_le_bytes()).collect();
		assert!(matches!(
			GridMap::from_bytes(&bytes),
			Err(NavError::CorruptPayload(_))
		));
	}
	#[test]
	fn file_round_trip() {
		let grid = GridMap::build(&settings(), &floor(), &TerrainTable::default());
		let path = std::env::temp_dir().join("bevy_navigator_plugin_grid_round_trip.bin");
		grid.write_to_file(&path).unwrap();
		let (summary, imported) = GridMap::read_from_file(&path);
		let _ = std::fs::remove_file(&path);
		assert_eq!(grid.summary(), summary);
		assert_eq!(Some(grid), imported);
	}
}
