//! Samples of the world held in a kd-tree. Adjacency is not fixed, the
//! neighbours of a sample are whatever lies within one diagonal step of it
//!

use kdtree::{distance::squared_euclidean, KdTree};

use crate::prelude::*;
use bevy::prelude::*;

/// Proximity searchable set of [SamplePoint]
#[derive(Clone, Debug)]
pub struct PointCloudMap {
	/// Every sample taken
	points: Vec<SamplePoint>,
	/// Sample world positions indexing into `points`
	tree: KdTree<f32, usize, [f32; 3]>,
	/// Samples closer than this are neighbours
	neighbour_radius: f32,
}

impl PointCloudMap {
	/// Create a new instance of [PointCloudMap] by sampling the world
	pub fn build(
		settings: &GridSettings,
		world: &dyn NavigationWorld,
		terrain: &TerrainTable,
	) -> Self {
		let (_, points) = sample_region(settings, world, terrain);
		// a diagonal step with a little slack for float error
		let neighbour_radius = settings.node_diameter() * std::f32::consts::SQRT_2 * 1.01;
		PointCloudMap::from_points(points, neighbour_radius)
	}
	/// Create a new instance of [PointCloudMap] from existing samples.
	/// Samples with a non-finite position are left out of the index
	pub fn from_points(points: Vec<SamplePoint>, neighbour_radius: f32) -> Self {
		let mut tree = KdTree::with_capacity(3, points.len().max(1));
		for (i, p) in points.iter().enumerate() {
			if let Err(e) = tree.add(p.get_world().to_array(), i) {
				warn!("Sample {} left out of the point cloud: {:?}", i, e);
			}
		}
		PointCloudMap {
			points,
			tree,
			neighbour_radius,
		}
	}
	/// Get every sample
	pub fn get_points(&self) -> &[SamplePoint] {
		&self.points
	}
	/// Get the radius within which samples are neighbours
	pub fn get_neighbour_radius(&self) -> f32 {
		self.neighbour_radius
	}
	/// Index of the sample closest to a world position
	pub fn nearest(&self, position: Vec3) -> Option<usize> {
		self.tree
			.nearest(&position.to_array(), 1, &squared_euclidean)
			.ok()?
			.first()
			.map(|(_, i)| **i)
	}
	/// Indices of the samples within `radius` of a world position, closest
	/// first
	pub fn within(&self, position: Vec3, radius: f32) -> Vec<usize> {
		// the tree compares squared distances
		match self
			.tree
			.within(&position.to_array(), radius * radius, &squared_euclidean)
		{
			Ok(found) => found.into_iter().map(|(_, i)| *i).collect(),
			Err(e) => {
				warn!("Point cloud radius query failed: {:?}", e);
				Vec::new()
			}
		}
	}
}

impl WeightedLattice for PointCloudMap {
	fn sample(&self, index: usize) -> Option<&SamplePoint> {
		self.points.get(index)
	}
	fn nearest_index(&self, position: Vec3) -> Option<usize> {
		self.nearest(position)
	}
	fn neighbours(&self, index: usize) -> Vec<usize> {
		let Some(point) = self.points.get(index) else {
			return Vec::new();
		};
		self.within(point.get_world(), self.neighbour_radius)
			.into_iter()
			.filter(|i| *i != index)
			.collect()
	}
	fn node_count(&self) -> usize {
		self.points.len()
	}
}
