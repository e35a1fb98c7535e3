//! Weighted shortest paths over sampled lattices.
//!
//! Moving onto a sample costs the distance travelled plus the sample's
//! penalty. As penalties are never negative the straight line distance to
//! the target never overestimates, making it an admissible heuristic. Open
//! nodes are ordered by lowest estimated total, ties go to the node closer to
//! the target
//!

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::prelude::*;
use bevy::prelude::*;

/// A set of samples with some notion of adjacency
pub trait WeightedLattice {
	/// Get a sample by index
	fn sample(&self, index: usize) -> Option<&SamplePoint>;
	/// Index of the sample a world position belongs to
	fn nearest_index(&self, position: Vec3) -> Option<usize>;
	/// Indices of the samples reachable in one step
	fn neighbours(&self, index: usize) -> Vec<usize>;
	/// Number of samples
	fn node_count(&self) -> usize;
}

/// A sample waiting to be expanded
#[derive(Clone, Copy, Debug)]
struct OpenNode {
	/// Cost so far plus the heuristic
	f: f32,
	/// Heuristic alone
	h: f32,
	/// Sample index
	index: usize,
}

impl PartialEq for OpenNode {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
	/// Reversed so the [BinaryHeap] pops the cheapest node
	fn cmp(&self, other: &Self) -> Ordering {
		other
			.f
			.total_cmp(&self.f)
			.then_with(|| other.h.total_cmp(&self.h))
			.then_with(|| other.index.cmp(&self.index))
	}
}

impl PartialOrd for OpenNode {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Find the cheapest route between the samples nearest `start` and `end`.
///
/// Both samples must be walkable, the returned waypoints are the world
/// positions of the visited samples with runs in a straight line collapsed
pub fn find_weighted_path<L: WeightedLattice + ?Sized>(
	lattice: &L,
	start: Vec3,
	end: Vec3,
) -> Option<Vec<Vec3>> {
	let source = lattice.nearest_index(start)?;
	let target = lattice.nearest_index(end)?;
	let source_point = lattice.sample(source)?;
	let target_point = lattice.sample(target)?;
	if !source_point.is_walkable() || !target_point.is_walkable() {
		return None;
	}
	let goal = target_point.get_world();
	let count = lattice.node_count();
	let mut g_scores = vec![f32::INFINITY; count];
	let mut came_from: Vec<Option<usize>> = vec![None; count];
	let mut closed = vec![false; count];
	let mut open = BinaryHeap::new();
	g_scores[source] = 0.0;
	let h = source_point.get_world().distance(goal);
	open.push(OpenNode { f: h, h, index: source });

	while let Some(current) = open.pop() {
		if closed[current.index] {
			continue;
		}
		if current.index == target {
			return Some(simplify_waypoints(&retrace(lattice, &came_from, source, target)));
		}
		closed[current.index] = true;
		let Some(current_point) = lattice.sample(current.index) else {
			continue;
		};
		for n in lattice.neighbours(current.index) {
			if closed[n] {
				continue;
			}
			let Some(neighbour) = lattice.sample(n) else {
				continue;
			};
			if !neighbour.is_walkable() {
				continue;
			}
			let step = current_point.get_world().distance(neighbour.get_world())
				+ neighbour.get_penalty().max(0) as f32;
			let tentative = g_scores[current.index] + step;
			if tentative < g_scores[n] {
				g_scores[n] = tentative;
				came_from[n] = Some(current.index);
				let h = neighbour.get_world().distance(goal);
				open.push(OpenNode {
					f: tentative + h,
					h,
					index: n,
				});
			}
		}
	}
	None
}

/// Walk the predecessors back from `target` and return the world positions
/// from `source` onwards
fn retrace<L: WeightedLattice + ?Sized>(
	lattice: &L,
	came_from: &[Option<usize>],
	source: usize,
	target: usize,
) -> Vec<Vec3> {
	let mut waypoints = Vec::new();
	let mut current = Some(target);
	while let Some(i) = current {
		if let Some(p) = lattice.sample(i) {
			waypoints.push(p.get_world());
		}
		if i == source {
			break;
		}
		current = came_from[i];
	}
	waypoints.reverse();
	waypoints
}

/// Drop interior waypoints that continue in the same direction as the one
/// before them, the first and last waypoints are always kept
pub fn simplify_waypoints(points: &[Vec3]) -> Vec<Vec3> {
	if points.len() <= 2 {
		return points.to_vec();
	}
	let mut simplified = vec![points[0]];
	for i in 1..points.len() - 1 {
		let incoming = (points[i] - points[i - 1]).normalize_or_zero();
		let outgoing = (points[i + 1] - points[i]).normalize_or_zero();
		if incoming.distance_squared(outgoing) > 1e-6 {
			simplified.push(points[i]);
		}
	}
	simplified.push(points[points.len() - 1]);
	simplified
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// Flat `size` by `size` grid with one sample per unit and the given
	/// obstacles
	fn grid(size: f32, obstacles: &[WorldBox]) -> GridMap {
		let settings = GridSettings {
			center: Vec3::new(size / 2.0 - 0.5, 0.0, size / 2.0 - 0.5),
			region: Vec2::new(size, size),
			..default()
		};
		let mut world = BoxWorld::new(WorldBox::new(
			Vec3::new(-0.5, -1.0, -0.5),
			Vec3::new(size - 0.5, 0.0, size - 0.5),
		));
		for o in obstacles {
			world = world.with_obstacle(*o);
		}
		GridMap::build(&settings, &world, &TerrainTable::default())
	}
	/// Obstacle covering the cells from `min` to `max` inclusive
	fn cells(min: (f32, f32), max: (f32, f32)) -> WorldBox {
		WorldBox::new(
			Vec3::new(min.0 - 0.5, 0.0, min.1 - 0.5),
			Vec3::new(max.0 + 0.5, 2.0, max.1 + 0.5),
		)
	}
	#[test]
	fn straight_line_collapses() {
		let g = grid(10.0, &[]);
		let path = find_weighted_path(&g, Vec3::ZERO, Vec3::new(9.0, 0.0, 0.0)).unwrap();
		assert_eq!(vec![Vec3::ZERO, Vec3::new(9.0, 0.0, 0.0)], path);
	}
	#[test]
	fn diagonal_is_direct() {
		let g = grid(10.0, &[]);
		let path = find_weighted_path(&g, Vec3::ZERO, Vec3::new(9.0, 0.0, 9.0)).unwrap();
		assert_eq!(vec![Vec3::ZERO, Vec3::new(9.0, 0.0, 9.0)], path);
	}
	#[test]
	fn routes_around_wall() {
		// wall along x = 5 from z = 0 to z = 8
		let g = grid(10.0, &[cells((5.0, 0.0), (5.0, 8.0))]);
		let path = find_weighted_path(&g, Vec3::new(2.0, 0.0, 2.0), Vec3::new(8.0, 0.0, 2.0))
			.unwrap();
		assert!(path.iter().any(|p| p.z >= 9.0));
		assert_eq!(Vec3::new(2.0, 0.0, 2.0), path[0]);
		assert_eq!(Vec3::new(8.0, 0.0, 2.0), *path.last().unwrap());
	}
	#[test]
	fn penalties_are_avoided() {
		let settings = GridSettings {
			center: Vec3::new(4.5, 0.0, 4.5),
			region: Vec2::new(10.0, 10.0),
			..default()
		};
		// a band of sand across the direct route with a gap at z = 9
		let world = BoxWorld::new(WorldBox::new(
			Vec3::new(-0.5, -1.0, -0.5),
			Vec3::new(9.5, 0.0, 9.5),
		))
		.with_surface(
			WorldBox::new(Vec3::new(3.5, -1.0, -0.5), Vec3::new(5.5, 0.0, 8.5)).with_layers(1 << 7),
		);
		let g = GridMap::build(&settings, &world, &TerrainTable::default());
		let path = find_weighted_path(&g, Vec3::new(0.0, 0.0, 4.0), Vec3::new(9.0, 0.0, 4.0))
			.unwrap();
		assert!(path.iter().any(|p| p.z >= 9.0));
	}
	#[test]
	fn blocked_start_fails() {
		let g = grid(10.0, &[cells((0.0, 0.0), (0.0, 0.0))]);
		assert!(find_weighted_path(&g, Vec3::ZERO, Vec3::new(9.0, 0.0, 9.0)).is_none());
	}
	#[test]
	fn enclosed_target_fails() {
		let g = grid(
			10.0,
			&[
				cells((4.0, 4.0), (6.0, 4.0)),
				cells((4.0, 6.0), (6.0, 6.0)),
				cells((4.0, 5.0), (4.0, 5.0)),
				cells((6.0, 5.0), (6.0, 5.0)),
			],
		);
		let target = g.get_point(UVec2::new(5, 5)).unwrap();
		assert!(target.is_walkable());
		assert!(find_weighted_path(&g, Vec3::ZERO, Vec3::new(5.0, 0.0, 5.0)).is_none());
	}
	#[test]
	fn simplify_keeps_corners() {
		let points = vec![
			Vec3::ZERO,
			Vec3::X,
			Vec3::new(2.0, 0.0, 0.0),
			Vec3::new(2.0, 0.0, 1.0),
			Vec3::new(2.0, 0.0, 2.0),
		];
		assert_eq!(
			vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 2.0)],
			simplify_waypoints(&points)
		);
	}
	#[test]
	fn open_nodes_pop_cheapest_first() {
		let mut heap = BinaryHeap::new();
		heap.push(OpenNode { f: 5.0, h: 1.0, index: 0 });
		heap.push(OpenNode { f: 3.0, h: 2.0, index: 1 });
		heap.push(OpenNode { f: 3.0, h: 1.0, index: 2 });
		assert_eq!(2, heap.pop().unwrap().index);
		assert_eq!(1, heap.pop().unwrap().index);
		assert_eq!(0, heap.pop().unwrap().index);
	}
}
