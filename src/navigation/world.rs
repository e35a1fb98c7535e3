//! The view of world geometry consumed by the map builders.
//!
//! The builders never own colliders, they ask a [NavigationWorld] to probe
//! downwards, test volumes for obstacles and describe footprints. [BoxWorld]
//! is a small implementation made of axis aligned boxes, handy for tests,
//! benchmarks and levels blocked out with boxes
//!

use crate::prelude::*;
use bevy::prelude::*;

/// The surface met by a downward probe
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
	/// Where the probe met the surface
	pub position: Vec3,
	/// Collision layers of the surface
	pub layers: u32,
}

/// Outline of a walkable surface or obstacle projected onto the navigation
/// plane
#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
	/// Ordered outline on the navigation plane
	outline: Vec<Vec2>,
	/// Height of the top of the shape
	height: f32,
}

impl Footprint {
	/// Create a new instance of [Footprint]
	pub fn new(outline: Vec<Vec2>, height: f32) -> Self {
		Footprint { outline, height }
	}
	/// Create a [Footprint] from the world positions of a shape's vertices,
	/// the outline is their convex hull and the height their highest point
	pub fn from_world_points(points: &[Vec3]) -> Self {
		let projected: Vec<Vec2> = points.iter().map(|p| to_plane(*p)).collect();
		let height = points.iter().map(|p| p.y).fold(f32::MIN, f32::max);
		Footprint {
			outline: convex_hull(&projected),
			height: if points.is_empty() { 0.0 } else { height },
		}
	}
	/// Get the outline
	pub fn get_outline(&self) -> &[Vec2] {
		&self.outline
	}
	/// Get the height of the top
	pub fn get_height(&self) -> f32 {
		self.height
	}
	/// Axis aligned bounds of the outline
	pub fn bounds(&self) -> Option<Bounds> {
		Bounds::from_points(&self.outline)
	}
}

/// Queries the map builders make against world geometry
pub trait NavigationWorld {
	/// Cast a ray straight down from `origin`, returning the first surface
	/// met within `max_distance`
	fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<ProbeHit>;
	/// Whether an unwalkable shape overlaps the box centred on `center`
	fn overlaps_obstacle(&self, center: Vec3, half_extents: Vec3) -> bool;
	/// Footprint of the surface a navmesh is generated on
	fn ground_footprint(&self) -> Option<Footprint> {
		None
	}
	/// Footprints of the unwalkable shapes standing on the ground
	fn obstacle_footprints(&self) -> Vec<Footprint> {
		Vec::new()
	}
}

/// An axis aligned box tagged with collision layers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBox {
	/// Smallest corner
	min: Vec3,
	/// Largest corner
	max: Vec3,
	/// Collision layers of the box
	layers: u32,
}

impl WorldBox {
	/// Create a new instance of [WorldBox] from two opposing corners
	pub fn new(a: Vec3, b: Vec3) -> Self {
		WorldBox {
			min: a.min(b),
			max: a.max(b),
			layers: 1,
		}
	}
	/// Copy of the box on other collision layers
	pub fn with_layers(self, layers: u32) -> Self {
		WorldBox { layers, ..self }
	}
	/// Get the smallest corner
	pub fn get_min(&self) -> Vec3 {
		self.min
	}
	/// Get the largest corner
	pub fn get_max(&self) -> Vec3 {
		self.max
	}
	/// Whether the vertical line through `(x, z)` passes through the box,
	/// faces included
	fn covers(&self, x: f32, z: f32) -> bool {
		x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
	}
	/// Whether the box shares volume with the box around `center`, touching
	/// faces do not count
	fn overlaps(&self, center: Vec3, half_extents: Vec3) -> bool {
		let lo = center - half_extents;
		let hi = center + half_extents;
		self.min.x < hi.x
			&& self.max.x > lo.x
			&& self.min.y < hi.y
			&& self.max.y > lo.y
			&& self.min.z < hi.z
			&& self.max.z > lo.z
	}
	/// Top face as a [Footprint]
	fn footprint(&self) -> Footprint {
		let bounds = Bounds::new(to_plane(self.min), to_plane(self.max));
		Footprint::new(bounds.corners().to_vec(), self.max.y)
	}
}

/// A world built from walkable boxes (the first being the ground) and
/// unwalkable obstacle boxes. Where tops are level a probe reports the box
/// added last, so terrain patches can be laid flush onto the ground
#[derive(Clone, Debug, Default)]
pub struct BoxWorld {
	/// Walkable surfaces
	walkable: Vec<WorldBox>,
	/// Unwalkable shapes
	obstacles: Vec<WorldBox>,
}

impl BoxWorld {
	/// Create a new instance of [BoxWorld] with a single ground box
	pub fn new(ground: WorldBox) -> Self {
		BoxWorld {
			walkable: vec![ground],
			obstacles: Vec::new(),
		}
	}
	/// Add a walkable box, such as a patch of terrain on a layer of its own
	pub fn with_surface(mut self, surface: WorldBox) -> Self {
		self.walkable.push(surface);
		self
	}
	/// Add an obstacle
	pub fn with_obstacle(mut self, obstacle: WorldBox) -> Self {
		self.obstacles.push(obstacle);
		self
	}
	/// Get the walkable boxes
	pub fn get_walkable(&self) -> &[WorldBox] {
		&self.walkable
	}
	/// Get the obstacles
	pub fn get_obstacles(&self) -> &[WorldBox] {
		&self.obstacles
	}
}

impl NavigationWorld for BoxWorld {
	fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<ProbeHit> {
		let lowest = origin.y - max_distance;
		let mut best: Option<ProbeHit> = None;
		for b in self.walkable.iter().chain(self.obstacles.iter()) {
			let top = b.max.y;
			if !b.covers(origin.x, origin.z) || top > origin.y || top < lowest {
				continue;
			}
			if best.is_none_or(|hit| top >= hit.position.y) {
				best = Some(ProbeHit {
					position: Vec3::new(origin.x, top, origin.z),
					layers: b.layers,
				});
			}
		}
		best
	}
	fn overlaps_obstacle(&self, center: Vec3, half_extents: Vec3) -> bool {
		self.obstacles
			.iter()
			.any(|o| o.overlaps(center, half_extents))
	}
	fn ground_footprint(&self) -> Option<Footprint> {
		self.walkable.first().map(|g| g.footprint())
	}
	fn obstacle_footprints(&self) -> Vec<Footprint> {
		self.obstacles.iter().map(|o| o.footprint()).collect()
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// 10x10 floor with a block in the middle
	fn world() -> BoxWorld {
		BoxWorld::new(WorldBox::new(
			Vec3::new(0.0, -1.0, 0.0),
			Vec3::new(10.0, 0.0, 10.0),
		))
		.with_obstacle(WorldBox::new(
			Vec3::new(4.0, 0.0, 4.0),
			Vec3::new(6.0, 2.0, 6.0),
		))
	}
	#[test]
	fn probe_hits_highest_surface() {
		let w = world();
		let hit = w.cast_down(Vec3::new(5.0, 4.5, 5.0), 100.0).unwrap();
		assert_eq!(2.0, hit.position.y);
		let hit = w.cast_down(Vec3::new(1.0, 4.5, 1.0), 100.0).unwrap();
		assert_eq!(0.0, hit.position.y);
	}
	#[test]
	fn probe_misses_outside() {
		let w = world();
		assert!(w.cast_down(Vec3::new(20.0, 4.5, 1.0), 100.0).is_none());
	}
	#[test]
	fn touching_is_not_overlapping() {
		let w = world();
		assert!(!w.overlaps_obstacle(Vec3::new(3.5, 0.0, 5.0), Vec3::new(0.5, 2.0, 0.5)));
		assert!(w.overlaps_obstacle(Vec3::new(4.5, 0.0, 5.0), Vec3::new(0.5, 2.0, 0.5)));
	}
	#[test]
	fn footprints() {
		let w = world();
		let ground = w.ground_footprint().unwrap();
		assert_eq!(0.0, ground.get_height());
		assert_eq!(4, ground.get_outline().len());
		assert_eq!(1, w.obstacle_footprints().len());
	}
	#[test]
	fn footprint_from_points_is_hull() {
		let f = Footprint::from_world_points(&[
			Vec3::new(0.0, 1.0, 0.0),
			Vec3::new(2.0, 1.0, 0.0),
			Vec3::new(2.0, 3.0, 2.0),
			Vec3::new(0.0, 1.0, 2.0),
			Vec3::new(1.0, 1.0, 1.0),
		]);
		assert_eq!(4, f.get_outline().len());
		assert_eq!(3.0, f.get_height());
	}
}
