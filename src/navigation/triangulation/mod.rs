//! Primitives produced and consumed by polygon triangulation.
//!
//! A [Vertex] carries both its position on the navigation plane and the world
//! position it originated from, a [Triangle] is three of them with the order
//! defining its winding and an [Edge] is a pair used when bridging holes
//!

pub mod ear_clipping;

use crate::prelude::*;
use bevy::prelude::*;

/// A point of a polygon being triangulated
#[derive(Clone, Copy, Debug)]
pub struct Vertex {
	/// Position on the navigation plane
	position: Vec2,
	/// Position in the world
	world: Vec3,
	/// Index of the vertex within the ring it was created from
	index: usize,
}

impl PartialEq for Vertex {
	fn eq(&self, other: &Self) -> bool {
		self.position == other.position && self.index == other.index
	}
}

impl Vertex {
	/// Create a new instance of [Vertex] lying at world height zero
	pub fn new(position: Vec2, index: usize) -> Self {
		Vertex {
			position,
			world: to_world(position, 0.0),
			index,
		}
	}
	/// Create a new instance of [Vertex] from a world position
	pub fn from_world(world: Vec3, index: usize) -> Self {
		Vertex {
			position: to_plane(world),
			world,
			index,
		}
	}
	/// Copy of the vertex with the world position moved to `height`
	pub fn with_height(self, height: f32) -> Self {
		Vertex {
			world: to_world(self.position, height),
			..self
		}
	}
	/// Get the position on the navigation plane
	pub fn get_position(&self) -> Vec2 {
		self.position
	}
	/// Get the world position
	pub fn get_world(&self) -> Vec3 {
		self.world
	}
	/// Get the index within the originating ring
	pub fn get_index(&self) -> usize {
		self.index
	}
}

/// Three [Vertex] where the order `a`, `b`, `c` determines the winding
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
	/// First corner
	a: Vertex,
	/// Second corner
	b: Vertex,
	/// Third corner
	c: Vertex,
}

impl Triangle {
	/// Create a new instance of [Triangle]
	pub fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
		Triangle { a, b, c }
	}
	/// Get the first corner
	pub fn get_a(&self) -> &Vertex {
		&self.a
	}
	/// Get the second corner
	pub fn get_b(&self) -> &Vertex {
		&self.b
	}
	/// Get the third corner
	pub fn get_c(&self) -> &Vertex {
		&self.c
	}
	/// Corner positions on the navigation plane in order
	pub fn positions(&self) -> [Vec2; 3] {
		[self.a.position, self.b.position, self.c.position]
	}
	/// Corner world positions in order
	pub fn world_positions(&self) -> [Vec3; 3] {
		[self.a.world, self.b.world, self.c.world]
	}
	/// Copy of the triangle with every corner moved to world `height`
	pub fn with_height(self, height: f32) -> Self {
		Triangle {
			a: self.a.with_height(height),
			b: self.b.with_height(height),
			c: self.c.with_height(height),
		}
	}
	/// Swap the first and last corners, flipping the winding
	pub fn flipped(self) -> Self {
		Triangle {
			a: self.c,
			b: self.b,
			c: self.a,
		}
	}
	/// Winding of the corners
	pub fn winding(&self) -> Winding {
		winding_order(&self.positions())
	}
	/// Unsigned area on the navigation plane
	pub fn area(&self) -> f32 {
		signed_area(&self.positions()).abs()
	}
	/// Centroid on the navigation plane
	pub fn centroid(&self) -> Vec2 {
		(self.a.position + self.b.position + self.c.position) / 3.0
	}
	/// Centroid in the world
	pub fn world_centroid(&self) -> Vec3 {
		(self.a.world + self.b.world + self.c.world) / 3.0
	}
	/// Midpoints of the edges `ab`, `bc` and `ca` in the world
	pub fn world_midpoints(&self) -> [Vec3; 3] {
		[
			(self.a.world + self.b.world) * 0.5,
			(self.b.world + self.c.world) * 0.5,
			(self.c.world + self.a.world) * 0.5,
		]
	}
	/// Even-odd test of whether a point lies inside the triangle
	pub fn contains_point(&self, point: Vec2) -> bool {
		point_in_polygon(&self.positions(), point)
	}
	/// Whether a vertex is one of the corners or lies inside the triangle
	pub fn contains_vertex(&self, vertex: &Vertex) -> bool {
		if *vertex == self.a || *vertex == self.b || *vertex == self.c {
			return true;
		}
		self.contains_point(vertex.position)
	}
}

/// A segment between two [Vertex]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
	/// Start of the segment
	a: Vertex,
	/// End of the segment
	b: Vertex,
}

impl Edge {
	/// Create a new instance of [Edge]
	pub fn new(a: Vertex, b: Vertex) -> Self {
		Edge { a, b }
	}
	/// Get the start of the segment
	pub fn get_a(&self) -> &Vertex {
		&self.a
	}
	/// Get the end of the segment
	pub fn get_b(&self) -> &Vertex {
		&self.b
	}
	/// Distance travelled by a ray from `origin` along `direction` before it
	/// meets this edge
	pub fn ray_distance(&self, origin: Vec2, direction: Vec2) -> Option<f32> {
		ray_segment_distance(origin, direction, self.a.position, self.b.position)
	}
	/// Whether the edge spans the horizontal line at `z`, endpoints included
	pub fn straddles(&self, z: f32) -> bool {
		let (lo, hi) = if self.a.position.y <= self.b.position.y {
			(self.a.position.y, self.b.position.y)
		} else {
			(self.b.position.y, self.a.position.y)
		};
		lo <= z && z <= hi
	}
}
