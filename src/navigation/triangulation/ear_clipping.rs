//! Ear clipping triangulation of simple polygons and the bridging of holes
//! into a boundary so that they can be triangulated as one ring.
//!
//! Vertices live in an arena (`Vec<Vertex>`) and the shrinking polygon is
//! tracked through `prev`/`next` index tables, removing an ear only relinks
//! its two neighbours
//!

use std::collections::VecDeque;

use crate::prelude::*;
use bevy::prelude::*;

/// Working state of a single triangulation
struct EarClipper {
	/// Every vertex of the ring, never reordered
	vertices: Vec<Vertex>,
	/// Index of the previous live vertex
	prev: Vec<usize>,
	/// Index of the next live vertex
	next: Vec<usize>,
	/// Whether a vertex is still part of the polygon
	alive: Vec<bool>,
	/// Whether a vertex has an interior angle greater than 180 degrees
	reflex: Vec<bool>,
	/// Vertices that can currently be clipped, the front is clipped first
	ears: VecDeque<usize>,
	/// Number of live vertices
	remaining: usize,
}

impl EarClipper {
	/// Create a new instance of [EarClipper] from a counter-clockwise ring
	fn new(ring: &[Vec2]) -> Self {
		let n = ring.len();
		let vertices: Vec<Vertex> = ring
			.iter()
			.enumerate()
			.map(|(i, p)| Vertex::new(*p, i))
			.collect();
		let mut clipper = EarClipper {
			vertices,
			prev: (0..n).map(|i| (i + n - 1) % n).collect(),
			next: (0..n).map(|i| (i + 1) % n).collect(),
			alive: vec![true; n],
			reflex: vec![false; n],
			ears: VecDeque::new(),
			remaining: n,
		};
		for i in 0..n {
			clipper.reflex[i] = !clipper.is_convex(i);
		}
		for i in 0..n {
			if clipper.is_ear(i) {
				clipper.ears.push_back(i);
			}
		}
		clipper
	}
	/// Position of a vertex
	fn position(&self, i: usize) -> Vec2 {
		self.vertices[i].get_position()
	}
	/// A vertex is convex when the turn from the incoming edge to the
	/// outgoing edge is to the left, collinear counts as convex
	fn is_convex(&self, i: usize) -> bool {
		let p = self.position(self.prev[i]);
		let c = self.position(i);
		let n = self.position(self.next[i]);
		(c - p).perp_dot(n - c) >= 0.0
	}
	/// A convex vertex is an ear when no other reflex vertex lies within the
	/// triangle it forms with its neighbours
	fn is_ear(&self, i: usize) -> bool {
		if self.reflex[i] {
			return false;
		}
		let p = self.prev[i];
		let n = self.next[i];
		let triangle = Triangle::new(self.vertices[p], self.vertices[i], self.vertices[n]);
		let corners = triangle.positions();
		for j in 0..self.vertices.len() {
			if !self.alive[j] || !self.reflex[j] || j == p || j == i || j == n {
				continue;
			}
			let candidate = self.position(j);
			// bridged holes duplicate vertices, coincident corners never block
			if corners.contains(&candidate) {
				continue;
			}
			if triangle.contains_point(candidate) {
				return false;
			}
		}
		true
	}
	/// Recalculate the reflex and ear state of a vertex whose neighbour has
	/// been clipped
	fn revalidate(&mut self, i: usize) {
		if self.reflex[i] && self.is_convex(i) {
			self.reflex[i] = false;
		}
		let is_ear = self.is_ear(i);
		let listed = self.ears.contains(&i);
		if is_ear && !listed {
			self.ears.push_front(i);
		} else if !is_ear && listed {
			self.ears.retain(|e| *e != i);
		}
	}
	/// Clip ears until a single triangle remains. Triangles are emitted
	/// counter-clockwise
	fn clip(mut self) -> Vec<Triangle> {
		let mut triangles = Vec::with_capacity(self.vertices.len().saturating_sub(2));
		while self.remaining > 3 {
			let Some(ear) = self.ears.pop_front() else {
				warn!(
					"Triangulation ran out of ears with {} vertices left, the ring is not simple",
					self.remaining
				);
				return triangles;
			};
			let p = self.prev[ear];
			let n = self.next[ear];
			triangles.push(Triangle::new(
				self.vertices[ear],
				self.vertices[n],
				self.vertices[p],
			));
			self.alive[ear] = false;
			self.next[p] = n;
			self.prev[n] = p;
			self.remaining -= 1;
			self.revalidate(p);
			self.revalidate(n);
		}
		if self.remaining == 3 {
			if let Some(a) = self.alive.iter().position(|alive| *alive) {
				let b = self.next[a];
				let c = self.next[b];
				triangles.push(Triangle::new(
					self.vertices[a],
					self.vertices[b],
					self.vertices[c],
				));
			}
		}
		triangles
	}
}

/// Triangulate a simple polygon by ear clipping.
///
/// The boundary may be listed in either direction, every emitted [Triangle]
/// has the `desired` winding. A boundary of fewer than three points produces
/// no triangles and a polygon with `N` vertices produces `N - 2` triangles
pub fn triangulate(boundary: &[Vec2], desired: Winding) -> Vec<Triangle> {
	if boundary.len() < 3 {
		return Vec::new();
	}
	let ring = with_winding(boundary, Winding::CounterClockwise);
	let triangles = EarClipper::new(&ring).clip();
	match desired {
		Winding::CounterClockwise => triangles,
		Winding::Clockwise => triangles.into_iter().map(Triangle::flipped).collect(),
	}
}

/// Splice a `hole` into a `shape` producing a single ring that
/// [triangulate] can consume.
///
/// The rightmost hole vertex is bridged to a visible vertex of the shape
/// found by casting a ray towards `+x`. The hole ring is inserted after the
/// bridge vertex followed by a duplicate of the bridge vertex. If the ray
/// meets no edge of the shape the hole is ignored and the shape is returned
/// unchanged
pub fn cut_hole_in_shape(shape: &[Vec2], hole: &[Vec2]) -> Vec<Vec2> {
	if shape.len() < 3 || hole.len() < 3 {
		return shape.to_vec();
	}
	let ring = with_winding(shape, Winding::CounterClockwise);
	let hole_ring = with_winding(hole, Winding::Clockwise);
	let offset = ring.len();
	let hole_vertices: Vec<Vertex> = hole_ring
		.iter()
		.enumerate()
		.map(|(i, p)| Vertex::new(*p, i + offset))
		.collect();
	let mut m_index = 0;
	for (i, v) in hole_vertices.iter().enumerate() {
		if v.get_position().x > hole_vertices[m_index].get_position().x {
			m_index = i;
		}
	}
	let m = hole_vertices[m_index].get_position();

	// closest edge of the shape to the right of the hole
	let mut closest: Option<(f32, usize)> = None;
	for i in 0..ring.len() {
		let j = (i + 1) % ring.len();
		let edge = Edge::new(Vertex::new(ring[i], i), Vertex::new(ring[j], j));
		if ring[i].x.max(ring[j].x) <= m.x || !edge.straddles(m.y) {
			continue;
		}
		if let Some(distance) = edge.ray_distance(m, Vec2::X) {
			if closest.is_none_or(|(d, _)| distance < d) {
				closest = Some((distance, i));
			}
		}
	}
	let Some((distance, edge_index)) = closest else {
		warn!("Hole could not be bridged to the shape, no edge lies to the right of it");
		return shape.to_vec();
	};
	let intersection = m + Vec2::X * distance;
	let edge_end = (edge_index + 1) % ring.len();
	let mut p_index = if ring[edge_index].x > ring[edge_end].x {
		edge_index
	} else {
		edge_end
	};

	// a reflex vertex inside the bridge triangle would be cut by the bridge,
	// use the one closest in angle to the ray instead
	let bridge = Triangle::new(
		Vertex::new(m, usize::MAX),
		Vertex::new(intersection, usize::MAX),
		Vertex::new(ring[p_index], p_index),
	);
	let mut best_dot = f32::MIN;
	let mut replacement = None;
	for i in 0..ring.len() {
		if i == p_index {
			continue;
		}
		let prev = ring[wrap_index(i as isize - 1, ring.len())];
		let next = ring[(i + 1) % ring.len()];
		let is_reflex = (ring[i] - prev).perp_dot(next - ring[i]) < 0.0;
		if is_reflex && bridge.contains_point(ring[i]) {
			let dot = Vec2::X.dot((ring[i] - m).normalize_or_zero());
			if dot > best_dot {
				best_dot = dot;
				replacement = Some(i);
			}
		}
	}
	if let Some(i) = replacement {
		p_index = i;
	}

	let mut out = Vec::with_capacity(ring.len() + hole_ring.len() + 2);
	out.extend_from_slice(&ring[..=p_index]);
	for k in 0..=hole_vertices.len() {
		out.push(hole_vertices[(m_index + k) % hole_vertices.len()].get_position());
	}
	out.push(ring[p_index]);
	out.extend_from_slice(&ring[p_index + 1..]);
	out
}

/// Cut every hole into the shape, rightmost hole first so that bridges of
/// earlier holes never obstruct later ones
pub fn cut_holes_in_shape(shape: &[Vec2], holes: &[Vec<Vec2>]) -> Vec<Vec2> {
	let mut ordered: Vec<&Vec<Vec2>> = holes.iter().filter(|h| h.len() >= 3).collect();
	let max_x = |h: &Vec<Vec2>| h.iter().map(|p| p.x).fold(f32::MIN, f32::max);
	ordered.sort_by(|a, b| max_x(b).total_cmp(&max_x(a)));
	let mut ring = shape.to_vec();
	for hole in ordered {
		ring = cut_hole_in_shape(&ring, hole);
	}
	ring
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// A 10x10 square
	fn square() -> Vec<Vec2> {
		vec![
			Vec2::new(0.0, 0.0),
			Vec2::new(10.0, 0.0),
			Vec2::new(10.0, 10.0),
			Vec2::new(0.0, 10.0),
		]
	}
	/// A 2x2 hole in the middle of [square]
	fn hole() -> Vec<Vec2> {
		vec![
			Vec2::new(4.0, 4.0),
			Vec2::new(6.0, 4.0),
			Vec2::new(6.0, 6.0),
			Vec2::new(4.0, 6.0),
		]
	}
	/// Sum of the unsigned triangle areas
	fn total_area(triangles: &[Triangle]) -> f32 {
		triangles.iter().map(|t| t.area()).sum()
	}
	#[test]
	fn too_few_points() {
		assert!(triangulate(&[Vec2::ZERO, Vec2::X], Winding::Clockwise).is_empty());
	}
	#[test]
	fn single_triangle() {
		let tris = triangulate(
			&[Vec2::ZERO, Vec2::X, Vec2::Y],
			Winding::CounterClockwise,
		);
		assert_eq!(1, tris.len());
		assert_eq!(0.5, tris[0].area());
	}
	#[test]
	fn square_both_windings() {
		for desired in [Winding::Clockwise, Winding::CounterClockwise] {
			let tris = triangulate(&square(), desired);
			assert_eq!(2, tris.len());
			assert!((total_area(&tris) - 100.0).abs() < 1e-4);
			assert!(tris.iter().all(|t| t.winding() == desired));
		}
	}
	#[test]
	fn clockwise_input() {
		let mut s = square();
		s.reverse();
		let tris = triangulate(&s, Winding::CounterClockwise);
		assert_eq!(2, tris.len());
		assert!((total_area(&tris) - 100.0).abs() < 1e-4);
	}
	#[test]
	fn concave_l_shape() {
		let l = vec![
			Vec2::new(0.0, 0.0),
			Vec2::new(4.0, 0.0),
			Vec2::new(4.0, 2.0),
			Vec2::new(2.0, 2.0),
			Vec2::new(2.0, 4.0),
			Vec2::new(0.0, 4.0),
		];
		let tris = triangulate(&l, Winding::CounterClockwise);
		assert_eq!(4, tris.len());
		assert!((total_area(&tris) - 12.0).abs() < 1e-4);
		// the notch must stay empty
		assert!(tris.iter().all(|t| !t.contains_point(Vec2::new(3.0, 3.0))));
	}
	#[test]
	fn collinear_points_tolerated() {
		let ring = vec![
			Vec2::new(0.0, 0.0),
			Vec2::new(5.0, 0.0),
			Vec2::new(10.0, 0.0),
			Vec2::new(10.0, 10.0),
			Vec2::new(0.0, 10.0),
		];
		let tris = triangulate(&ring, Winding::CounterClockwise);
		assert_eq!(3, tris.len());
		assert!((total_area(&tris) - 100.0).abs() < 1e-4);
	}
	#[test]
	fn hole_is_spliced_after_bridge() {
		let ring = cut_hole_in_shape(&square(), &hole());
		// 4 shape + 4 hole + repeated hole start + repeated bridge
		assert_eq!(10, ring.len());
		assert_eq!(Vec2::new(10.0, 10.0), ring[2]);
		assert_eq!(Vec2::new(6.0, 6.0), ring[3]);
		assert_eq!(Vec2::new(6.0, 6.0), ring[7]);
		assert_eq!(Vec2::new(10.0, 10.0), ring[8]);
	}
	#[test]
	fn hole_triangulation() {
		let ring = cut_hole_in_shape(&square(), &hole());
		let tris = triangulate(&ring, Winding::CounterClockwise);
		assert_eq!(8, tris.len());
		assert!((total_area(&tris) - 96.0).abs() < 1e-3);
		for t in tris.iter() {
			let c = t.centroid();
			let inside_hole = c.x > 4.0 && c.x < 6.0 && c.y > 4.0 && c.y < 6.0;
			assert!(!inside_hole);
		}
	}
	#[test]
	fn unbridgeable_hole_ignored() {
		let outside = vec![
			Vec2::new(20.0, 4.0),
			Vec2::new(22.0, 4.0),
			Vec2::new(22.0, 6.0),
		];
		assert_eq!(square(), cut_hole_in_shape(&square(), &outside));
	}
	#[test]
	fn two_holes() {
		let left = vec![
			Vec2::new(1.0, 1.0),
			Vec2::new(3.0, 1.0),
			Vec2::new(3.0, 3.0),
			Vec2::new(1.0, 3.0),
		];
		let ring = cut_holes_in_shape(&square(), &[left, hole()]);
		assert_eq!(16, ring.len());
		let tris = triangulate(&ring, Winding::CounterClockwise);
		assert_eq!(14, tris.len());
		assert!((total_area(&tris) - 92.0).abs() < 1e-3);
	}
}
