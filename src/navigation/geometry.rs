//! Stateless helpers for working with polygons on the navigation plane.
//!
//! The world is `y` up, navigation happens on the `x`-`z` plane and a 2d
//! [Vec2] on that plane stores `(x, z)`. Polygons are plain ordered slices of
//! points, the final point implicitly connects back to the first
//!

use bevy::prelude::*;

/// Tolerance used when deciding whether two segments properly cross
pub const INTERSECTION_EPSILON: f32 = f32::EPSILON;

/// The rotational direction a polygon's points are listed in, viewed with
/// `x` to the right and `z` upwards
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum Winding {
	/// Points turn to the right
	Clockwise,
	/// Points turn to the left
	#[default]
	CounterClockwise,
}

impl Winding {
	/// The opposite direction
	pub fn reversed(self) -> Self {
		match self {
			Winding::Clockwise => Winding::CounterClockwise,
			Winding::CounterClockwise => Winding::Clockwise,
		}
	}
}

/// Project a world position onto the navigation plane
pub fn to_plane(position: Vec3) -> Vec2 {
	Vec2::new(position.x, position.z)
}

/// Lift a point of the navigation plane to a world position at `height`
pub fn to_world(point: Vec2, height: f32) -> Vec3 {
	Vec3::new(point.x, height, point.y)
}

/// Wrap a possibly negative or overflowing index into `0..len`
pub fn wrap_index(index: isize, len: usize) -> usize {
	let len = len as isize;
	(((index % len) + len) % len) as usize
}

/// Signed area of a polygon (shoelace), positive for counter-clockwise
/// polygons
pub fn signed_area(points: &[Vec2]) -> f32 {
	if points.len() < 3 {
		return 0.0;
	}
	let mut sum = 0.0;
	for (i, p) in points.iter().enumerate() {
		let n = points[(i + 1) % points.len()];
		sum += p.perp_dot(n);
	}
	sum * 0.5
}

/// Determine the [Winding] of a polygon, degenerate polygons report
/// [Winding::CounterClockwise]
pub fn winding_order(points: &[Vec2]) -> Winding {
	if signed_area(points) < 0.0 {
		Winding::Clockwise
	} else {
		Winding::CounterClockwise
	}
}

/// Return the points listed in the `desired` order. When reversal is needed
/// the first point is kept in place and the remainder reversed so that
/// indices derived from the first point remain meaningful
pub fn with_winding(points: &[Vec2], desired: Winding) -> Vec<Vec2> {
	let mut out = points.to_vec();
	if out.len() >= 3 && winding_order(points) != desired {
		out[1..].reverse();
	}
	out
}

/// Parametric intersection of segment `p1 -> p2` with segment `p3 -> p4`.
///
/// Returns `(ua, ub)`, the fractions along each segment where they cross.
/// Parallel segments never intersect. When `include_ends` is false the
/// crossing must lie strictly inside both segments
pub fn segment_intersection(
	p1: Vec2,
	p2: Vec2,
	p3: Vec2,
	p4: Vec2,
	include_ends: bool,
) -> Option<(f32, f32)> {
	let d1 = p2 - p1;
	let d2 = p4 - p3;
	let denominator = d2.y * d1.x - d2.x * d1.y;
	if denominator == 0.0 {
		return None;
	}
	let ua = (d2.x * (p1.y - p3.y) - d2.y * (p1.x - p3.x)) / denominator;
	let ub = (d1.x * (p1.y - p3.y) - d1.y * (p1.x - p3.x)) / denominator;
	let inside = |t: f32| {
		if include_ends {
			(0.0..=1.0).contains(&t)
		} else {
			t > INTERSECTION_EPSILON && t < 1.0 - INTERSECTION_EPSILON
		}
	};
	if inside(ua) && inside(ub) {
		Some((ua, ub))
	} else {
		None
	}
}

/// The point where segment `p1 -> p2` crosses segment `p3 -> p4`, if any
pub fn segment_intersection_point(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<Vec2> {
	segment_intersection(p1, p2, p3, p4, true).map(|(ua, _)| p1 + (p2 - p1) * ua)
}

/// Distance along a ray from `origin` heading in `direction` to the segment
/// `a -> b`.
///
/// The ray is represented by a segment long enough to reach past both
/// endpoints of the edge
pub fn ray_segment_distance(origin: Vec2, direction: Vec2, a: Vec2, b: Vec2) -> Option<f32> {
	let direction = direction.normalize_or_zero();
	if direction == Vec2::ZERO {
		return None;
	}
	let reach = 2.0 * (a - origin).length().max((b - origin).length());
	if reach <= 0.0 {
		return None;
	}
	let end = origin + direction * reach;
	segment_intersection(origin, end, a, b, true).map(|(ua, _)| ua * reach)
}

/// Convex hull of a set of points (monotone chain), returned counter-clockwise
/// without repeating the first point. Collinear boundary points are dropped
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
	let mut sorted = points.to_vec();
	sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
	sorted.dedup();
	if sorted.len() < 3 {
		return sorted;
	}
	let mut hull: Vec<Vec2> = Vec::with_capacity(sorted.len() * 2);
	// lower
	for p in sorted.iter() {
		while hull.len() >= 2
			&& (hull[hull.len() - 1] - hull[hull.len() - 2]).perp_dot(*p - hull[hull.len() - 2])
				<= 0.0
		{
			hull.pop();
		}
		hull.push(*p);
	}
	// upper
	let lower_len = hull.len() + 1;
	for p in sorted.iter().rev().skip(1) {
		while hull.len() >= lower_len
			&& (hull[hull.len() - 1] - hull[hull.len() - 2]).perp_dot(*p - hull[hull.len() - 2])
				<= 0.0
		{
			hull.pop();
		}
		hull.push(*p);
	}
	hull.pop();
	hull
}

/// Even-odd test of whether `point` is inside `polygon`, a ray is cast to
/// the right of the point and the crossed edges are counted
pub fn point_in_polygon(polygon: &[Vec2], point: Vec2) -> bool {
	if polygon.len() < 3 {
		return false;
	}
	let mut inside = false;
	let mut j = polygon.len() - 1;
	for i in 0..polygon.len() {
		let a = polygon[i];
		let b = polygon[j];
		if (a.y > point.y) != (b.y > point.y) {
			let x_cross = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
			if point.x < x_cross {
				inside = !inside;
			}
		}
		j = i;
	}
	inside
}

/// Remove consecutive vertices of a ring closer to their predecessor than
/// `distance`, the wrap-around pair included. A ring is never reduced below
/// three points
pub fn merge_close_vertices(ring: &[Vec2], distance: f32) -> Vec<Vec2> {
	let mut out: Vec<Vec2> = Vec::with_capacity(ring.len());
	for p in ring.iter() {
		match out.last() {
			Some(last) if last.distance(*p) < distance => {}
			_ => out.push(*p),
		}
	}
	while out.len() > 3 {
		match (out.first(), out.last()) {
			(Some(first), Some(last)) if first.distance(*last) < distance => {
				out.pop();
			}
			_ => break,
		}
	}
	if out.len() < 3 {
		return ring.to_vec();
	}
	out
}

/// An axis aligned rectangle on the navigation plane
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct Bounds {
	/// Smallest `(x, z)`
	min: Vec2,
	/// Largest `(x, z)`
	max: Vec2,
}

impl Bounds {
	/// Create a new instance of [Bounds] from two opposing corners
	pub fn new(a: Vec2, b: Vec2) -> Self {
		Bounds {
			min: a.min(b),
			max: a.max(b),
		}
	}
	/// Create the smallest [Bounds] enclosing all points
	pub fn from_points(points: &[Vec2]) -> Option<Self> {
		let first = points.first()?;
		let mut bounds = Bounds::new(*first, *first);
		for p in points.iter().skip(1) {
			bounds.min = bounds.min.min(*p);
			bounds.max = bounds.max.max(*p);
		}
		Some(bounds)
	}
	/// Get the smallest corner
	pub fn get_min(&self) -> Vec2 {
		self.min
	}
	/// Get the largest corner
	pub fn get_max(&self) -> Vec2 {
		self.max
	}
	/// Get the middle of the rectangle
	pub fn get_center(&self) -> Vec2 {
		(self.min + self.max) * 0.5
	}
	/// Get the width and depth of the rectangle
	pub fn get_size(&self) -> Vec2 {
		self.max - self.min
	}
	/// The four corners listed counter-clockwise starting from the minimum
	pub fn corners(&self) -> [Vec2; 4] {
		[
			self.min,
			Vec2::new(self.max.x, self.min.y),
			self.max,
			Vec2::new(self.min.x, self.max.y),
		]
	}
	/// A copy grown (or shrunk when negative) by `padding` on every side
	pub fn expanded(&self, padding: f32) -> Self {
		Bounds::new(self.min - Vec2::splat(padding), self.max + Vec2::splat(padding))
	}
	/// Whether the point is inside or on the edge of the rectangle
	pub fn contains_point(&self, point: Vec2) -> bool {
		point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
	}
	/// Whether `other` lies entirely within this rectangle
	pub fn contains(&self, other: &Bounds) -> bool {
		other.corners().iter().all(|c| self.contains_point(*c))
	}
	/// Whether the two rectangles overlap, touching edges count
	pub fn intersects(&self, other: &Bounds) -> bool {
		self.min.x <= other.max.x
			&& self.max.x >= other.min.x
			&& self.min.y <= other.max.y
			&& self.max.y >= other.min.y
	}
}

/// A crossing between an edge of the subject ring and an edge of the cutter
#[derive(Clone, Copy, Debug)]
struct Crossing {
	/// Where the edges cross
	point: Vec2,
	/// Edge of the subject the crossing lies on
	subject_edge: usize,
	/// Fraction along the subject edge
	subject_t: f32,
	/// Edge of the cutter the crossing lies on
	cutter_edge: usize,
	/// Fraction along the cutter edge
	cutter_t: f32,
}

/// A node of a ring augmented with crossings
#[derive(Clone, Copy, Debug)]
enum RingNode {
	/// An original vertex
	Vertex(Vec2),
	/// A crossing, by index into the crossing list
	Crossing(usize),
}

/// Subtract the `cutter` polygon from the `subject` ring where the cutter
/// straddles the subject's boundary.
///
/// Subject vertices inside the cutter are replaced by the crossing points
/// and the cutter vertices inside the subject, giving a notched ring listed
/// counter-clockwise. If the cutter does not cross the boundary the subject
/// is returned unchanged unless it is swallowed whole, then `None`. When the
/// difference would split the subject in several pieces only the piece
/// holding the first outside vertex is returned
pub fn subtract_polygon(subject: &[Vec2], cutter: &[Vec2]) -> Option<Vec<Vec2>> {
	if subject.len() < 3 || cutter.len() < 3 {
		return Some(subject.to_vec());
	}
	let subject = with_winding(subject, Winding::CounterClockwise);
	let cutter = with_winding(cutter, Winding::CounterClockwise);
	let mut crossings = Vec::new();
	for i in 0..subject.len() {
		let a = subject[i];
		let b = subject[(i + 1) % subject.len()];
		for j in 0..cutter.len() {
			let c = cutter[j];
			let d = cutter[(j + 1) % cutter.len()];
			if let Some((ua, ub)) = segment_intersection(a, b, c, d, false) {
				crossings.push(Crossing {
					point: a + (b - a) * ua,
					subject_edge: i,
					subject_t: ua,
					cutter_edge: j,
					cutter_t: ub,
				});
			}
		}
	}
	if crossings.is_empty() {
		if subject.iter().all(|p| point_in_polygon(&cutter, *p)) {
			return None;
		}
		return Some(subject);
	}
	let subject_ring = augment_ring(&subject, &crossings, |c| (c.subject_edge, c.subject_t));
	let cutter_ring = augment_ring(&cutter, &crossings, |c| (c.cutter_edge, c.cutter_t));
	let start = subject_ring.iter().position(
		|n| matches!(n, RingNode::Vertex(p) if !point_in_polygon(&cutter, *p)),
	)?;
	let position_of = |ring: &[RingNode], id: usize| {
		ring.iter()
			.position(|n| matches!(n, RingNode::Crossing(c) if *c == id))
	};
	let node_point = |n: &RingNode| match n {
		RingNode::Vertex(p) => *p,
		RingNode::Crossing(c) => crossings[*c].point,
	};
	let mut out = Vec::new();
	let mut index = start;
	let limit = (subject_ring.len() + cutter_ring.len()) * 2;
	for _ in 0..limit {
		let node = subject_ring[index];
		out.push(node_point(&node));
		if let RingNode::Crossing(id) = node {
			// entering the cutter, follow its boundary backwards until leaving
			let mut c = position_of(&cutter_ring, id)?;
			loop {
				c = wrap_index(c as isize - 1, cutter_ring.len());
				let cutter_node = cutter_ring[c];
				out.push(node_point(&cutter_node));
				if let RingNode::Crossing(exit) = cutter_node {
					index = position_of(&subject_ring, exit)?;
					break;
				}
			}
		}
		index = (index + 1) % subject_ring.len();
		if index == start {
			break;
		}
	}
	out.dedup_by(|a, b| a.distance(*b) < 1e-5);
	if out.len() < 3 {
		return None;
	}
	Some(out)
}

/// Insert the crossings into a ring in order along each edge
fn augment_ring(
	ring: &[Vec2],
	crossings: &[Crossing],
	placement: impl Fn(&Crossing) -> (usize, f32),
) -> Vec<RingNode> {
	let mut out = Vec::with_capacity(ring.len() + crossings.len());
	for (i, p) in ring.iter().enumerate() {
		out.push(RingNode::Vertex(*p));
		let mut on_edge: Vec<(usize, f32)> = crossings
			.iter()
			.enumerate()
			.filter_map(|(id, c)| {
				let (edge, t) = placement(c);
				(edge == i).then_some((id, t))
			})
			.collect();
		on_edge.sort_by(|a, b| a.1.total_cmp(&b.1));
		out.extend(on_edge.into_iter().map(|(id, _)| RingNode::Crossing(id)));
	}
	out
}
