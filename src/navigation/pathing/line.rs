//! A turn boundary on the plane. The line is perpendicular to the direction an
//! agent approaches it from and remembers which side that approach is on, so
//! the agent can tell when it has passed through
//!

use bevy::prelude::*;

/// Stand in gradient for a line that would otherwise be vertical
pub const VERTICAL_LINE_GRADIENT: f32 = 1e5;

/// Infinite line on the (x, z) plane
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Line {
	/// Gradient of the line
	gradient: f32,
	/// Where the line meets the y axis
	y_intercept: f32,
	/// A point on the line
	point_on_line_1: Vec2,
	/// A second point on the line
	point_on_line_2: Vec2,
	/// Gradient of the approach direction
	gradient_perpendicular: f32,
	/// Side of the line the approach comes from
	approach_side: bool,
}

impl Line {
	/// Create a new instance of [Line] through `point_on_line` perpendicular to
	/// the direction from `point_perpendicular_to_line`
	pub fn new(point_on_line: Vec2, point_perpendicular_to_line: Vec2) -> Self {
		let dx = point_on_line.x - point_perpendicular_to_line.x;
		let dy = point_on_line.y - point_perpendicular_to_line.y;
		let gradient_perpendicular = if dx == 0.0 {
			VERTICAL_LINE_GRADIENT
		} else {
			dy / dx
		};
		let gradient = if gradient_perpendicular == 0.0 {
			VERTICAL_LINE_GRADIENT
		} else {
			-1.0 / gradient_perpendicular
		};
		let y_intercept = point_on_line.y - gradient * point_on_line.x;
		let point_on_line_2 = point_on_line + Vec2::new(1.0, gradient);
		let mut line = Line {
			gradient,
			y_intercept,
			point_on_line_1: point_on_line,
			point_on_line_2,
			gradient_perpendicular,
			approach_side: false,
		};
		line.approach_side = line.get_side(point_perpendicular_to_line);
		line
	}
	/// Get the gradient
	pub fn get_gradient(&self) -> f32 {
		self.gradient
	}
	/// Get the y intercept
	pub fn get_y_intercept(&self) -> f32 {
		self.y_intercept
	}
	/// Get the point the line was built through
	pub fn get_point(&self) -> Vec2 {
		self.point_on_line_1
	}
	/// Which side of the line a point is on
	pub fn get_side(&self, point: Vec2) -> bool {
		(point.x - self.point_on_line_1.x) * (self.point_on_line_2.y - self.point_on_line_1.y)
			> (point.y - self.point_on_line_1.y) * (self.point_on_line_2.x - self.point_on_line_1.x)
	}
	/// Whether a point lies on the far side from the approach
	pub fn has_crossed_line(&self, point: Vec2) -> bool {
		self.get_side(point) != self.approach_side
	}
	/// Shortest distance from a point to the line
	pub fn distance_from_point(&self, point: Vec2) -> f32 {
		let y_intercept_perpendicular = point.y - self.gradient_perpendicular * point.x;
		let x_intersect = (y_intercept_perpendicular - self.y_intercept)
			/ (self.gradient - self.gradient_perpendicular);
		let y_intersect = self.gradient * x_intersect + self.y_intercept;
		point.distance(Vec2::new(x_intersect, y_intersect))
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn crossing_along_x() {
		// approaching x = 5 from the left
		let line = Line::new(Vec2::new(5.0, 0.0), Vec2::new(0.0, 0.0));
		assert!(!line.has_crossed_line(Vec2::new(4.0, 3.0)));
		assert!(line.has_crossed_line(Vec2::new(6.0, -2.0)));
	}
	#[test]
	fn crossing_along_y() {
		// approaching y = 5 from above, dx of zero
		let line = Line::new(Vec2::new(0.0, 5.0), Vec2::new(0.0, 10.0));
		assert!(!line.has_crossed_line(Vec2::new(3.0, 7.0)));
		assert!(line.has_crossed_line(Vec2::new(-3.0, 4.0)));
	}
	#[test]
	fn crossing_diagonal() {
		let line = Line::new(Vec2::new(2.0, 2.0), Vec2::new(0.0, 0.0));
		assert!(!line.has_crossed_line(Vec2::new(1.0, 1.0)));
		assert!(!line.has_crossed_line(Vec2::new(3.0, 0.5)));
		assert!(line.has_crossed_line(Vec2::new(3.0, 3.0)));
	}
	#[test]
	fn distance_to_line() {
		let line = Line::new(Vec2::new(5.0, 0.0), Vec2::new(0.0, 0.0));
		assert!((line.distance_from_point(Vec2::new(2.0, 7.0)) - 3.0).abs() < 1e-3);
		let diagonal = Line::new(Vec2::new(2.0, 2.0), Vec2::new(0.0, 0.0));
		let expected = 2.0 * std::f32::consts::SQRT_2;
		assert!((diagonal.distance_from_point(Vec2::ZERO) - expected).abs() < 1e-3);
	}
}
