//! Turning a raw waypoint route into one an agent can follow without stopping
//! at every corner.
//!
//! Every waypoint gets a turn boundary [Line] placed `turn_distance` before it
//! along the incoming segment, the final waypoint's boundary sits on the
//! waypoint itself. Once an agent crosses a boundary it starts steering to the
//! next waypoint. Walking back from the end, the first waypoint further than
//! `stop_distance` of travel from the finish marks where slowing down begins
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Waypoints with the boundaries used to follow them smoothly
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothPath {
	/// Positions to steer towards in order
	waypoints: Vec<Vec3>,
	/// One boundary per waypoint
	lines: Vec<Line>,
	/// Index of the last waypoint
	finish_index: usize,
	/// Past this waypoint the agent decelerates
	slow_index: usize,
}

impl SmoothPath {
	/// Create a new instance of [SmoothPath] for an agent starting at `start`.
	///
	/// Consecutive waypoints sharing a position on the plane are merged and
	/// leading waypoints on top of `start` are dropped, neither has a
	/// direction to build a boundary from
	pub fn new(waypoints: Vec<Vec3>, start: Vec3, turn_distance: f32, stop_distance: f32) -> Self {
		let mut cleaned: Vec<Vec3> = Vec::with_capacity(waypoints.len());
		for w in waypoints {
			match cleaned.last() {
				Some(last) if to_plane(*last).distance_squared(to_plane(w)) < 1e-8 => {}
				_ => cleaned.push(w),
			}
		}
		let start_plane = to_plane(start);
		while cleaned.len() > 1 && to_plane(cleaned[0]).distance_squared(start_plane) < 1e-8 {
			cleaned.remove(0);
		}
		let finish_index = cleaned.len().saturating_sub(1);

		let mut lines = Vec::with_capacity(cleaned.len());
		let mut previous = start_plane;
		for (i, w) in cleaned.iter().enumerate() {
			let current = to_plane(*w);
			let direction = (current - previous).normalize_or_zero();
			let turn_boundary = if i == finish_index {
				current
			} else {
				current - direction * turn_distance
			};
			lines.push(Line::new(turn_boundary, previous - direction * turn_distance));
			previous = turn_boundary;
		}

		let mut slow_index = 0;
		let mut distance_from_end = 0.0;
		for i in (1..cleaned.len()).rev() {
			distance_from_end += cleaned[i].distance(cleaned[i - 1]);
			if distance_from_end > stop_distance {
				slow_index = i;
				break;
			}
		}
		SmoothPath {
			waypoints: cleaned,
			lines,
			finish_index,
			slow_index,
		}
	}
	/// Get the waypoints
	pub fn get_waypoints(&self) -> &[Vec3] {
		&self.waypoints
	}
	/// Get the turn boundaries, one per waypoint
	pub fn get_lines(&self) -> &[Line] {
		&self.lines
	}
	/// Get the index of the final waypoint
	pub fn get_finish_index(&self) -> usize {
		self.finish_index
	}
	/// Get the index past which the agent slows down
	pub fn get_slow_index(&self) -> usize {
		self.slow_index
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn boundaries_before_corners() {
		let waypoints = vec![Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 10.0)];
		let path = SmoothPath::new(waypoints, Vec3::ZERO, 2.0, 3.0);
		assert_eq!(2, path.get_lines().len());
		assert_eq!(1, path.get_finish_index());
		// first boundary is 2 short of the corner
		assert_eq!(Vec2::new(8.0, 0.0), path.get_lines()[0].get_point());
		assert!(!path.get_lines()[0].has_crossed_line(Vec2::new(7.0, 0.0)));
		assert!(path.get_lines()[0].has_crossed_line(Vec2::new(8.5, 0.0)));
		// final boundary is on the last waypoint
		assert_eq!(Vec2::new(10.0, 10.0), path.get_lines()[1].get_point());
	}
	#[test]
	fn slow_index_from_end() {
		let waypoints = vec![
			Vec3::new(5.0, 0.0, 0.0),
			Vec3::new(5.0, 0.0, 5.0),
			Vec3::new(6.0, 0.0, 6.0),
		];
		// the last leg is ~1.41, the one before it 5
		let path = SmoothPath::new(waypoints.clone(), Vec3::ZERO, 1.0, 3.0);
		assert_eq!(1, path.get_slow_index());
		let short = SmoothPath::new(waypoints.clone(), Vec3::ZERO, 1.0, 1.0);
		assert_eq!(2, short.get_slow_index());
		let long = SmoothPath::new(waypoints, Vec3::ZERO, 1.0, 50.0);
		assert_eq!(0, long.get_slow_index());
	}
	#[test]
	fn leading_waypoint_on_start_dropped() {
		let waypoints = vec![Vec3::new(1.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0), Vec3::new(5.0, 0.0, 1.0)];
		let path = SmoothPath::new(waypoints, Vec3::new(1.0, 2.0, 1.0), 1.0, 1.0);
		assert_eq!(&[Vec3::new(5.0, 0.0, 1.0)], path.get_waypoints());
		assert_eq!(1, path.get_lines().len());
		assert_eq!(0, path.get_finish_index());
	}
	#[test]
	fn empty_waypoints() {
		let path = SmoothPath::new(Vec::new(), Vec3::ZERO, 1.0, 1.0);
		assert!(path.get_waypoints().is_empty());
		assert!(path.get_lines().is_empty());
		assert_eq!(0, path.get_finish_index());
		assert_eq!(0, path.get_slow_index());
	}
}
