//! Finding routes through a [SpatialMap] and describing them as a [Path]
//!

pub mod astar;
pub mod line;
pub mod search;
pub mod smoothing;

use crate::prelude::*;
use bevy::prelude::*;

/// An ordered route of world positions, optionally with turn boundaries for
/// smooth following
#[derive(Clone, Debug, PartialEq)]
pub enum Path {
	/// Waypoints only
	Basic(Vec<Vec3>),
	/// Waypoints with turn boundaries and a slow down zone
	Smooth(SmoothPath),
}

impl Path {
	/// Get the waypoints
	pub fn get_waypoints(&self) -> &[Vec3] {
		match self {
			Path::Basic(w) => w,
			Path::Smooth(s) => s.get_waypoints(),
		}
	}
	/// Number of waypoints
	pub fn len(&self) -> usize {
		self.get_waypoints().len()
	}
	/// Whether there are no waypoints
	pub fn is_empty(&self) -> bool {
		self.get_waypoints().is_empty()
	}
	/// Whether the path carries turn boundaries
	pub fn is_smooth(&self) -> bool {
		matches!(self, Path::Smooth(_))
	}
	/// Get the smoothed form if there is one
	pub fn as_smooth(&self) -> Option<&SmoothPath> {
		match self {
			Path::Smooth(s) => Some(s),
			Path::Basic(_) => None,
		}
	}
}

/// What a caller wants a path for
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathQuery {
	/// Where the path begins
	start: Vec3,
	/// Where the path ends
	end: Vec3,
	/// Whether turn boundaries are wanted
	smooth: bool,
	/// How early before a waypoint a turn begins
	turn_distance: f32,
	/// Distance over which to slow down before the end
	stop_distance: f32,
}

impl PathQuery {
	/// Create a new instance of [PathQuery] for an unsmoothed path
	pub fn new(start: Vec3, end: Vec3) -> Self {
		PathQuery {
			start,
			end,
			smooth: false,
			turn_distance: 0.0,
			stop_distance: 0.0,
		}
	}
	/// Ask for a smoothed path
	pub fn smoothed(self, turn_distance: f32, stop_distance: f32) -> Self {
		PathQuery {
			smooth: true,
			turn_distance,
			stop_distance,
			..self
		}
	}
	/// Get the start
	pub fn get_start(&self) -> Vec3 {
		self.start
	}
	/// Get the end
	pub fn get_end(&self) -> Vec3 {
		self.end
	}
	/// Get whether smoothing is wanted
	pub fn is_smooth(&self) -> bool {
		self.smooth
	}
	/// Get the turn distance
	pub fn get_turn_distance(&self) -> f32 {
		self.turn_distance
	}
	/// Get the stop distance
	pub fn get_stop_distance(&self) -> f32 {
		self.stop_distance
	}
}

/// Anything able to answer a [PathQuery]. Implementors are shared between
/// worker threads and must not change while answering
pub trait PathFinder: Send + Sync + 'static {
	/// Find a path, `None` when the end cannot be reached
	fn find_path(&self, query: &PathQuery) -> Option<Path>;
}
