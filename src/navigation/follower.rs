//! Driving an agent along a [Path].
//!
//! A [PathFollower] turns its current path and the agent's [Transform] into a
//! [Steering] each tick, leaving integration to whoever owns the agent.
//!
//! Without smoothing the agent chases one waypoint at a time, moving on once
//! it is within the arrival radius (the stop distance for the final
//! waypoint). With smoothing it moves on as soon as it crosses the turn
//! boundary of the waypoint it is heading for, rotating gradually towards the
//! next one, and decelerates over the stop distance once past the slow down
//! index. Dropping below a fifth of full speed counts as arriving
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Below this fraction of full speed a smoothed agent has arrived
const ARRIVAL_SPEED_PERCENT: f32 = 0.2;

/// Whether an agent is moving along a path
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum FollowState {
	/// Stationary
	#[default]
	Idle,
	/// Moving along a path
	Following,
}

/// Desired motion of an agent for one tick
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Steering {
	/// Units per second to move by
	pub velocity: Vec3,
	/// Orientation to take
	pub rotation: Quat,
}

/// Remembers where a target was when a path to it was last requested
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct TargetTracker {
	/// Target position at the last request
	last_requested: Option<Vec3>,
	/// Squared distance the target may move before a new path is needed
	threshold_sq: f32,
}

impl TargetTracker {
	/// Create a new instance of [TargetTracker] asking for a new path once
	/// the target moves further than `threshold`
	pub fn new(threshold: f32) -> Self {
		TargetTracker {
			last_requested: None,
			threshold_sq: threshold * threshold,
		}
	}
	/// Get the target position at the last request
	pub fn get_last_requested(&self) -> Option<Vec3> {
		self.last_requested
	}
	/// Whether the target moved far enough to need a new path
	pub fn needs_repath(&self, target: Vec3) -> bool {
		match self.last_requested {
			Some(previous) => previous.distance_squared(target) > self.threshold_sq,
			None => true,
		}
	}
	/// Record that a path to `target` was requested
	pub fn mark_requested(&mut self, target: Vec3) {
		self.last_requested = Some(target);
	}
}

/// Moves an agent along the paths handed to it
#[derive(Component, Clone, Debug)]
pub struct PathFollower {
	/// Movement settings
	settings: FollowerSettings,
	/// Path being followed
	path: Option<Path>,
	/// Index of the waypoint being steered towards
	index: usize,
	/// Moving or not
	state: FollowState,
	/// Fraction of full speed applied on the last tick
	speed_percent: f32,
	/// When to ask for a new path to a moving target
	tracker: TargetTracker,
}

impl Default for PathFollower {
	fn default() -> Self {
		PathFollower::new(FollowerSettings::default())
	}
}

impl PathFollower {
	/// Create a new instance of [PathFollower]
	pub fn new(settings: FollowerSettings) -> Self {
		let tracker = TargetTracker::new(settings.repath_threshold);
		PathFollower {
			settings,
			path: None,
			index: 0,
			state: FollowState::Idle,
			speed_percent: 0.0,
			tracker,
		}
	}
	/// Get the settings
	pub fn get_settings(&self) -> &FollowerSettings {
		&self.settings
	}
	/// Get the current path
	pub fn get_path(&self) -> Option<&Path> {
		self.path.as_ref()
	}
	/// Get the index of the waypoint being steered towards
	pub fn get_index(&self) -> usize {
		self.index
	}
	/// Get the state
	pub fn get_state(&self) -> FollowState {
		self.state
	}
	/// Get the fraction of full speed applied on the last tick
	pub fn get_speed_percent(&self) -> f32 {
		self.speed_percent
	}
	/// Get the target tracker
	pub fn get_tracker(&self) -> &TargetTracker {
		&self.tracker
	}
	/// Get the target tracker mutably
	pub fn get_tracker_mut(&mut self) -> &mut TargetTracker {
		&mut self.tracker
	}
	/// Build a request shaped by the settings, smoothed when they ask for it
	pub fn make_request(
		&self,
		key: u64,
		start: Vec3,
		end: Vec3,
		callback: impl FnOnce(Option<Path>, bool) + Send + 'static,
	) -> PathRequest {
		let request = PathRequest::new(key, start, end, callback);
		if self.settings.smooth {
			request.smoothed(self.settings.turn_distance, self.settings.stop_distance)
		} else {
			request
		}
	}
	/// Replace the path wholesale and start following it from the beginning
	pub fn set_path(&mut self, path: Path) {
		self.path = Some(path);
		self.index = 0;
		self.state = FollowState::Following;
	}
	/// Handle the outcome of a path request, a failure leaves the current
	/// path alone
	pub fn receive(&mut self, path: Option<Path>, success: bool) {
		if let (Some(path), true) = (path, success) {
			self.set_path(path);
		}
	}
	/// Drop the path and stop
	pub fn clear(&mut self) {
		self.path = None;
		self.index = 0;
		self.state = FollowState::Idle;
		self.speed_percent = 0.0;
	}
	/// Work out how the agent should move over the next `delta` seconds
	pub fn tick(&mut self, delta: f32, transform: &Transform) -> Steering {
		if self.state != FollowState::Following {
			return self.hold(transform);
		}
		let Some(path) = self.path.take() else {
			return self.hold(transform);
		};
		let steering = match &path {
			Path::Basic(waypoints) => self.steer_basic(waypoints, transform),
			Path::Smooth(smooth) => self.steer_smooth(smooth, delta, transform),
		};
		self.path = Some(path);
		steering
	}
	/// Stop where the agent stands
	fn hold(&mut self, transform: &Transform) -> Steering {
		self.speed_percent = 0.0;
		Steering {
			velocity: Vec3::ZERO,
			rotation: transform.rotation,
		}
	}
	/// Stop and finish following
	fn arrive(&mut self, transform: &Transform) -> Steering {
		self.state = FollowState::Idle;
		self.hold(transform)
	}
	/// Rotation facing `target` level with the agent
	fn facing(transform: &Transform, target: Vec3) -> Quat {
		let level = Vec3::new(target.x, transform.translation.y, target.z);
		if level.distance_squared(transform.translation) < f32::EPSILON {
			return transform.rotation;
		}
		transform.looking_at(level, Dir3::Y).rotation
	}
	/// Chase waypoints one at a time
	fn steer_basic(&mut self, waypoints: &[Vec3], transform: &Transform) -> Steering {
		let position = to_plane(transform.translation);
		loop {
			let Some(target) = waypoints.get(self.index) else {
				return self.arrive(transform);
			};
			let last = self.index + 1 == waypoints.len();
			let radius = if last && self.settings.stop_distance > 0.0 {
				self.settings.stop_distance
			} else {
				self.settings.arrival_radius
			};
			if position.distance(to_plane(*target)) <= radius {
				if last {
					return self.arrive(transform);
				}
				self.index += 1;
				continue;
			}
			let direction = to_world(to_plane(*target) - position, 0.0).normalize_or_zero();
			self.speed_percent = 1.0;
			return Steering {
				velocity: direction * self.settings.speed,
				rotation: PathFollower::facing(transform, *target),
			};
		}
	}
	/// Cross turn boundaries and ease into the end
	fn steer_smooth(&mut self, path: &SmoothPath, delta: f32, transform: &Transform) -> Steering {
		let position = to_plane(transform.translation);
		let lines = path.get_lines();
		let finish = path.get_finish_index();
		if lines.is_empty() {
			return self.arrive(transform);
		}
		while self.index < lines.len() && lines[self.index].has_crossed_line(position) {
			if self.index >= finish {
				return self.arrive(transform);
			}
			self.index += 1;
		}
		self.speed_percent = 1.0;
		let stop = self.settings.stop_distance;
		if self.index >= path.get_slow_index() && stop > 0.0 {
			self.speed_percent = (lines[finish].distance_from_point(position) / stop).clamp(0.0, 1.0);
			if self.speed_percent < ARRIVAL_SPEED_PERCENT {
				return self.arrive(transform);
			}
		}
		let Some(target) = path.get_waypoints().get(self.index) else {
			return self.arrive(transform);
		};
		let desired = PathFollower::facing(transform, *target);
		let rotation = transform
			.rotation
			.slerp(desired, (self.settings.turn_speed * delta).clamp(0.0, 1.0));
		let forward = rotation * Vec3::NEG_Z;
		Steering {
			velocity: forward * self.settings.speed * self.speed_percent,
			rotation,
		}
	}
}
