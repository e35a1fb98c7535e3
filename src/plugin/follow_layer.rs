//! Logic relating to agents following their paths and chasing moving targets
//!

use std::time::Duration;

use crate::prelude::*;
use bevy::prelude::*;

/// An entity an agent keeps a path to, re-requested as the target moves
#[derive(Component, Clone, Copy, Debug, Reflect)]
pub struct PathTarget {
	/// The entity being chased
	pub target: Entity,
}

impl PathTarget {
	/// Create a new instance of [PathTarget]
	pub fn new(target: Entity) -> Self {
		PathTarget { target }
	}
}

/// Paces how often moving targets are checked
#[derive(Resource, Debug)]
pub struct RepathTimer(Timer);

impl Default for RepathTimer {
	fn default() -> Self {
		RepathTimer::new(FollowerSettings::default().repath_interval)
	}
}

impl RepathTimer {
	/// Create a new instance of [RepathTimer] firing every `seconds`
	pub fn new(seconds: f32) -> Self {
		RepathTimer(Timer::new(
			Duration::from_secs_f32(seconds.max(0.0)),
			TimerMode::Repeating,
		))
	}
	/// Get the timer
	pub fn get(&self) -> &Timer {
		&self.0
	}
}

/// Send an [EventPathRequest] for every agent whose [PathTarget] has moved
/// beyond its re-path threshold since the last request
#[cfg(not(tarpaulin_include))]
pub fn track_moving_targets(
	time: Res<Time>,
	mut timer: ResMut<RepathTimer>,
	followers: Query<(Entity, &Transform, &PathTarget, &PathFollower)>,
	targets: Query<&Transform>,
	mut events: EventWriter<EventPathRequest>,
) {
	timer.0.tick(time.delta());
	if !timer.0.just_finished() {
		return;
	}
	for (entity, transform, path_target, follower) in &followers {
		// a despawned target leaves the agent on its last path
		let Ok(target) = targets.get(path_target.target) else {
			continue;
		};
		if follower.get_tracker().needs_repath(target.translation) {
			events.write(EventPathRequest::new(
				entity,
				transform.translation,
				target.translation,
			));
		}
	}
}

/// Apply the steering of each [PathFollower] to its [Transform]
#[cfg(not(tarpaulin_include))]
pub fn steer_followers(time: Res<Time>, mut followers: Query<(&mut PathFollower, &mut Transform)>) {
	let delta = time.delta_secs();
	for (mut follower, mut transform) in &mut followers {
		let steering = follower.tick(delta, &transform);
		transform.rotation = steering.rotation;
		transform.translation += steering.velocity * delta;
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn repath_timer_default() {
		let timer = RepathTimer::default();
		assert_eq!(Duration::from_millis(500), timer.get().duration());
	}
}
