//! Defines the Bevy [Plugin] for navigating agents along computed paths
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod follow_layer;
pub mod request_layer;

/// Order in which the navigation systems run each update
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Issue path requests
	Request,
	/// Hand completed paths to their agents
	Deliver,
	/// Move agents along their paths
	Steer,
}

/// Registers the navigation types, events and systems. The map itself is
/// supplied by inserting a [NavigationMap] resource once one has been built
#[derive(Default)]
pub struct NavigatorPlugin {
	/// Paces the checks of moving targets
	follower: FollowerSettings,
}

impl NavigatorPlugin {
	/// Create a new instance of [NavigatorPlugin] checking moving targets at
	/// the cadence of `follower`
	pub fn new(follower: FollowerSettings) -> Self {
		NavigatorPlugin { follower }
	}
}

impl Plugin for NavigatorPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<MapKind>()
			.register_type::<Winding>()
			.register_type::<FollowState>()
			.register_type::<TargetTracker>()
			.register_type::<NavigatorSettings>()
			.register_type::<GridSettings>()
			.register_type::<NavMeshSettings>()
			.register_type::<RequestSettings>()
			.register_type::<FollowerSettings>()
			.register_type::<GridSummary>()
			.register_type::<PathTarget>()
			.init_resource::<PathInbox>()
			.insert_resource(RepathTimer::new(self.follower.repath_interval))
			.add_event::<request_layer::EventPathRequest>()
			.configure_sets(
				Update,
				(
					OrderingSet::Request,
					OrderingSet::Deliver,
					OrderingSet::Steer,
				)
					.chain(),
			)
			.add_systems(
				Update,
				(
					(
						follow_layer::track_moving_targets,
						request_layer::event_request_paths,
					)
						.chain()
						.in_set(OrderingSet::Request),
					request_layer::poll_path_results.in_set(OrderingSet::Deliver),
					follow_layer::steer_followers.in_set(OrderingSet::Steer),
				),
			);
	}
}
