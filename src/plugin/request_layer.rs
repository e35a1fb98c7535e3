//! Logic relating to requesting paths and routing the results back to agents
//!

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::prelude::*;
use bevy::prelude::*;

/// Ask for a path for `entity` from `start` to `end`. The entity is the
/// request key, a new request for an entity whose last one is still being
/// computed is dropped
#[derive(Event, Clone, Copy, Debug)]
pub struct EventPathRequest {
	/// The agent wanting a path
	entity: Entity,
	/// Where the path begins
	start: Vec3,
	/// Where the path ends
	end: Vec3,
}

impl EventPathRequest {
	/// Create a new instance of [EventPathRequest]
	pub fn new(entity: Entity, start: Vec3, end: Vec3) -> Self {
		EventPathRequest { entity, start, end }
	}
	/// Get the requesting entity
	pub fn get_entity(&self) -> Entity {
		self.entity
	}
	/// Get the start
	pub fn get_start(&self) -> Vec3 {
		self.start
	}
	/// Get the end
	pub fn get_end(&self) -> Vec3 {
		self.end
	}
}

/// The map agents navigate, with the manager serving paths through it
#[derive(Resource, Debug)]
pub struct NavigationMap(PathRequestManager<SpatialMap>);

impl NavigationMap {
	/// Create a new instance of [NavigationMap] serving `map`
	pub fn new(map: SpatialMap, settings: &RequestSettings) -> Self {
		NavigationMap(PathRequestManager::from_map(map, settings))
	}
	/// Create a new instance of [NavigationMap] by building a map of `kind`
	/// from the world
	pub fn build(
		builder: &MapBuilder,
		kind: MapKind,
		world: &dyn NavigationWorld,
	) -> Result<Self, NavError> {
		let map = builder.build(kind, world)?;
		Ok(NavigationMap::new(map, &builder.get_settings().request))
	}
	/// Get the request manager
	pub fn get(&self) -> &PathRequestManager<SpatialMap> {
		&self.0
	}
	/// Get the request manager mutably
	pub fn get_mut(&mut self) -> &mut PathRequestManager<SpatialMap> {
		&mut self.0
	}
}

/// Completed paths waiting to be handed to the entity that asked for them
#[derive(Resource)]
pub struct PathInbox {
	/// Cloned into every request callback
	sender: Sender<(Entity, Option<Path>, bool)>,
	/// Drained after each poll
	receiver: Receiver<(Entity, Option<Path>, bool)>,
}

impl Default for PathInbox {
	fn default() -> Self {
		let (sender, receiver) = unbounded();
		PathInbox { sender, receiver }
	}
}

impl PathInbox {
	/// A callback posting the outcome of a request into the inbox
	pub fn callback_for(&self, entity: Entity) -> impl FnOnce(Option<Path>, bool) + Send + 'static {
		let sender = self.sender.clone();
		move |path, success| {
			// the inbox only closes when the app is torn down
			let _ = sender.send((entity, path, success));
		}
	}
	/// Take everything delivered so far
	pub fn drain(&self) -> Vec<(Entity, Option<Path>, bool)> {
		self.receiver.try_iter().collect()
	}
}

/// Process [EventPathRequest] into requests on the [NavigationMap]
#[cfg(not(tarpaulin_include))]
pub fn event_request_paths(
	mut events: EventReader<EventPathRequest>,
	map: Option<Res<NavigationMap>>,
	inbox: Res<PathInbox>,
	mut followers: Query<&mut PathFollower>,
) {
	let Some(map) = map else {
		// nothing to path through yet
		events.clear();
		return;
	};
	for event in events.read() {
		let callback = inbox.callback_for(event.entity);
		let request = match followers.get(event.entity) {
			Ok(follower) => follower.make_request(event.entity.to_bits(), event.start, event.end, callback),
			Err(_) => PathRequest::new(event.entity.to_bits(), event.start, event.end, callback),
		};
		if map.get().request_path(request) {
			if let Ok(mut follower) = followers.get_mut(event.entity) {
				follower.get_tracker_mut().mark_requested(event.end);
			}
		}
	}
}

/// Advance the poll cadence of the [NavigationMap] and hand any delivered
/// paths to their [PathFollower]
#[cfg(not(tarpaulin_include))]
pub fn poll_path_results(
	time: Res<Time>,
	map: Option<ResMut<NavigationMap>>,
	inbox: Res<PathInbox>,
	mut followers: Query<&mut PathFollower>,
) {
	let Some(mut map) = map else {
		return;
	};
	map.get_mut().tick(time.delta());
	for (entity, path, success) in inbox.drain() {
		// the agent may have been despawned while its path was computed
		if let Ok(mut follower) = followers.get_mut(entity) {
			follower.receive(path, success);
		}
	}
}
