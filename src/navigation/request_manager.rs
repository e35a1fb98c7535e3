//! Serving many path requests without stalling the simulation.
//!
//! Each request carries a key identifying who asked for it, usually one key
//! per agent. Only one request per key may be computing at a time, a request
//! arriving while its key is in flight is dropped rather than queued. Every
//! accepted request is computed on its own worker thread against a shared,
//! read-only [PathFinder]. Workers never call back into the caller, their
//! [PathResult] is sent over a channel and the callbacks run when the owner
//! of the manager polls it, so all of them happen in one place and one at a
//! time.
//!
//! ```text
//! request_path ──> worker thread ──> channel ──> poll ──> callback
//!      │                │
//!      └── in flight ───┘ key released once the result is computed
//! ```
//!
//! Mutating the finder, like rebuilding or blurring a grid, is only possible
//! through [PathRequestManager::regenerate] which waits for the workers to let
//! go of it first. Once [PathRequestManager::shutdown] has run the manager
//! accepts no more requests and results of abandoned workers are never
//! delivered
//!

use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::prelude::*;
use bevy::prelude::*;

/// Invoked with the computed path, or `None`, and whether the search succeeded
pub type PathCallback = Box<dyn FnOnce(Option<Path>, bool) + Send>;

/// How long to sleep between checks while waiting on workers
const WAIT_STEP: Duration = Duration::from_millis(1);

/// A path wanted by a caller
pub struct PathRequest {
	/// Identity used to drop duplicates
	key: u64,
	/// Where from, where to and how to shape the path
	query: PathQuery,
	/// Receives the outcome
	callback: PathCallback,
}

impl PathRequest {
	/// Create a new instance of [PathRequest] for an unsmoothed path
	pub fn new(
		key: u64,
		start: Vec3,
		end: Vec3,
		callback: impl FnOnce(Option<Path>, bool) + Send + 'static,
	) -> Self {
		PathRequest {
			key,
			query: PathQuery::new(start, end),
			callback: Box::new(callback),
		}
	}
	/// Ask for the path to be smoothed
	pub fn smoothed(mut self, turn_distance: f32, stop_distance: f32) -> Self {
		self.query = self.query.smoothed(turn_distance, stop_distance);
		self
	}
	/// Get the key
	pub fn get_key(&self) -> u64 {
		self.key
	}
	/// Get the query
	pub fn get_query(&self) -> &PathQuery {
		&self.query
	}
}

impl fmt::Debug for PathRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PathRequest")
			.field("key", &self.key)
			.field("query", &self.query)
			.finish_non_exhaustive()
	}
}

/// The outcome of a [PathRequest] waiting to be handed back
pub struct PathResult {
	/// Key of the request
	key: u64,
	/// The path found, if any
	path: Option<Path>,
	/// Whether a path was found
	success: bool,
	/// Callback of the request
	callback: PathCallback,
}

impl PathResult {
	/// Get the key
	pub fn get_key(&self) -> u64 {
		self.key
	}
	/// Get the path
	pub fn get_path(&self) -> Option<&Path> {
		self.path.as_ref()
	}
	/// Get whether a path was found
	pub fn is_success(&self) -> bool {
		self.success
	}
	/// Hand the outcome to the requester
	pub fn deliver(self) {
		(self.callback)(self.path, self.success);
	}
}

impl fmt::Debug for PathResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PathResult")
			.field("key", &self.key)
			.field("path", &self.path)
			.field("success", &self.success)
			.finish_non_exhaustive()
	}
}

/// Lock a mutex, carrying on with the data of a poisoned one. The guarded
/// sets and lists stay valid whatever a panicking holder was doing
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Dispatches path requests to worker threads and hands their results back
/// on [PathRequestManager::poll]
pub struct PathRequestManager<F: PathFinder = SpatialMap> {
	/// The finder shared with workers
	finder: RwLock<Arc<F>>,
	/// Keys of requests being computed
	in_flight: Arc<Mutex<HashSet<u64>>>,
	/// Handles of workers that may still be running
	workers: Mutex<Vec<JoinHandle<()>>>,
	/// Cloned into every worker
	sender: Sender<PathResult>,
	/// Results waiting to be delivered
	receiver: Receiver<PathResult>,
	/// Paces [PathRequestManager::tick]
	poll_timer: Timer,
	/// Bounded wait for workers on shutdown
	shutdown_timeout: Duration,
	/// Set by shutdown, refuses requests and drops late results
	closed: AtomicBool,
}

impl PathRequestManager<SpatialMap> {
	/// Create a new instance of [PathRequestManager] serving a map, polling at
	/// the interval configured for its kind
	pub fn from_map(map: SpatialMap, settings: &RequestSettings) -> Self {
		let interval = map.poll_interval(settings);
		PathRequestManager::new(map, interval, settings.shutdown_wait())
	}
}

impl<F: PathFinder> PathRequestManager<F> {
	/// Create a new instance of [PathRequestManager]
	pub fn new(finder: F, poll_interval: Duration, shutdown_timeout: Duration) -> Self {
		let (sender, receiver) = unbounded();
		PathRequestManager {
			finder: RwLock::new(Arc::new(finder)),
			in_flight: Arc::new(Mutex::new(HashSet::new())),
			workers: Mutex::new(Vec::new()),
			sender,
			receiver,
			poll_timer: Timer::new(poll_interval, TimerMode::Repeating),
			shutdown_timeout,
			closed: AtomicBool::new(false),
		}
	}
	/// Get a handle to the current finder
	pub fn finder(&self) -> Arc<F> {
		Arc::clone(&self.finder.read().unwrap_or_else(PoisonError::into_inner))
	}
	/// Get the interval between polls driven by [PathRequestManager::tick]
	pub fn get_poll_interval(&self) -> Duration {
		self.poll_timer.duration()
	}
	/// Get the bounded wait applied on shutdown
	pub fn get_shutdown_timeout(&self) -> Duration {
		self.shutdown_timeout
	}
	/// Number of requests currently being computed
	pub fn in_flight(&self) -> usize {
		lock(&self.in_flight).len()
	}
	/// Whether [PathRequestManager::shutdown] has run
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}
	/// Whether a request with `key` is being computed
	pub fn is_in_flight(&self, key: u64) -> bool {
		lock(&self.in_flight).contains(&key)
	}
	/// Submit a request. Returns `true` if a worker was dispatched, `false`
	/// if the key is already in flight, the manager is shut down or no worker
	/// could be started
	pub fn request_path(&self, request: PathRequest) -> bool {
		match self.try_request_path(request) {
			Ok(dispatched) => dispatched,
			Err(e) => {
				warn!("{}", e);
				false
			}
		}
	}
	/// Submit a request, surfacing a failure to start its worker
	pub fn try_request_path(&self, request: PathRequest) -> Result<bool, NavError> {
		let key = request.key;
		if self.is_closed() {
			debug!("Dropped path request {}, the manager is shut down", key);
			return Ok(false);
		}
		if !lock(&self.in_flight).insert(key) {
			debug!("Dropped path request {}, one is already in flight", key);
			return Ok(false);
		}
		let finder = self.finder();
		let in_flight = Arc::clone(&self.in_flight);
		let sender = self.sender.clone();
		let spawned = thread::Builder::new()
			.name(format!("path-worker-{}", key))
			.spawn(move || {
				let PathRequest {
					key,
					query,
					callback,
				} = request;
				let outcome = panic::catch_unwind(AssertUnwindSafe(|| finder.find_path(&query)));
				// the finder must be released before the key so an idle
				// manager never has a worker holding the map
				drop(finder);
				lock(&in_flight).remove(&key);
				match outcome {
					Ok(path) => {
						let success = path.is_some();
						let result = PathResult {
							key,
							path,
							success,
							callback,
						};
						// a closed channel means nobody is listening any more
						let _ = sender.send(result);
					}
					Err(_) => error!("Path worker for request {} panicked, the request is dropped", key),
				}
			});
		match spawned {
			Ok(handle) => {
				lock(&self.workers).push(handle);
				Ok(true)
			}
			Err(e) => {
				lock(&self.in_flight).remove(&key);
				Err(NavError::WorkerSpawn(e.to_string()))
			}
		}
	}
	/// Deliver every result computed so far on the calling thread, returns
	/// how many callbacks were invoked
	pub fn poll(&self) -> usize {
		if self.is_closed() {
			self.discard_results();
			return 0;
		}
		let mut delivered = 0;
		for result in self.receiver.try_iter() {
			result.deliver();
			delivered += 1;
		}
		lock(&self.workers).retain(|handle| !handle.is_finished());
		delivered
	}
	/// Advance the poll timer, polling whenever it elapses. Returns how many
	/// callbacks were invoked
	pub fn tick(&mut self, delta: Duration) -> usize {
		self.poll_timer.tick(delta);
		if self.poll_timer.just_finished() {
			self.poll()
		} else {
			0
		}
	}
	/// Mutate the finder once no worker holds it. Waits up to `timeout` for
	/// in-flight requests to drain
	pub fn regenerate(&self, timeout: Duration, f: impl FnOnce(&mut F)) -> Result<(), NavError> {
		let deadline = Instant::now() + timeout;
		loop {
			if self.in_flight() == 0 {
				let mut guard = self.finder.write().unwrap_or_else(PoisonError::into_inner);
				if let Some(finder) = Arc::get_mut(&mut *guard) {
					f(finder);
					return Ok(());
				}
			}
			if Instant::now() >= deadline {
				return Err(NavError::MapBusy);
			}
			thread::sleep(WAIT_STEP);
		}
	}
	/// Swap in a different finder. Workers already running finish against
	/// the one they started with
	pub fn replace_finder(&self, finder: F) {
		*self.finder.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(finder);
	}
	/// Wait a bounded time for running workers and discard undelivered
	/// results. Requests still running afterwards are abandoned
	pub fn shutdown(&self) {
		self.closed.store(true, Ordering::Release);
		let deadline = Instant::now() + self.shutdown_timeout;
		let mut pending = std::mem::take(&mut *lock(&self.workers));
		while !pending.is_empty() {
			let (finished, running): (Vec<_>, Vec<_>) =
				pending.into_iter().partition(|handle| handle.is_finished());
			for handle in finished {
				// worker panics are caught inside the thread
				let _ = handle.join();
			}
			pending = running;
			if pending.is_empty() || Instant::now() >= deadline {
				break;
			}
			thread::sleep(WAIT_STEP);
		}
		if !pending.is_empty() {
			warn!(
				"Gave up on {} path workers still running after {:?}",
				pending.len(),
				self.shutdown_timeout
			);
		}
		self.discard_results();
	}
	/// Drop every queued result without running its callback
	fn discard_results(&self) {
		let discarded = self.receiver.try_iter().count();
		if discarded > 0 {
			debug!("Discarded {} undelivered path results", discarded);
		}
	}
}

impl<F: PathFinder> Drop for PathRequestManager<F> {
	fn drop(&mut self) {
		self.shutdown();
	}
}

impl<F: PathFinder> fmt::Debug for PathRequestManager<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PathRequestManager")
			.field("in_flight", &self.in_flight())
			.field("poll_interval", &self.get_poll_interval())
			.field("shutdown_timeout", &self.shutdown_timeout)
			.finish_non_exhaustive()
	}
}
