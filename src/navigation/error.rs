//! Errors raised while loading configuration, persisting maps or managing requests
//!

use thiserror::Error;

/// Failures surfaced by the fallible operations of the navigator
#[derive(Debug, Error)]
pub enum NavError {
	/// Reading or writing a file failed
	#[error("io failure: {0}")]
	Io(#[from] std::io::Error),
	/// A `.ron` settings file could not be parsed
	#[cfg(feature = "ron")]
	#[error("failed to parse ron: {0}")]
	Ron(#[from] ron::error::SpannedError),
	/// A `.csv` terrain table could not be parsed
	#[cfg(feature = "csv")]
	#[error("failed to parse csv: {0}")]
	Csv(#[from] csv::Error),
	/// A persisted grid holds fewer floats than the smallest valid payload
	#[error("grid payload holds {floats} floats, at least 9 are required")]
	UndersizedPayload {
		/// Number of floats found in the payload
		floats: usize,
	},
	/// A persisted grid is inconsistent with its own header or trailer
	#[error("corrupt grid payload: {0}")]
	CorruptPayload(String),
	/// A navmesh was requested from a world without a ground footprint
	#[error("the world has no ground footprint to build a navmesh from")]
	MissingGround,
	/// Path requests kept the map shared for longer than the allowed wait
	#[error("the map is still shared with in-flight path requests")]
	MapBusy,
	/// The thread computing a path could not be started
	#[error("failed to spawn path worker: {0}")]
	WorkerSpawn(String),
}
