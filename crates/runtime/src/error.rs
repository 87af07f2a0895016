//! Error types for the bridge runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the bridge runtime and sessions.
#[derive(Debug, Error)]
pub enum Error {
	/// The owner loop no longer accepts work.
	#[error("Owner loop closed")]
	LoopClosed,

	/// The queued task was dropped or panicked before producing a value.
	#[error("Dispatched task aborted before completion")]
	DispatchAborted,

	/// The session has been detached.
	#[error("Detached")]
	Detached,

	/// The session has no live view yet.
	#[error("Not attached")]
	NotAttached,

	/// Invalid argument provided to an operation.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// Failed to start a dedicated owner thread.
	#[error("Failed to spawn owner thread: {0}")]
	ThreadSpawn(#[from] std::io::Error),
}

impl Error {
	/// Returns true if the error means no live view exists.
	///
	/// Hosts cannot tell "detached" from "never attached" through the C ABI,
	/// so both count.
	pub fn is_detached(&self) -> bool {
		matches!(self, Error::Detached | Error::NotAttached)
	}

	/// Returns true if the owner loop is gone and further dispatches will fail.
	pub fn is_loop_closed(&self) -> bool {
		matches!(self, Error::LoopClosed)
	}
}
