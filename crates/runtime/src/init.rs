//! Process-wide toolkit initialization.
//!
//! Engine toolkits typically need a one-time init before any view can be
//! created. The flag is set only after a successful init, so a failed
//! attempt is retried by the next caller.

use parking_lot::Mutex;

static INITIALIZED: Mutex<bool> = parking_lot::const_mutex(false);

/// Runs `init` unless a previous call already succeeded.
///
/// Callers are serialized; concurrent callers wait for an in-progress init
/// instead of running their own. Returns true once initialization has
/// succeeded.
pub fn ensure_initialized(init: impl FnOnce() -> bool) -> bool {
	let mut initialized = INITIALIZED.lock();
	if !*initialized {
		*initialized = init();
		if *initialized {
			tracing::debug!("engine toolkit initialized");
		} else {
			tracing::warn!("engine toolkit initialization failed");
		}
	}
	*initialized
}

/// Returns true if a previous [`ensure_initialized`] call succeeded.
pub fn is_initialized() -> bool {
	*INITIALIZED.lock()
}
