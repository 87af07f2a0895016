//! Process-wide engine installation.
//!
//! An engine binding calls [`install_engine`] once at startup; every session
//! created through the C ABI afterwards uses it.

use std::sync::Arc;

use parking_lot::Mutex;
use wv::Engine;
use wv::testing::HeadlessEngine;

static ENGINE: Mutex<Option<Arc<dyn Engine>>> = parking_lot::const_mutex(None);

/// Installs the engine used by `wv_create`. Returns the engine it replaces.
///
/// Sessions created earlier keep their engine.
pub fn install_engine(engine: Arc<dyn Engine>) -> Option<Arc<dyn Engine>> {
	ENGINE.lock().replace(engine)
}

/// The installed engine, if any.
pub fn installed_engine() -> Option<Arc<dyn Engine>> {
	ENGINE.lock().clone()
}

/// Installs an in-process headless engine for smoke tests.
///
/// Returns false if the engine's owner thread cannot be started.
#[unsafe(no_mangle)]
pub extern "C" fn wv_install_headless_engine() -> bool {
	match HeadlessEngine::new() {
		Ok(engine) => {
			install_engine(engine);
			tracing::debug!("headless engine installed");
			true
		}
		Err(err) => {
			tracing::warn!(error = %err, "headless engine failed to start");
			false
		}
	}
}
