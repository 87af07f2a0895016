// Shared helpers for session integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use wv::testing::HeadlessEngine;
use wv::{Callbacks, Session, SessionOptions, SurfaceId};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Collects values delivered to a callback on the owner thread.
pub struct Inbox<T> {
	tx: Sender<T>,
	rx: Receiver<T>,
}

impl<T: Send + 'static> Inbox<T> {
	pub fn new() -> Self {
		let (tx, rx) = mpsc::channel();
		Self { tx, rx }
	}

	pub fn sender(&self) -> Sender<T> {
		self.tx.clone()
	}

	/// A `FnOnce` callback that posts into this inbox.
	pub fn once(&self) -> impl FnOnce(T) + Send + 'static {
		let tx = self.tx.clone();
		move |value| {
			let _ = tx.send(value);
		}
	}

	/// Waits for the next value.
	pub fn recv(&self) -> T {
		self.rx
			.recv_timeout(TIMEOUT)
			.expect("callback was not invoked in time")
	}

	/// Everything delivered so far, without waiting.
	pub fn drain(&self) -> Vec<T> {
		self.rx.try_iter().collect()
	}
}

pub fn engine() -> Arc<HeadlessEngine> {
	HeadlessEngine::new().expect("headless engine starts")
}

/// A session attached to surface 1.
pub fn attached(engine: &Arc<HeadlessEngine>, callbacks: Callbacks) -> Session {
	attached_with(engine, callbacks, SessionOptions::default())
}

pub fn attached_with(
	engine: &Arc<HeadlessEngine>,
	callbacks: Callbacks,
	options: SessionOptions,
) -> Session {
	let session = Session::with_options(engine.clone(), callbacks, options);
	assert!(session.attach(SurfaceId(1)), "attach succeeds");
	session
}
