//! A queue-driven owner loop.
//!
//! [`MainLoop`] is bound to the thread that creates it. Any thread can queue
//! work through a [`LoopHandle`]; the owner drains the queue with
//! [`run`](MainLoop::run) or [`run_pending`](MainLoop::run_pending).

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, ThreadId};

use tokio::sync::mpsc;

use super::{RunLoop, Task};
use crate::error::{Error, Result};

enum Message {
	Run(Task),
	Quit,
}

/// Cloneable, thread-safe handle for queueing work onto a [`MainLoop`].
#[derive(Clone)]
pub struct LoopHandle {
	owner: ThreadId,
	tx: mpsc::UnboundedSender<Message>,
}

impl std::fmt::Debug for LoopHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LoopHandle")
			.field("owner", &self.owner)
			.field("closed", &self.tx.is_closed())
			.finish()
	}
}

impl LoopHandle {
	/// Returns the id of the loop's owner thread.
	pub fn owner(&self) -> ThreadId {
		self.owner
	}

	/// Asks the loop to stop after the tasks queued before this call.
	///
	/// Returns false if the loop had already stopped.
	pub fn quit(&self) -> bool {
		self.tx.send(Message::Quit).is_ok()
	}

	/// Returns true once the loop has stopped accepting work.
	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

impl RunLoop for LoopHandle {
	fn is_owner(&self) -> bool {
		thread::current().id() == self.owner
	}

	fn post(&self, task: Task) -> bool {
		self.tx.send(Message::Run(task)).is_ok()
	}
}

/// A task queue owned by one thread.
///
/// [`run`](Self::run) blocks the calling thread and must not be called from
/// inside an async runtime. Use [`spawn`](Self::spawn) to give the loop a
/// dedicated thread.
pub struct MainLoop {
	handle: LoopHandle,
	rx: mpsc::UnboundedReceiver<Message>,
}

impl Default for MainLoop {
	fn default() -> Self {
		Self::new()
	}
}

impl MainLoop {
	/// Creates a loop owned by the calling thread.
	pub fn new() -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		Self {
			handle: LoopHandle {
				owner: thread::current().id(),
				tx,
			},
			rx,
		}
	}

	/// Starts a loop on a new named thread and returns its handle.
	///
	/// The thread exits after [`LoopHandle::quit`].
	pub fn spawn(name: impl Into<String>) -> Result<LoopHandle> {
		let name = name.into();
		let (handle_tx, handle_rx) = std::sync::mpsc::sync_channel(1);

		thread::Builder::new().name(name.clone()).spawn(move || {
			let mut main_loop = MainLoop::new();
			if handle_tx.send(main_loop.handle()).is_err() {
				return;
			}
			tracing::debug!(thread = %name, "owner loop started");
			main_loop.run();
			tracing::debug!(thread = %name, "owner loop stopped");
		})?;

		handle_rx.recv().map_err(|_| {
			Error::ThreadSpawn(std::io::Error::other("owner thread exited during startup"))
		})
	}

	/// Returns a handle for queueing work onto this loop.
	pub fn handle(&self) -> LoopHandle {
		self.handle.clone()
	}

	/// Runs queued tasks until [`LoopHandle::quit`] is called.
	///
	/// Tasks still queued behind the quit request are dropped, which fails
	/// any synchronous dispatch waiting on them.
	pub fn run(&mut self) {
		while let Some(message) = self.rx.blocking_recv() {
			match message {
				Message::Run(task) => run_task(task),
				Message::Quit => break,
			}
		}
		self.close();
	}

	/// Runs every task already queued without blocking. Returns how many ran.
	///
	/// A pending quit request closes the loop and stops the drain.
	pub fn run_pending(&mut self) -> usize {
		let mut ran = 0;
		while let Ok(message) = self.rx.try_recv() {
			match message {
				Message::Run(task) => {
					run_task(task);
					ran += 1;
				}
				Message::Quit => {
					self.close();
					break;
				}
			}
		}
		ran
	}

	fn close(&mut self) {
		self.rx.close();
		let mut dropped = 0usize;
		while let Ok(message) = self.rx.try_recv() {
			if let Message::Run(task) = message {
				drop(task);
				dropped += 1;
			}
		}
		if dropped > 0 {
			tracing::debug!(dropped, "owner loop closed with queued tasks");
		}
	}
}

fn run_task(task: Task) {
	if let Err(panic) = catch_unwind(AssertUnwindSafe(task)) {
		let message = panic
			.downcast_ref::<&str>()
			.map(|s| s.to_string())
			.or_else(|| panic.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "non-string panic payload".to_string());
		tracing::error!(%message, "task panicked on owner loop");
	}
}
