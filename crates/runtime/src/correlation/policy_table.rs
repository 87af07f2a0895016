//! Pending navigation decisions keyed by request id.
//!
//! Uses [`DashMap`] so hosts can resolve decisions from any thread while the
//! owner thread registers new ones. Removal is the single point of
//! resolution: whichever caller removes an entry applies it, so each decision
//! is applied at most once.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::PolicyRequestId;

/// An engine navigation decision awaiting the host's answer.
///
/// Implementations must tolerate being applied from any thread. Dropping a
/// decision without applying it leaves the engine's default behavior in
/// place.
pub trait PolicyDecision: Send + Sync {
	/// Lets the navigation proceed.
	fn allow(self: Box<Self>);

	/// Blocks the navigation.
	fn deny(self: Box<Self>);
}

/// Thread-safe table of pending [`PolicyDecision`]s.
pub struct PolicyTable {
	next_id: AtomicU64,
	entries: DashMap<PolicyRequestId, Box<dyn PolicyDecision>>,
}

impl Default for PolicyTable {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for PolicyTable {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PolicyTable")
			.field("pending", &self.entries.len())
			.finish()
	}
}

impl PolicyTable {
	pub fn new() -> Self {
		Self {
			next_id: AtomicU64::new(1),
			entries: DashMap::new(),
		}
	}

	/// Stores a decision and returns the id the host must answer with.
	///
	/// Ids start at 1 and strictly increase for the table's lifetime.
	pub fn register(&self, decision: Box<dyn PolicyDecision>) -> PolicyRequestId {
		let id = PolicyRequestId(self.next_id.fetch_add(1, Ordering::SeqCst));
		self.entries.insert(id, decision);
		id
	}

	/// Applies the host's answer to a pending decision.
	///
	/// Returns false if the id is unknown or was already resolved.
	pub fn resolve(&self, id: PolicyRequestId, allow: bool) -> bool {
		let Some((_, decision)) = self.entries.remove(&id) else {
			tracing::debug!(%id, "ignoring answer for unknown policy request");
			return false;
		};
		if allow {
			decision.allow();
		} else {
			decision.deny();
		}
		true
	}

	/// Denies every pending decision. Returns how many were denied.
	pub fn cancel_all(&self) -> usize {
		let ids: Vec<PolicyRequestId> = self.entries.iter().map(|entry| *entry.key()).collect();
		let mut cancelled = 0;
		for id in ids {
			if let Some((_, decision)) = self.entries.remove(&id) {
				decision.deny();
				cancelled += 1;
			}
		}
		cancelled
	}

	/// Returns true if `id` is still awaiting an answer.
	pub fn contains(&self, id: PolicyRequestId) -> bool {
		self.entries.contains_key(&id)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
