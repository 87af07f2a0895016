//! Request correlation.
//!
//! Two registries tie asynchronous engine activity back to the host:
//!
//! - [`PolicyTable`] holds engine navigation decisions while the host decides,
//!   keyed by a [`PolicyRequestId`] the host later passes back.
//! - [`OperationRegistry`] tracks in-flight asynchronous operations so that
//!   each one resolves exactly once, even when its session is torn down first.

mod operations;
mod policy_table;


pub use operations::{OperationId, OperationRegistry, PendingOperation};
pub use policy_table::{PolicyDecision, PolicyTable};

/// Identifier of a pending navigation decision. Zero is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyRequestId(u64);

impl PolicyRequestId {
	/// Wraps a raw id received from a host.
	pub fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	/// Returns the raw id handed to hosts.
	pub fn get(self) -> u64 {
		self.0
	}
}

impl std::fmt::Display for PolicyRequestId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "policy#{}", self.0)
	}
}

/// Host-chosen correlation id for a script evaluation. Echoed back verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScriptRequestId(pub u64);

impl std::fmt::Display for ScriptRequestId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "script#{}", self.0)
	}
}
