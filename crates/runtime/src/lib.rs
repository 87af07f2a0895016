//! Web view bridge runtime: owner-thread dispatch and request correlation.
//!
//! This crate provides the threading infrastructure every session is built on:
//!
//! - **Dispatch**: Running work on the engine's owner thread, synchronously or
//!   fire-and-forget, from any thread
//! - **Main loop**: A queue-driven loop that can serve as the owner thread
//! - **Correlation**: Pending navigation decisions keyed by request id, and
//!   in-flight asynchronous operations that must resolve exactly once
//! - **Initialization**: A process-wide, retryable toolkit init flag
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │    wv-rs    │  Session, engine boundary, event translation
//! └──────┬──────┘
//!        │ owns one Dispatcher, PolicyTable, OperationRegistry per session
//! ┌──────▼──────┐
//! │ wv-runtime  │  This crate
//! │  ┌────────┐ │
//! │  │Dispatch│ │  Owner-thread marshaling
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Corr.  │ │  Policy table, operation registry
//! │  └────────┘ │
//! └─────────────┘
//! ```

pub mod correlation;
pub mod dispatch;
pub mod error;
pub mod init;

pub use correlation::{
	OperationId, OperationRegistry, PendingOperation, PolicyDecision, PolicyRequestId, PolicyTable,
	ScriptRequestId,
};
pub use dispatch::{Dispatcher, LoopHandle, MainLoop, RunLoop, Task};
pub use error::{Error, Result};
pub use init::{ensure_initialized, is_initialized};
