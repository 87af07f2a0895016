//! Value types for the web view bridge.
//!
//! This crate contains the plain data exchanged between the bridge and its
//! hosts: navigation status codes, permission kinds and verdicts, cookie
//! records, scheme request/response shapes, find-in-page results, and the
//! session options applied at attach time.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond conversion and serialization
//! - **Stable codes**: Integer codes match the C ABI and never change meaning
//! - **Engine agnostic**: Nothing here knows which engine renders the content
//!
//! The session, dispatcher, and engine boundary are built on top of these
//! types in `wv-runtime` and `wv-rs`.

pub mod cookie;
pub mod options;
pub mod types;

pub use cookie::*;
pub use options::*;
pub use types::*;
