//! Core types for the runtime client
//!
//! This module provides the fundamental types used throughout the crate:
//! - `RuntimeError` / `TransportError` - Error taxonomy
//! - `SupervisorState` - Lifecycle of a local runtime process
//! - `RetryPolicy` / `poll_until` - Bounded polling primitive

pub mod error;
pub mod retry;
pub mod state;

pub use error::{RuntimeError, RuntimeResult, TransportError};
pub use retry::{poll_until, PollOutcome, RetryPolicy};
pub use state::SupervisorState;
