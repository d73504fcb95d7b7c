pub mod core;
pub mod config;
pub mod types;

// Wire layer
pub mod transport;

// Where the backend lives, and the local process when there is one
pub mod backend;

pub mod session;

// Optional components
pub mod logging;

#[cfg(test)]
mod testing;

pub use crate::config::{LocalRuntimeConfig, RuntimeMode, RuntimeOptions, TimeoutPolicy};
pub use crate::core::{RuntimeError, RuntimeResult, SupervisorState, TransportError};
pub use crate::session::Session;
pub use crate::types::{
    AgentIdentity, ChatResponse, MemoryContext, Message, Role, ValidationStats,
};
