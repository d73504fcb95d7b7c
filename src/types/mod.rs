//! Value objects exchanged with the runtime backend

mod chat;
mod memory;
mod message;

pub use chat::{ChatMetadata, ChatRequest, ChatResponse};
pub use memory::{AgentIdentity, Memory, MemoryContext, MemoryKind, ValidationStats};
pub use message::{Message, Role};
