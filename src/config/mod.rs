//! Configuration for runtime sessions
//!
//! - `RuntimeOptions` - agent/user pair, backend flags, mode selector
//! - `LocalRuntimeConfig` - how to launch and probe a local runtime process
//! - `TimeoutPolicy` - per-call timeouts

mod local;
mod options;
mod timeouts;

pub use local::{LocalRuntimeConfig, DEFAULT_PORT, DEFAULT_PORT_ENV, DEFAULT_READINESS_PATH};
pub use options::{
    InitPayload, LlmProvider, RuntimeMode, RuntimeOptions, Tier, API_KEY_ENV, DEFAULT_API_URL,
    DEFAULT_CACHE_TTL_MS, DEFAULT_MAX_CONTEXT_TOKENS,
};
pub use timeouts::{TimeoutClass, TimeoutPolicy};
