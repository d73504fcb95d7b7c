//! Session configuration
//!
//! `RuntimeOptions` is everything the backend needs to know about an
//! agent/user pair, plus the choice between a remote backend and a locally
//! supervised one.

use serde::{Deserialize, Serialize};
use std::env;

use crate::core::{RuntimeError, RuntimeResult};

use super::local::LocalRuntimeConfig;
use super::timeouts::TimeoutPolicy;

/// Default hosted RecallBricks API
pub const DEFAULT_API_URL: &str = "https://recallbricks-api-clean.onrender.com";

/// Environment variable read when no provider credential is passed explicitly
pub const API_KEY_ENV: &str = "RECALLBRICKS_API_KEY";

/// Default cache time-to-live (5 minutes, in milliseconds)
pub const DEFAULT_CACHE_TTL_MS: u64 = 300_000;

/// Default token budget for loaded context
pub const DEFAULT_MAX_CONTEXT_TOKENS: u32 = 4000;

/// LLM provider used by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    Cohere,
    Local,
}

/// RecallBricks service tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Starter,
    Professional,
    Enterprise,
}

/// Where the backend lives
#[derive(Debug, Clone, Default)]
pub enum RuntimeMode {
    /// Talk to the service at `RuntimeOptions::api_url`
    #[default]
    Remote,

    /// Spawn and supervise a local runtime process
    Local(LocalRuntimeConfig),
}

impl RuntimeMode {
    /// Check if this is the locally supervised mode
    pub fn is_local(&self) -> bool {
        matches!(self, RuntimeMode::Local(_))
    }
}

/// Configuration for a runtime session
///
/// Use the builder pattern to configure the session:
///
/// ```ignore
/// let options = RuntimeOptions::new("sales_assistant", "customer_456")
///     .with_llm_provider(LlmProvider::Anthropic)
///     .with_tier(Tier::Professional)
///     .with_cache_ttl(60_000)
///     .with_local_runtime(LocalRuntimeConfig::default());
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Unique identifier for the agent
    pub agent_id: String,

    /// Unique identifier for the user
    pub user_id: String,

    /// Base URL of the remote backend
    pub api_url: String,

    /// LLM provider the backend should use
    pub llm_provider: LlmProvider,

    /// Credential for the LLM provider
    pub llm_api_key: Option<String>,

    /// Model override (provider default when unset)
    pub llm_model: Option<String>,

    /// Service tier
    pub tier: Tier,

    /// Automatically persist conversations
    pub auto_save: bool,

    /// Validate responses against the agent identity
    pub validate_identity: bool,

    /// Cache loaded context on the backend
    pub cache_enabled: bool,

    /// Cache time-to-live in milliseconds
    pub cache_ttl: u64,

    /// Maximum tokens of context loaded per turn
    pub max_context_tokens: u32,

    /// Ask the backend for verbose diagnostics
    pub debug: bool,

    /// Remote or locally supervised backend
    pub mode: RuntimeMode,

    /// Per-call timeouts
    pub timeouts: TimeoutPolicy,
}

impl RuntimeOptions {
    /// Create options with defaults for everything but the agent/user pair
    ///
    /// The provider credential is taken from `RECALLBRICKS_API_KEY` if set.
    pub fn new(agent_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            user_id: user_id.into(),
            api_url: DEFAULT_API_URL.to_string(),
            llm_provider: LlmProvider::default(),
            llm_api_key: env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
            llm_model: None,
            tier: Tier::default(),
            auto_save: true,
            validate_identity: true,
            cache_enabled: true,
            cache_ttl: DEFAULT_CACHE_TTL_MS,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            debug: false,
            mode: RuntimeMode::Remote,
            timeouts: TimeoutPolicy::default(),
        }
    }

    /// Set the remote backend URL
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the LLM provider
    pub fn with_llm_provider(mut self, provider: LlmProvider) -> Self {
        self.llm_provider = provider;
        self
    }

    /// Set the provider credential explicitly
    pub fn with_llm_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.llm_api_key = Some(api_key.into());
        self
    }

    /// Override the model
    pub fn with_llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    /// Set the service tier
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Set whether conversations are saved automatically
    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    /// Set whether responses are validated against the identity
    pub fn with_validate_identity(mut self, validate: bool) -> Self {
        self.validate_identity = validate;
        self
    }

    /// Enable or disable context caching
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Set the cache time-to-live in milliseconds
    pub fn with_cache_ttl(mut self, ttl_ms: u64) -> Self {
        self.cache_ttl = ttl_ms;
        self
    }

    /// Set the context token budget
    pub fn with_max_context_tokens(mut self, tokens: u32) -> Self {
        self.max_context_tokens = tokens;
        self
    }

    /// Enable or disable backend debug output
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Run the backend as a supervised local process
    pub fn with_local_runtime(mut self, config: LocalRuntimeConfig) -> Self {
        self.mode = RuntimeMode::Local(config);
        self
    }

    /// Set the per-call timeouts
    pub fn with_timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Check the invariants a session relies on
    pub fn validate(&self) -> RuntimeResult<()> {
        if self.agent_id.trim().is_empty() {
            return Err(RuntimeError::invalid_config("agent_id must not be empty"));
        }
        if self.user_id.trim().is_empty() {
            return Err(RuntimeError::invalid_config("user_id must not be empty"));
        }
        if !self.mode.is_local() {
            reqwest::Url::parse(&self.api_url).map_err(|e| {
                RuntimeError::invalid_config(format!("invalid api_url '{}': {}", self.api_url, e))
            })?;
        }
        if let RuntimeMode::Local(local) = &self.mode {
            local.validate()?;
        }
        Ok(())
    }

    /// Body of the `/init` handshake
    pub fn init_payload(&self) -> InitPayload<'_> {
        InitPayload {
            agent_id: &self.agent_id,
            user_id: &self.user_id,
            api_url: &self.api_url,
            llm_provider: self.llm_provider,
            llm_api_key: self.llm_api_key.as_deref(),
            llm_model: self.llm_model.as_deref(),
            tier: self.tier,
            auto_save: self.auto_save,
            validate_identity: self.validate_identity,
            cache_enabled: self.cache_enabled,
            cache_ttl: self.cache_ttl,
            max_context_tokens: self.max_context_tokens,
            debug: self.debug,
        }
    }
}

/// Wire shape of the configuration sent to `/init`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload<'a> {
    pub agent_id: &'a str,
    pub user_id: &'a str,
    pub api_url: &'a str,
    pub llm_provider: LlmProvider,
    pub llm_api_key: Option<&'a str>,
    pub llm_model: Option<&'a str>,
    pub tier: Tier,
    pub auto_save: bool,
    pub validate_identity: bool,
    pub cache_enabled: bool,
    #[serde(rename = "cacheTTL")]
    pub cache_ttl: u64,
    pub max_context_tokens: u32,
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that touch process env vars hold this lock
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_api_key_env_fallback() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved = env::var(API_KEY_ENV).ok();

        env::set_var(API_KEY_ENV, "rb-from-env");
        let options = RuntimeOptions::new("a1", "u1");
        assert_eq!(options.llm_api_key.as_deref(), Some("rb-from-env"));

        // An explicit key wins over the environment
        let options = options.with_llm_api_key("sk-explicit");
        assert_eq!(options.llm_api_key.as_deref(), Some("sk-explicit"));
        let value = serde_json::to_value(options.init_payload()).unwrap();
        assert_eq!(value["llmApiKey"], "sk-explicit");

        env::set_var(API_KEY_ENV, "");
        assert!(RuntimeOptions::new("a1", "u1").llm_api_key.is_none());

        env::remove_var(API_KEY_ENV);
        assert!(RuntimeOptions::new("a1", "u1").llm_api_key.is_none());

        if let Some(value) = saved {
            env::set_var(API_KEY_ENV, value);
        }
    }

    #[test]
    fn test_defaults() {
        let options = RuntimeOptions::new("a1", "u1");
        assert_eq!(options.api_url, DEFAULT_API_URL);
        assert_eq!(options.llm_provider, LlmProvider::Anthropic);
        assert_eq!(options.tier, Tier::Starter);
        assert!(options.auto_save);
        assert!(options.validate_identity);
        assert!(options.cache_enabled);
        assert_eq!(options.cache_ttl, 300_000);
        assert_eq!(options.max_context_tokens, 4000);
        assert!(!options.debug);
        assert!(!options.mode.is_local());
    }

    #[test]
    fn test_validate_rejects_empty_ids() {
        let err = RuntimeOptions::new("", "u1").validate().unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidConfig(_)));

        let err = RuntimeOptions::new("a1", "   ").validate().unwrap_err();
        assert!(err.to_string().contains("user_id"));

        assert!(RuntimeOptions::new("a1", "u1").validate().is_ok());
    }

    #[test]
    fn test_validate_remote_url() {
        let err = RuntimeOptions::new("a1", "u1")
            .with_api_url("not a url")
            .validate()
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidConfig(_)));

        // The remote URL is not used in local mode
        let options = RuntimeOptions::new("a1", "u1")
            .with_api_url("")
            .with_local_runtime(LocalRuntimeConfig::default());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_init_payload_wire_names() {
        let options = RuntimeOptions::new("a1", "u1")
            .with_api_url("http://x")
            .with_llm_provider(LlmProvider::OpenAi)
            .with_llm_api_key("sk-test")
            .with_tier(Tier::Enterprise)
            .with_cache_ttl(1000)
            .with_max_context_tokens(2000)
            .with_debug(true);

        let value = serde_json::to_value(options.init_payload()).unwrap();
        assert_eq!(value["agentId"], "a1");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["apiUrl"], "http://x");
        assert_eq!(value["llmProvider"], "openai");
        assert_eq!(value["llmApiKey"], "sk-test");
        assert!(value["llmModel"].is_null());
        assert_eq!(value["tier"], "enterprise");
        assert_eq!(value["autoSave"], true);
        assert_eq!(value["validateIdentity"], true);
        assert_eq!(value["cacheEnabled"], true);
        assert_eq!(value["cacheTTL"], 1000);
        assert_eq!(value["maxContextTokens"], 2000);
        assert_eq!(value["debug"], true);
    }
}
