//! Runtime session
//!
//! A `Session` is one logical connection to one backend for one agent/user
//! pair. Construction locates the backend (spawning it if needed) and runs
//! the `/init` handshake; a session that fails either step is never handed
//! out. If the session owns a local runtime process, `close()` and `Drop`
//! share one idempotent stop routine.

use uuid::Uuid;

use crate::backend::{
    BackendLocator, ProcessSupervisor, RemoteLocator, SupervisedLocator,
};
use crate::config::{RuntimeMode, RuntimeOptions};
use crate::core::{RuntimeResult, SupervisorState};
use crate::transport::envelope::{
    present, ContextEnvelope, HistoryEnvelope, IdentityEnvelope, StatsEnvelope,
};
use crate::transport::{Route, RpcClient};
use crate::types::{
    AgentIdentity, ChatRequest, ChatResponse, MemoryContext, Message, ValidationStats,
};

/// Handle to an initialized runtime backend
///
/// Dropping a local session signals the runtime process at once. Inside a
/// tokio runtime the grace period and reaping continue on a background task;
/// outside one, the drop waits out the grace period on the current thread.
/// Use `close()` to wait for the process to be gone.
pub struct Session {
    /// Local id used to correlate log lines
    session_id: String,

    /// Options the backend was initialized with
    options: RuntimeOptions,

    /// Client bound to the resolved endpoint
    client: RpcClient,

    /// Local runtime process, if this session spawned one
    supervisor: Option<ProcessSupervisor>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("agent_id", &self.options.agent_id)
            .field("user_id", &self.options.user_id)
            .field("endpoint", &self.client.base_url())
            .field("supervisor", &self.supervisor)
            .finish()
    }
}

impl Session {
    /// Connect using the mode selected in `options`
    ///
    /// # Example
    ///
    /// ```ignore
    /// let options = RuntimeOptions::new("sales_assistant", "customer_456")
    ///     .with_llm_api_key(std::env::var("ANTHROPIC_API_KEY")?);
    ///
    /// let session = Session::connect(options).await?;
    /// let reply = session.chat("Hi! I'm interested in your premium plan.").await?;
    /// println!("{}", reply.response);
    /// session.close().await?;
    /// ```
    pub async fn connect(options: RuntimeOptions) -> RuntimeResult<Self> {
        match options.mode.clone() {
            RuntimeMode::Remote => {
                let locator = RemoteLocator::new(options.api_url.clone());
                Self::connect_with(options, &locator).await
            }
            RuntimeMode::Local(config) => {
                let locator = SupervisedLocator::new(config);
                Self::connect_with(options, &locator).await
            }
        }
    }

    /// Connect through an explicit locator
    ///
    /// `options.mode` is ignored; the locator decides where the backend is.
    pub async fn connect_with<L>(options: RuntimeOptions, locator: &L) -> RuntimeResult<Self>
    where
        L: BackendLocator + ?Sized,
    {
        options.validate()?;

        let session_id = Uuid::new_v4().to_string();
        tracing::info!(
            "[Session] {} connecting agent '{}' for user '{}' via {}",
            session_id,
            options.agent_id,
            options.user_id,
            locator.describe()
        );

        let located = locator.locate().await?;
        let session = Self {
            session_id,
            client: RpcClient::new(located.endpoint, options.timeouts),
            options,
            supervisor: located.supervisor,
        };

        if let Err(e) = session.initialize().await {
            tracing::error!("[Session] {} init failed: {}", session.session_id, e);
            if let Err(stop_err) = session.close().await {
                tracing::warn!(
                    "[Session] {} failed to stop local runtime after init failure: {}",
                    session.session_id,
                    stop_err
                );
            }
            return Err(e);
        }

        tracing::info!(
            "[Session] {} ready at {}",
            session.session_id,
            session.endpoint()
        );
        Ok(session)
    }

    async fn initialize(&self) -> RuntimeResult<()> {
        self.client
            .send_with(Route::Init, &self.options.init_payload())
            .await
    }

    /// Local id of this session
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Options the backend was initialized with
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Resolved backend endpoint
    pub fn endpoint(&self) -> &str {
        self.client.base_url()
    }

    /// Check if this session owns a local runtime process
    pub fn is_local(&self) -> bool {
        self.supervisor.is_some()
    }

    /// State of the local runtime process, `None` for remote sessions
    pub fn backend_state(&self) -> Option<SupervisorState> {
        self.supervisor.as_ref().map(|s| s.state())
    }

    /// Pid of the local runtime process, `None` for remote sessions
    pub fn backend_pid(&self) -> Option<u32> {
        self.supervisor.as_ref().and_then(|s| s.pid())
    }

    /// Send a chat message and get a contextual response
    pub async fn chat(&self, message: &str) -> RuntimeResult<ChatResponse> {
        self.chat_with_history(message, &[]).await
    }

    /// Send a chat message along with prior turns
    pub async fn chat_with_history(
        &self,
        message: &str,
        history: &[Message],
    ) -> RuntimeResult<ChatResponse> {
        tracing::debug!(
            "[Session] {} chat ({} chars, {} history messages)",
            self.session_id,
            message.len(),
            history.len()
        );

        let response: ChatResponse = self
            .client
            .call_with(Route::Chat, &ChatRequest::new(message, history))
            .await?;

        tracing::debug!(
            "[Session] {} chat answered by {}/{} (tokens: {:?})",
            self.session_id,
            response.metadata.provider,
            response.metadata.model,
            response.metadata.tokens_used
        );
        Ok(response)
    }

    /// Current memory context, `None` if nothing is recorded yet
    pub async fn get_context(&self) -> RuntimeResult<Option<MemoryContext>> {
        let envelope: ContextEnvelope = self.client.call(Route::Context).await?;
        present(Route::Context, envelope.context)
    }

    /// Agent identity, `None` if the backend has none
    pub async fn get_identity(&self) -> RuntimeResult<Option<AgentIdentity>> {
        let envelope: IdentityEnvelope = self.client.call(Route::Identity).await?;
        present(Route::Identity, envelope.identity)
    }

    /// Refresh memory context from the API, bypassing the backend cache
    pub async fn refresh_context(&self) -> RuntimeResult<()> {
        self.client.send(Route::RefreshContext).await
    }

    /// Conversation history for this session, oldest first
    pub async fn get_conversation_history(&self) -> RuntimeResult<Vec<Message>> {
        let envelope: HistoryEnvelope = self.client.call(Route::History).await?;
        Ok(envelope.history.unwrap_or_default())
    }

    /// Clear the conversation history for this session
    pub async fn clear_conversation_history(&self) -> RuntimeResult<()> {
        self.client.send(Route::ClearHistory).await
    }

    /// Wait for all pending saves to complete
    pub async fn flush(&self) -> RuntimeResult<()> {
        tracing::debug!("[Session] {} flushing", self.session_id);
        self.client.send(Route::Flush).await
    }

    /// Identity validation statistics, `None` if none were collected
    pub async fn get_validation_stats(&self) -> RuntimeResult<Option<ValidationStats>> {
        let envelope: StatsEnvelope = self.client.call(Route::ValidationStats).await?;
        present(Route::ValidationStats, envelope.stats)
    }

    /// Stop the local runtime process, if any
    ///
    /// Returns `true` if this call stopped the process. Remote sessions and
    /// repeated calls return `false`. Dropping the session stops the process
    /// too, so calling this is only needed to observe errors or to stop early.
    pub async fn close(&self) -> RuntimeResult<bool> {
        let Some(supervisor) = self.supervisor.as_ref() else {
            return Ok(false);
        };

        let stopped = supervisor.stop().await?;
        if stopped {
            tracing::info!("[Session] {} stopped local runtime", self.session_id);
        }
        Ok(stopped)
    }
}
