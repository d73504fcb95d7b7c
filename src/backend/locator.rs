//! Backend location
//!
//! A `BackendLocator` turns configuration into a live endpoint. The session
//! only sees the trait; whether that meant spawning a process is the
//! locator's business.

use async_trait::async_trait;

use crate::config::LocalRuntimeConfig;
use crate::core::{RuntimeError, RuntimeResult};

use super::supervisor::ProcessSupervisor;

/// A resolved, ready backend
#[derive(Debug)]
pub struct LocatedBackend {
    /// Base URL for every subsequent call
    pub endpoint: String,

    /// Present when the backend is a process this session must stop
    pub supervisor: Option<ProcessSupervisor>,
}

impl LocatedBackend {
    /// A backend someone else runs
    pub fn remote(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            supervisor: None,
        }
    }
}

/// Brings a backend online and reports where it lives
#[async_trait]
pub trait BackendLocator: Send + Sync {
    /// Resolve a live endpoint
    async fn locate(&self) -> RuntimeResult<LocatedBackend>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// An already running service at a fixed URL
#[derive(Debug, Clone)]
pub struct RemoteLocator {
    endpoint: String,
}

impl RemoteLocator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl BackendLocator for RemoteLocator {
    async fn locate(&self) -> RuntimeResult<LocatedBackend> {
        if self.endpoint.trim().is_empty() {
            return Err(RuntimeError::invalid_config("remote endpoint must not be empty"));
        }
        Ok(LocatedBackend::remote(self.endpoint.trim_end_matches('/')))
    }

    fn describe(&self) -> String {
        format!("remote {}", self.endpoint)
    }
}

/// A local runtime process spawned and probed on demand
#[derive(Debug, Clone)]
pub struct SupervisedLocator {
    config: LocalRuntimeConfig,
}

impl SupervisedLocator {
    pub fn new(config: LocalRuntimeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BackendLocator for SupervisedLocator {
    async fn locate(&self) -> RuntimeResult<LocatedBackend> {
        let mut supervisor = ProcessSupervisor::new(self.config.clone());
        supervisor.start().await?;

        Ok(LocatedBackend {
            endpoint: supervisor.endpoint(),
            supervisor: Some(supervisor),
        })
    }

    fn describe(&self) -> String {
        format!("local {} on port {}", self.config.program, self.config.port)
    }
}
