//! Local runtime configuration
//!
//! How to launch the runtime server as a child process and how to decide it
//! is ready.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::{RetryPolicy, RuntimeError, RuntimeResult};

/// Default port the local runtime listens on
pub const DEFAULT_PORT: u16 = 3000;

/// Environment variable carrying the port to the child
pub const DEFAULT_PORT_ENV: &str = "PORT";

/// Route polled until the child reports ready
pub const DEFAULT_READINESS_PATH: &str = "/health";

/// Configuration for a supervised local runtime
#[derive(Debug, Clone)]
pub struct LocalRuntimeConfig {
    /// Program to launch
    pub program: String,

    /// Arguments passed to the program
    pub args: Vec<String>,

    /// Working directory (inherits the parent's when unset)
    pub working_dir: Option<PathBuf>,

    /// Extra environment on top of the inherited one
    pub env: HashMap<String, String>,

    /// Host used to reach the child
    pub host: String,

    /// Port the child is told to bind
    pub port: u16,

    /// Name of the variable that carries `port`
    pub port_env: String,

    /// Readiness route, relative to the child's endpoint
    pub readiness_path: String,

    /// Readiness polling budget
    pub probe: RetryPolicy,

    /// Timeout of a single readiness request
    pub probe_timeout: Duration,

    /// How long to wait for a graceful exit before killing
    pub grace_period: Duration,
}

impl LocalRuntimeConfig {
    /// Create a configuration for an arbitrary program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: HashMap::new(),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            port_env: DEFAULT_PORT_ENV.to_string(),
            readiness_path: DEFAULT_READINESS_PATH.to_string(),
            probe: RetryPolicy::default(),
            probe_timeout: Duration::from_secs(1),
            grace_period: Duration::from_secs(5),
        }
    }

    /// Add a single argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Replace the argument list
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable for the child
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the host used to reach the child
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the readiness route
    pub fn with_readiness_path(mut self, path: impl Into<String>) -> Self {
        self.readiness_path = path.into();
        self
    }

    /// Set the readiness polling budget
    pub fn with_probe(mut self, probe: RetryPolicy) -> Self {
        self.probe = probe;
        self
    }

    /// Set the per-request readiness timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the graceful shutdown window
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    /// Base URL of the child once it is up
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Full URL of the readiness route
    pub fn readiness_url(&self) -> String {
        let path = self.readiness_path.trim_start_matches('/');
        format!("{}/{}", self.endpoint(), path)
    }

    /// Check that the child can actually be launched and probed
    pub fn validate(&self) -> RuntimeResult<()> {
        if self.program.trim().is_empty() {
            return Err(RuntimeError::invalid_config("local runtime program must not be empty"));
        }
        if self.port == 0 {
            return Err(RuntimeError::invalid_config("local runtime port must not be 0"));
        }
        if self.probe.max_attempts == 0 {
            return Err(RuntimeError::invalid_config(
                "local runtime needs at least one readiness attempt",
            ));
        }
        Ok(())
    }
}

impl Default for LocalRuntimeConfig {
    /// The bundled Node server
    fn default() -> Self {
        Self::new("node").with_arg("dist/adapters/api/server.js")
    }
}
