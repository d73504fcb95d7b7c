//! Per-call timeout classes

use std::time::Duration;

/// Which timeout a call is subject to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    /// The `/init` handshake
    Init,
    /// Plain reads and cheap writes
    Query,
    /// Chat turns and flushes, which may wait on the LLM or on persistence
    Long,
}

/// Timeouts applied to backend calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub init: Duration,
    pub query: Duration,
    pub long: Duration,
}

impl TimeoutPolicy {
    /// Timeout for a call of the given class
    pub fn for_class(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Init => self.init,
            TimeoutClass::Query => self.query,
            TimeoutClass::Long => self.long,
        }
    }

    /// Use the same timeout for every class
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            init: timeout,
            query: timeout,
            long: timeout,
        }
    }

    /// Set the init timeout
    pub fn with_init(mut self, timeout: Duration) -> Self {
        self.init = timeout;
        self
    }

    /// Set the query timeout
    pub fn with_query(mut self, timeout: Duration) -> Self {
        self.query = timeout;
        self
    }

    /// Set the timeout for chat and flush
    pub fn with_long(mut self, timeout: Duration) -> Self {
        self.long = timeout;
        self
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            init: Duration::from_secs(30),
            query: Duration::from_secs(30),
            long: Duration::from_secs(60),
        }
    }
}
