//! Local runtime process states

use serde::{Deserialize, Serialize};

/// Lifecycle of a supervised runtime process
///
/// `NotStarted → Spawning → Probing → Healthy → Stopped`, with `Failed`
/// reachable from `Spawning` or `Probing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupervisorState {
    /// Nothing has been launched yet
    NotStarted,

    /// The child process is being launched
    Spawning,

    /// The child is running and the readiness route is being polled
    Probing,

    /// The readiness route answered with a success status
    Healthy,

    /// The child has been terminated
    Stopped,

    /// Launch or readiness failed
    Failed,
}

impl SupervisorState {
    /// Check if the supervisor reached a terminal state (Stopped or Failed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, SupervisorState::Stopped | SupervisorState::Failed)
    }

    /// Check if the runtime is being brought up
    pub fn is_starting(&self) -> bool {
        matches!(self, SupervisorState::Spawning | SupervisorState::Probing)
    }

    /// Check if the runtime can serve requests
    pub fn is_healthy(&self) -> bool {
        matches!(self, SupervisorState::Healthy)
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: SupervisorState) -> bool {
        use SupervisorState::*;
        matches!(
            (self, next),
            (NotStarted, Spawning)
                | (Spawning, Probing)
                | (Spawning, Failed)
                | (Probing, Healthy)
                | (Probing, Failed)
                | (Healthy, Stopped)
                | (NotStarted, Stopped)
        )
    }
}

impl Default for SupervisorState {
    fn default() -> Self {
        SupervisorState::NotStarted
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorState::NotStarted => write!(f, "Not started"),
            SupervisorState::Spawning => write!(f, "Spawning"),
            SupervisorState::Probing => write!(f, "Probing"),
            SupervisorState::Healthy => write!(f, "Healthy"),
            SupervisorState::Stopped => write!(f, "Stopped"),
            SupervisorState::Failed => write!(f, "Failed"),
        }
    }
}
