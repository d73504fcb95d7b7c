//! Logical routes of the runtime backend

use reqwest::Method;

use crate::config::TimeoutClass;

/// A route on the runtime backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Init,
    Chat,
    Context,
    RefreshContext,
    Identity,
    History,
    ClearHistory,
    Flush,
    ValidationStats,
}

impl Route {
    /// Path relative to the backend endpoint
    pub fn path(&self) -> &'static str {
        match self {
            Route::Init => "/init",
            Route::Chat => "/chat",
            Route::Context => "/context",
            Route::RefreshContext => "/context/refresh",
            Route::Identity => "/identity",
            Route::History => "/history",
            Route::ClearHistory => "/history/clear",
            Route::Flush => "/flush",
            Route::ValidationStats => "/stats/validation",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Route::Context | Route::Identity | Route::History | Route::ValidationStats => {
                Method::GET
            }
            Route::Init
            | Route::Chat
            | Route::RefreshContext
            | Route::ClearHistory
            | Route::Flush => Method::POST,
        }
    }

    /// Chat may wait on the LLM and flush on pending saves
    pub fn timeout_class(&self) -> TimeoutClass {
        match self {
            Route::Init => TimeoutClass::Init,
            Route::Chat | Route::Flush => TimeoutClass::Long,
            _ => TimeoutClass::Query,
        }
    }

    /// Prefix of the error message when the call fails
    pub fn failure_label(&self) -> &'static str {
        match self {
            Route::Init => "Failed to initialize runtime",
            Route::Chat => "Chat request failed",
            Route::Context => "Failed to get context",
            Route::RefreshContext => "Failed to refresh context",
            Route::Identity => "Failed to get identity",
            Route::History => "Failed to get history",
            Route::ClearHistory => "Failed to clear history",
            Route::Flush => "Failed to flush",
            Route::ValidationStats => "Failed to get validation stats",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_table() {
        assert_eq!(Route::Init.to_string(), "POST /init");
        assert_eq!(Route::Context.to_string(), "GET /context");
        assert_eq!(Route::RefreshContext.to_string(), "POST /context/refresh");
        assert_eq!(Route::ClearHistory.to_string(), "POST /history/clear");
        assert_eq!(Route::ValidationStats.to_string(), "GET /stats/validation");
    }

    #[test]
    fn test_timeout_classes() {
        assert_eq!(Route::Chat.timeout_class(), TimeoutClass::Long);
        assert_eq!(Route::Flush.timeout_class(), TimeoutClass::Long);
        assert_eq!(Route::Init.timeout_class(), TimeoutClass::Init);
        assert_eq!(Route::Identity.timeout_class(), TimeoutClass::Query);
        assert_eq!(Route::History.timeout_class(), TimeoutClass::Query);
    }
}
