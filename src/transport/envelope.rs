//! Response bodies of the query routes
//!
//! Each query route wraps its payload in a single top-level key. A missing
//! or falsy payload (`null`, `false`, `0`, `""`, `[]`, `{}`) means "nothing
//! recorded yet".

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::core::{RuntimeError, RuntimeResult};
use crate::types::Message;

use super::routes::Route;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ContextEnvelope {
    pub context: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct IdentityEnvelope {
    pub identity: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StatsEnvelope {
    pub stats: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct HistoryEnvelope {
    pub history: Option<Vec<Message>>,
}

/// Decode an optional payload, treating empty values as absent
pub(crate) fn present<T: DeserializeOwned>(
    route: Route,
    value: Option<Value>,
) -> RuntimeResult<Option<T>> {
    match value {
        None => Ok(None),
        Some(ref value) if is_falsy(value) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| RuntimeError::Decode {
                route: route.path(),
                source,
            }),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
