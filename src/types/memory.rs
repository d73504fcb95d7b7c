//! Read-only snapshots returned by the backend
//!
//! Memory context, agent identity and identity-validation statistics. None of
//! these are ever sent back; they are point-in-time views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Kind of a stored memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Conversation,
    Fact,
    Observation,
    Insight,
}

/// A memory entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    pub importance: f64,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Memory {
    /// Parse `timestamp` as RFC 3339
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// Check if the memory carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }
}

/// Memory context for an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryContext {
    pub recent_memories: Vec<Memory>,
    pub relevant_memories: Vec<Memory>,
    pub predicted_context: Vec<String>,
    pub total_memories: u64,
    pub last_updated: String,
}

impl MemoryContext {
    /// Parse `last_updated` as RFC 3339
    pub fn last_updated_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.last_updated)
    }

    /// Recent and relevant memories, recent first
    pub fn memories(&self) -> impl Iterator<Item = &Memory> {
        self.recent_memories.iter().chain(self.relevant_memories.iter())
    }
}

/// Agent identity and behavioral rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub id: String,
    pub name: String,
    pub purpose: String,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: String,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: String,
}

/// Identity validation statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total: u64,
    #[serde(default)]
    pub by_type: HashMap<String, u64>,
    #[serde(default)]
    pub by_severity: HashMap<String, u64>,
}

impl ValidationStats {
    /// Violations recorded for one severity level
    pub fn severity(&self, level: &str) -> u64 {
        self.by_severity.get(level).copied().unwrap_or(0)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
