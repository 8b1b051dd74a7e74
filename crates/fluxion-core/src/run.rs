use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event kinds emitted during a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Start,
    LlmCall,
    Info,
    Finish,
    Error,
}

/// One immutable fact emitted during a run, ordered by emission time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunEvent {
    pub kind: EventKind,
    /// Which step produced the event
    pub node: String,
    pub ts: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    PendingApproval,
    Error,
}

/// Durable summary of one run attempt. Created exactly once per executor
/// invocation and read-only once written; a continuation after approval is
/// a new record, not a mutation of the suspended one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub spec_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub events: Vec<RunEvent>,
}

impl RunRecord {
    pub fn new(run_id: impl Into<String>, status: RunStatus, spec_version: impl Into<String>) -> Self {
        Self {
            id: run_id.into(),
            status,
            created_at: Utc::now(),
            spec_version: spec_version.into(),
            duration_ms: None,
            input_summary: None,
            output_summary: None,
            error: None,
            events: Vec::new(),
        }
    }
}

/// Fresh opaque run identifier
pub fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}
