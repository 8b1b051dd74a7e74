use crate::run::{EventKind, RunEvent};
use crate::truncate::{truncate_event_str, truncate_json_strings};
use chrono::Utc;
use std::sync::{Arc, Mutex};

/// Append-only event sink for one run.
///
/// Cloned into every step of a run; events are timestamped and truncated on
/// append and never rewritten. The collected list becomes the RunRecord's
/// event trace.
#[derive(Clone, Default)]
pub struct RunTrace {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl RunTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event, stamping the emission time and bounding any string
    /// payload to the event limit.
    pub fn append(
        &self,
        kind: EventKind,
        node: impl Into<String>,
        data: Option<serde_json::Value>,
        ms: Option<u64>,
        error: Option<String>,
    ) {
        let event = RunEvent {
            kind,
            node: node.into(),
            ts: Utc::now(),
            data: data.map(truncate_json_strings),
            ms,
            error: error.map(|e| truncate_event_str(&e)),
        };
        self.events.lock().expect("trace lock poisoned").push(event);
    }

    pub fn start(&self, node: impl Into<String>, data: serde_json::Value) {
        self.append(EventKind::Start, node, Some(data), None, None);
    }

    pub fn llm_call(&self, node: impl Into<String>, data: serde_json::Value, ms: u64) {
        self.append(EventKind::LlmCall, node, Some(data), Some(ms), None);
    }

    pub fn info(&self, node: impl Into<String>, data: serde_json::Value) {
        self.append(EventKind::Info, node, Some(data), None, None);
    }

    pub fn finish(&self, node: impl Into<String>, data: serde_json::Value, ms: u64) {
        self.append(EventKind::Finish, node, Some(data), Some(ms), None);
    }

    pub fn error(&self, node: impl Into<String>, message: impl Into<String>) {
        self.append(EventKind::Error, node, None, None, Some(message.into()));
    }

    /// Snapshot the events collected so far, in emission order.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().expect("trace lock poisoned").clone()
    }
}
