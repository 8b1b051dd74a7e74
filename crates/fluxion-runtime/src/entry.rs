use crate::pipeline::{PipelineEntry, StepRegistry};
use async_trait::async_trait;
use fluxion_core::{FlowSpec, FluxionError, RunTrace};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Context handed to a flow entry for one invocation.
#[derive(Clone)]
pub struct EntryContext {
    /// The originating flow spec
    pub spec: Arc<FlowSpec>,
    pub run_id: String,
    pub flow_id: String,
    /// Append callback for emitting run events
    pub trace: RunTrace,
}

/// What an entry invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    /// Terminal result, returned to the caller as-is
    Done(Value),
    /// The pipeline requires human review before its side-effecting final
    /// stage; the caller re-invokes with the approved content and the run id
    PendingApproval { text: String },
}

/// The per-flow unit of business logic: an ordered pipeline of steps behind
/// one callable contract.
///
/// An entry may be invoked in start mode (primary payload) or continue mode
/// (`runId` + approved content), disambiguated purely by the input shape.
/// Entries never swallow errors; anything unhandled propagates to the run
/// executor, which converts it into an error-status record.
#[async_trait]
pub trait FlowEntry: Send + Sync {
    /// Name this entry is registered under
    fn name(&self) -> &str;

    async fn run(&self, input: Value, ctx: EntryContext) -> Result<EntryOutcome, FluxionError>;
}

/// Graceful-degradation entry used when a spec's declared entry has no
/// registered implementation. Never fails; yields a normal `ok` record.
pub struct StubEntry {
    entry_name: String,
}

impl StubEntry {
    pub fn new(entry_name: impl Into<String>) -> Self {
        Self {
            entry_name: entry_name.into(),
        }
    }
}

#[async_trait]
impl FlowEntry for StubEntry {
    fn name(&self) -> &str {
        &self.entry_name
    }

    async fn run(&self, input: Value, _ctx: EntryContext) -> Result<EntryOutcome, FluxionError> {
        Ok(EntryOutcome::Done(json!({
            "message": format!("Flow entry '{}' not implemented.", self.entry_name),
            "receivedInput": input,
        })))
    }
}

/// Registry of flow entries keyed by name, with a pipeline-interpreter
/// fallback for specs whose node kinds are all supported by the step
/// registry, and a stub fallback for everything else.
pub struct EntryRegistry {
    entries: HashMap<String, Arc<dyn FlowEntry>>,
    steps: Option<Arc<StepRegistry>>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            steps: None,
        }
    }

    /// Attach a step registry so unregistered flows with known node kinds
    /// run through the generic pipeline interpreter.
    pub fn with_steps(mut self, steps: Arc<StepRegistry>) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn register(&mut self, entry: Arc<dyn FlowEntry>) {
        let name = entry.name().to_string();
        tracing::info!(entry = %name, "registering flow entry");
        self.entries.insert(name, entry);
    }

    /// Register the same entry under an additional name.
    pub fn register_as(&mut self, name: impl Into<String>, entry: Arc<dyn FlowEntry>) {
        self.entries.insert(name.into(), entry);
    }

    /// Resolve the entry for a spec. Resolution never fails: an explicit
    /// registration wins, then the pipeline interpreter if every declared
    /// node kind has a step implementation, then the stub.
    pub fn resolve(&self, spec: &FlowSpec) -> Arc<dyn FlowEntry> {
        let name = spec.entry_name();
        if let Some(entry) = self.entries.get(name) {
            return entry.clone();
        }
        if let Some(steps) = &self.steps {
            if let Some(pipeline) = PipelineEntry::try_build(spec, steps.clone()) {
                return Arc::new(pipeline);
            }
        }
        tracing::warn!(entry = %name, "no entry resolver registered, using stub");
        Arc::new(StubEntry::new(name))
    }
}

impl Default for EntryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
