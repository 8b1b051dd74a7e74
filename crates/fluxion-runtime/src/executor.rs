use crate::entry::{EntryContext, EntryOutcome, EntryRegistry};
use fluxion_core::{
    new_run_id, truncate_event_str, truncate_summary, FluxionError, RunRecord, RunStatus,
    RunTrace,
};
use fluxion_store::{FlowStore, RunStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Result of one run invocation, returned to the transport layer.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub run_id: String,
    pub status: RunStatus,
    pub output: Value,
    /// Advisory notice (e.g. version mismatch); never a failure
    pub warning: Option<String>,
}

/// Turns one call into one durable RunRecord.
///
/// The executor is the single point that converts any propagated error into
/// both a returned failure and a persisted error-status record; no error
/// escapes without being recorded once. The only calls that write no record
/// are an unknown flow id (no spec context exists) and malformed input
/// rejected before the run starts.
pub struct RunExecutor {
    flows: Arc<FlowStore>,
    runs: Arc<RunStore>,
    entries: Arc<EntryRegistry>,
}

impl RunExecutor {
    pub fn new(flows: Arc<FlowStore>, runs: Arc<RunStore>, entries: Arc<EntryRegistry>) -> Self {
        Self {
            flows,
            runs,
            entries,
        }
    }

    /// Execute one run of `flow_id` against `input`, persisting exactly one
    /// RunRecord. A continuation after approval is a fresh invocation
    /// producing its own record.
    pub async fn execute(
        &self,
        flow_id: &str,
        version: Option<&str>,
        input: Value,
    ) -> Result<RunOutput, FluxionError> {
        if !input.is_object() {
            return Err(FluxionError::InvalidInput(
                "run input must be a JSON object".into(),
            ));
        }

        let spec = self
            .flows
            .load(flow_id)
            .await?
            .ok_or_else(|| FluxionError::FlowNotFound(flow_id.to_string()))?;

        // Spec versioning is advisory: the stored version always runs.
        let warning = match version {
            Some(requested) if requested != spec.version => {
                warn!(
                    flow_id,
                    requested, stored = %spec.version,
                    "requested version differs from stored version"
                );
                Some(format!(
                    "requested version {} but stored version is {}; ran {}",
                    requested, spec.version, spec.version
                ))
            }
            _ => None,
        };

        // A continuation (runId plus approved content) must reference a run
        // this flow actually suspended; a runId alone is not a continuation.
        let continuation = input
            .get("runId")
            .and_then(Value::as_str)
            .filter(|_| input.get("approvedText").and_then(Value::as_str).is_some());
        if let Some(prior_run_id) = continuation {
            let prior = self.runs.find(flow_id, prior_run_id).await?;
            match prior {
                Some(record) if record.status == RunStatus::PendingApproval => {}
                Some(_) => {
                    return Err(FluxionError::InvalidInput(format!(
                        "run {} is not awaiting approval",
                        prior_run_id
                    )))
                }
                None => {
                    return Err(FluxionError::InvalidInput(format!(
                        "no pending run {} for flow {}",
                        prior_run_id, flow_id
                    )))
                }
            }
        }

        let entry = self.entries.resolve(&spec);
        let run_id = new_run_id();
        let trace = RunTrace::new();
        let ctx = EntryContext {
            spec: Arc::new(spec.clone()),
            run_id: run_id.clone(),
            flow_id: flow_id.to_string(),
            trace: trace.clone(),
        };

        info!(flow_id, run_id = %run_id, entry = %entry.name(), "starting run");
        trace.start("run", input.clone());
        let started = Instant::now();

        let result = entry.run(input.clone(), ctx).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let mut record = RunRecord::new(run_id.clone(), RunStatus::Ok, spec.version.clone());
        record.duration_ms = Some(duration_ms);
        record.input_summary = Some(truncate_summary(&input.to_string()));

        match result {
            Ok(outcome) => {
                let (status, output) = match outcome {
                    EntryOutcome::Done(value) => (RunStatus::Ok, value),
                    EntryOutcome::PendingApproval { text } => (
                        RunStatus::PendingApproval,
                        json!({
                            "status": "pending_approval",
                            "text": text,
                            "runId": run_id,
                            "flowId": flow_id,
                        }),
                    ),
                };
                trace.finish("run", output.clone(), duration_ms);
                record.status = status;
                record.output_summary = Some(truncate_summary(&output.to_string()));
                record.events = trace.events();
                self.runs.append(flow_id, record).await?;
                info!(flow_id, run_id = %run_id, ?status, duration_ms, "run finished");
                Ok(RunOutput {
                    run_id,
                    status,
                    output,
                    warning,
                })
            }
            Err(e) => {
                let message = e.to_string();
                error!(flow_id, run_id = %run_id, error = %message, "run failed");
                trace.error("run", message.clone());
                record.status = RunStatus::Error;
                record.error = Some(truncate_event_str(&message));
                record.events = trace.events();
                self.runs.append(flow_id, record).await?;
                Err(e)
            }
        }
    }
}
