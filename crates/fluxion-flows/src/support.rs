use crate::llm::LlmClient;
use async_trait::async_trait;
use fluxion_core::{FluxionError, NodeConfig};
use fluxion_runtime::{run_with_retry, EntryContext, EntryOutcome, FlowEntry, RetryPolicy};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

/// Support ticket triage: classify the issue, draft a reply, suspend for
/// human review, then (on continuation) send the approved reply.
///
/// Stateless across invocations: continue mode carries everything it needs
/// in its input and uses the run id only to correlate its events.
pub struct SupportTriageEntry {
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl SupportTriageEntry {
    pub fn new(client: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    fn model_for(ctx: &EntryContext, node: &str) -> String {
        ctx.spec
            .find_node(node)
            .and_then(|n| NodeConfig::parse(n).ok())
            .and_then(|c| match c {
                NodeConfig::LlmCall { model, .. } => Some(model),
                _ => None,
            })
            .unwrap_or_else(|| "offline".to_string())
    }
}

#[async_trait]
impl FlowEntry for SupportTriageEntry {
    fn name(&self) -> &str {
        "generateSupportEmailDraft"
    }

    async fn run(&self, input: Value, ctx: EntryContext) -> Result<EntryOutcome, FluxionError> {
        // Continue mode only when both fields are present; a stray runId on
        // an otherwise normal payload is a fresh start.
        let continuation = input.get("runId").and_then(Value::as_str).and(
            input.get("approvedText").and_then(Value::as_str),
        );
        if let Some(approved) = continuation {
            tracing::info!(flow_id = %ctx.flow_id, run_id = %ctx.run_id, "sending approved reply");
            ctx.trace
                .info("human-approve", json!({ "approvedText": approved }));
            // Simulated send; a real integration would go through the
            // HTTP step and the egress guard.
            tokio::time::sleep(Duration::from_millis(750)).await;
            ctx.trace
                .info("send-email", json!({ "message": "Email sent (simulated)." }));
            return Ok(EntryOutcome::Done(json!({
                "message": "Email sent successfully (simulated).",
                "approvedText": approved,
            })));
        }

        // Start mode: classify then draft, and hand the draft to a reviewer.
        let subject = input
            .get("subject")
            .and_then(Value::as_str)
            .ok_or_else(|| FluxionError::InvalidInput("missing 'subject'".into()))?;
        let body = input
            .get("body")
            .and_then(Value::as_str)
            .ok_or_else(|| FluxionError::InvalidInput("missing 'body'".into()))?;

        let classify_prompt = format!(
            "Classify the support issue based on its subject and body.\n\n\
Subject: {}\nBody: {}",
            subject, body
        );
        let model = Self::model_for(&ctx, "classify");
        let started = Instant::now();
        let label = run_with_retry(&self.retry, || {
            self.client.complete(&model, &classify_prompt)
        })
        .await?;
        ctx.trace.llm_call(
            "classify",
            json!({ "label": label }),
            started.elapsed().as_millis() as u64,
        );
        tracing::debug!(flow_id = %ctx.flow_id, %label, "classified support issue");

        let draft_prompt = format!(
            "Draft a polite and helpful support email reply.\n\n\
Classification: {}\nIssue Subject: {}\nIssue Body: {}\n\nDraft Email:",
            label, subject, body
        );
        let model = Self::model_for(&ctx, "draft");
        let started = Instant::now();
        let draft = run_with_retry(&self.retry, || self.client.complete(&model, &draft_prompt))
            .await?;
        ctx.trace.llm_call(
            "draft",
            json!({ "draftEmail": draft }),
            started.elapsed().as_millis() as u64,
        );

        // The side-effecting final stage only runs after human review.
        Ok(EntryOutcome::PendingApproval { text: draft })
    }
}
