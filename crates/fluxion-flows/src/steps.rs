use crate::llm::LlmClient;
use async_trait::async_trait;
use fluxion_core::{FluxionError, NodeConfig};
use fluxion_runtime::{run_with_retry, EgressPolicy, RetryPolicy, Step, StepContext, StepOutput};
use serde_json::{json, Value};
use std::sync::Arc;

/// Model invocation step, wrapped in the retry policy.
pub struct LlmCallStep {
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl LlmCallStep {
    pub fn new(client: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl Step for LlmCallStep {
    fn kind(&self) -> &str {
        "LLMCall"
    }

    async fn execute(&self, ctx: StepContext) -> Result<StepOutput, FluxionError> {
        let model = match &ctx.config {
            NodeConfig::LlmCall { model, .. } => model.clone(),
            other => {
                return Err(FluxionError::Execution(format!(
                    "LLMCall step received {} config",
                    other.kind()
                )))
            }
        };
        let prompt = match ctx.input.get("prompt").and_then(Value::as_str) {
            Some(p) => p.to_string(),
            None => ctx.input.to_string(),
        };
        let text = run_with_retry(&self.retry, || self.client.complete(&model, &prompt)).await?;
        Ok(StepOutput::Value(json!({ "text": text })))
    }
}

/// HTTP fetch step. The egress policy runs before any request is sent.
pub struct HttpStep {
    policy: EgressPolicy,
    client: reqwest::Client,
}

impl HttpStep {
    pub fn new(policy: EgressPolicy) -> Self {
        Self {
            policy,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Step for HttpStep {
    fn kind(&self) -> &str {
        "HTTP"
    }

    async fn execute(&self, ctx: StepContext) -> Result<StepOutput, FluxionError> {
        let url = match &ctx.config {
            NodeConfig::Http { url } => url.clone(),
            other => {
                return Err(FluxionError::Execution(format!(
                    "HTTP step received {} config",
                    other.kind()
                )))
            }
        };
        self.policy.allow_http(&url)?;
        ctx.trace.info(ctx.node.clone(), json!({ "fetching": url }));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FluxionError::Http(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FluxionError::Http(e.to_string()))?;
        Ok(StepOutput::Value(json!({ "status": status, "body": body })))
    }
}

/// Suspension marker: hands the run back to a human reviewer.
pub struct HumanApproveStep;

#[async_trait]
impl Step for HumanApproveStep {
    fn kind(&self) -> &str {
        "HumanApprove"
    }

    async fn execute(&self, ctx: StepContext) -> Result<StepOutput, FluxionError> {
        let text = ["summary", "text", "plan"]
            .iter()
            .find_map(|k| ctx.input.get(k).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| ctx.input.to_string());
        Ok(StepOutput::Suspend { text })
    }
}

/// Maps `{flag: bool}` to `{branch: "yes"|"no"}`.
pub struct DecisionStep;

#[async_trait]
impl Step for DecisionStep {
    fn kind(&self) -> &str {
        "Decision"
    }

    async fn execute(&self, ctx: StepContext) -> Result<StepOutput, FluxionError> {
        let flag = ctx
            .input
            .get("flag")
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                FluxionError::InvalidInput(format!(
                    "Decision node '{}' requires a boolean 'flag' input",
                    ctx.node
                ))
            })?;
        let branch = if flag { "yes" } else { "no" };
        Ok(StepOutput::Value(json!({ "branch": branch })))
    }
}

/// Parses `{text: string}` into `{json: value}`.
pub struct ParseJsonStep;

#[async_trait]
impl Step for ParseJsonStep {
    fn kind(&self) -> &str {
        "ParseJson"
    }

    async fn execute(&self, ctx: StepContext) -> Result<StepOutput, FluxionError> {
        let text = ctx
            .input
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                FluxionError::InvalidInput(format!(
                    "ParseJson node '{}' requires a string 'text' input",
                    ctx.node
                ))
            })?;
        let parsed: Value = serde_json::from_str(text)
            .map_err(|e| FluxionError::InvalidInput(format!("not valid JSON: {}", e)))?;
        Ok(StepOutput::Value(json!({ "json": parsed })))
    }
}
