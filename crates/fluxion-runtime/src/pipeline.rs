use crate::entry::{EntryContext, EntryOutcome, FlowEntry};
use async_trait::async_trait;
use fluxion_core::{FlowSpec, FluxionError, NodeConfig, RunTrace};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Context for one step invocation inside a pipeline.
#[derive(Clone)]
pub struct StepContext {
    /// Node name within the flow
    pub node: String,
    pub config: NodeConfig,
    /// Value produced by the previous step (or the run input)
    pub input: Value,
    pub trace: RunTrace,
    pub run_id: String,
}

/// What one step produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Value(Value),
    /// Human review required before the pipeline may continue
    Suspend { text: String },
}

/// One reusable unit of work within a flow, keyed by node kind.
#[async_trait]
pub trait Step: Send + Sync {
    /// Kind tag this step implements (e.g. "LLMCall", "HTTP")
    fn kind(&self) -> &str;

    async fn execute(&self, ctx: StepContext) -> Result<StepOutput, FluxionError>;
}

/// Registry of step implementations keyed by kind.
pub struct StepRegistry {
    steps: HashMap<String, Arc<dyn Step>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
        }
    }

    pub fn register(&mut self, step: Arc<dyn Step>) {
        let kind = step.kind().to_string();
        tracing::info!(%kind, "registering step");
        self.steps.insert(kind, step);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn Step>> {
        self.steps.get(kind).cloned()
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.steps.contains_key(kind)
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Generic interpreter over a spec's `nodes`/`edges`: topologically orders
/// the declared steps and dispatches each to the step registry, threading
/// the produced value linearly through the pipeline.
///
/// Implements the flow entry contract, so callers cannot tell it apart from
/// a hand-written entry: a `HumanApprove` node suspends the run in start
/// mode, and continue mode resumes with the nodes after the approval point.
pub struct PipelineEntry {
    entry_name: String,
    steps: Arc<StepRegistry>,
}

impl PipelineEntry {
    /// Build an interpreter for a spec, or `None` when the spec declares no
    /// nodes or uses a kind with no registered step (the registry then falls
    /// back to the stub entry).
    pub fn try_build(spec: &FlowSpec, steps: Arc<StepRegistry>) -> Option<Self> {
        if spec.nodes.is_empty() {
            return None;
        }
        for node in &spec.nodes {
            if !steps.supports(&node.kind) {
                tracing::warn!(
                    flow_id = %spec.id,
                    node = %node.name,
                    kind = %node.kind,
                    "no step implementation for node kind"
                );
                return None;
            }
        }
        Some(Self {
            entry_name: spec.entry_name().to_string(),
            steps,
        })
    }

    /// Topologically order the nodes and parse each config exactly once.
    fn plan(&self, spec: &FlowSpec) -> Result<Vec<(String, NodeConfig)>, FluxionError> {
        let mut graph = DiGraph::<&str, ()>::new();
        let mut indices = HashMap::new();
        for node in &spec.nodes {
            let idx = graph.add_node(node.name.as_str());
            indices.insert(node.name.as_str(), idx);
        }
        for edge in &spec.edges {
            let from = indices.get(edge.from.as_str()).ok_or_else(|| {
                FluxionError::InvalidSpec(format!("edge from unknown node '{}'", edge.from))
            })?;
            let to = indices.get(edge.to.as_str()).ok_or_else(|| {
                FluxionError::InvalidSpec(format!("edge to unknown node '{}'", edge.to))
            })?;
            graph.add_edge(*from, *to, ());
        }
        let order = toposort(&graph, None)
            .map_err(|_| FluxionError::InvalidSpec("flow graph contains a cycle".into()))?;
        let mut plan = Vec::with_capacity(order.len());
        for idx in order {
            let name = graph[idx];
            let node = spec
                .find_node(name)
                .ok_or_else(|| FluxionError::InvalidSpec(format!("node '{}' vanished", name)))?;
            plan.push((name.to_string(), NodeConfig::parse(node)?));
        }
        Ok(plan)
    }

    async fn run_step(
        &self,
        name: &str,
        config: &NodeConfig,
        current: Value,
        ctx: &EntryContext,
    ) -> Result<StepOutput, FluxionError> {
        let step = self.steps.get(config.kind()).ok_or_else(|| {
            FluxionError::Execution(format!("step for kind '{}' disappeared", config.kind()))
        })?;
        let started = Instant::now();
        let output = step
            .execute(StepContext {
                node: name.to_string(),
                config: config.clone(),
                input: current,
                trace: ctx.trace.clone(),
                run_id: ctx.run_id.clone(),
            })
            .await?;
        if let StepOutput::Value(value) = &output {
            let ms = started.elapsed().as_millis() as u64;
            match config {
                NodeConfig::LlmCall { .. } => ctx.trace.llm_call(name, value.clone(), ms),
                _ => ctx.trace.info(name, value.clone()),
            }
        }
        Ok(output)
    }
}

#[async_trait]
impl FlowEntry for PipelineEntry {
    fn name(&self) -> &str {
        &self.entry_name
    }

    async fn run(&self, input: Value, ctx: EntryContext) -> Result<EntryOutcome, FluxionError> {
        let plan = self.plan(&ctx.spec)?;

        let approved = input
            .get("runId")
            .and_then(Value::as_str)
            .and_then(|_| input.get("approvedText"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let start_at = match &approved {
            Some(approved_text) => {
                // Continue mode: record the approval and resume with the
                // nodes after the approval point.
                let approve_at = plan
                    .iter()
                    .position(|(_, c)| matches!(c, NodeConfig::HumanApprove { .. }))
                    .ok_or_else(|| {
                        FluxionError::InvalidInput(
                            "continuation input for a flow with no approval step".into(),
                        )
                    })?;
                let (approve_node, _) = &plan[approve_at];
                ctx.trace
                    .info(approve_node.clone(), json!({ "approvedText": approved_text }));
                approve_at + 1
            }
            None => 0,
        };

        let mut current = match &approved {
            Some(text) => json!({ "approved": true, "approvedText": text }),
            None => input,
        };

        for (name, config) in &plan[start_at..] {
            match self.run_step(name, config, current, &ctx).await? {
                StepOutput::Value(value) => current = value,
                StepOutput::Suspend { text } => {
                    return Ok(EntryOutcome::PendingApproval { text })
                }
            }
        }

        Ok(EntryOutcome::Done(current))
    }
}
