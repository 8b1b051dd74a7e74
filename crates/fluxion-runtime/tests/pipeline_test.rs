use async_trait::async_trait;
use fluxion_core::{
    Edge, EventKind, FlowSpec, FluxionError, NodeSpec, PortSchema, RunTrace,
};
use fluxion_runtime::{
    EntryContext, EntryOutcome, FlowEntry, PipelineEntry, Step, StepContext, StepOutput,
    StepRegistry,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Scripted model step: uppercases whatever text it is handed.
struct UppercaseLlm;

#[async_trait]
impl Step for UppercaseLlm {
    fn kind(&self) -> &str {
        "LLMCall"
    }

    async fn execute(&self, ctx: StepContext) -> Result<StepOutput, FluxionError> {
        let text = ctx
            .input
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or("seed")
            .to_uppercase();
        Ok(StepOutput::Value(json!({ "text": text })))
    }
}

struct ApproveMarker;

#[async_trait]
impl Step for ApproveMarker {
    fn kind(&self) -> &str {
        "HumanApprove"
    }

    async fn execute(&self, ctx: StepContext) -> Result<StepOutput, FluxionError> {
        let text = ctx
            .input
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(StepOutput::Suspend {
            text: format!("review: {}", text),
        })
    }
}

fn node(kind: &str, name: &str, config: Value) -> NodeSpec {
    NodeSpec {
        kind: kind.to_string(),
        name: name.to_string(),
        inputs: vec![PortSchema {
            name: "input".into(),
            schema: json!({}),
        }],
        outputs: vec![PortSchema {
            name: "output".into(),
            schema: json!({}),
        }],
        config,
    }
}

fn edge(from: &str, to: &str) -> Edge {
    Edge {
        from: from.to_string(),
        out: "output".into(),
        to: to.to_string(),
        into: "input".into(),
    }
}

fn registry() -> Arc<StepRegistry> {
    let mut steps = StepRegistry::new();
    steps.register(Arc::new(UppercaseLlm));
    steps.register(Arc::new(ApproveMarker));
    Arc::new(steps)
}

fn approval_flow() -> FlowSpec {
    let mut spec = FlowSpec::new("review-flow", "0.1.0");
    spec.nodes = vec![
        node("LLMCall", "draft", json!({"model": "sim-1"})),
        node("HumanApprove", "approve", json!({})),
        node("LLMCall", "finalize", json!({"model": "sim-1"})),
    ];
    spec.edges = vec![edge("draft", "approve"), edge("approve", "finalize")];
    spec
}

fn ctx_for(spec: &FlowSpec) -> (EntryContext, RunTrace) {
    let trace = RunTrace::new();
    let ctx = EntryContext {
        spec: Arc::new(spec.clone()),
        run_id: "run-1".into(),
        flow_id: spec.id.clone(),
        trace: trace.clone(),
    };
    (ctx, trace)
}

#[tokio::test]
async fn start_mode_runs_until_the_approval_node_then_suspends() {
    let spec = approval_flow();
    let pipeline = PipelineEntry::try_build(&spec, registry()).unwrap();
    let (ctx, trace) = ctx_for(&spec);

    let outcome = pipeline
        .run(json!({"text": "hello"}), ctx)
        .await
        .unwrap();

    // The registered HumanApprove step produced the review text.
    match outcome {
        EntryOutcome::PendingApproval { text } => assert_eq!(text, "review: HELLO"),
        other => panic!("expected suspension, got {:?}", other),
    }

    // Only the draft step ran; the side-effecting tail did not.
    let events = trace.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::LlmCall);
    assert_eq!(events[0].node, "draft");
}

#[tokio::test]
async fn continue_mode_records_approval_and_runs_the_tail() {
    let spec = approval_flow();
    let pipeline = PipelineEntry::try_build(&spec, registry()).unwrap();
    let (ctx, trace) = ctx_for(&spec);

    let outcome = pipeline
        .run(
            json!({"runId": "run-0", "approvedText": "ship it"}),
            ctx,
        )
        .await
        .unwrap();

    match outcome {
        EntryOutcome::Done(value) => {
            // finalize saw the approved payload, not the original input
            assert_eq!(value["text"], "SEED");
        }
        other => panic!("expected completion, got {:?}", other),
    }

    let events = trace.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::Info);
    assert_eq!(events[0].node, "approve");
    assert_eq!(events[0].data.as_ref().unwrap()["approvedText"], "ship it");
    assert_eq!(events[1].node, "finalize");
}

#[tokio::test]
async fn nodes_execute_in_topological_order() {
    let mut spec = FlowSpec::new("chain", "0.1.0");
    // Declared out of order; edges define the true order b -> a.
    spec.nodes = vec![
        node("LLMCall", "a", json!({"model": "m"})),
        node("LLMCall", "b", json!({"model": "m"})),
    ];
    spec.edges = vec![edge("b", "a")];

    let pipeline = PipelineEntry::try_build(&spec, registry()).unwrap();
    let (ctx, trace) = ctx_for(&spec);
    pipeline.run(json!({"text": "x"}), ctx).await.unwrap();

    let nodes: Vec<_> = trace.events().iter().map(|e| e.node.clone()).collect();
    assert_eq!(nodes, vec!["b", "a"]);
}

#[tokio::test]
async fn cyclic_graphs_are_rejected() {
    let mut spec = FlowSpec::new("loop", "0.1.0");
    spec.nodes = vec![
        node("LLMCall", "a", json!({"model": "m"})),
        node("LLMCall", "b", json!({"model": "m"})),
    ];
    spec.edges = vec![edge("a", "b"), edge("b", "a")];

    let pipeline = PipelineEntry::try_build(&spec, registry()).unwrap();
    let (ctx, _trace) = ctx_for(&spec);
    let err = pipeline.run(json!({}), ctx).await.unwrap_err();
    assert!(matches!(err, FluxionError::InvalidSpec(_)));
    assert!(err.to_string().contains("cycle"));
}

#[tokio::test]
async fn unsupported_node_kinds_prevent_interpretation() {
    let mut spec = FlowSpec::new("storage-flow", "0.1.0");
    spec.nodes = vec![node("Storage", "push", json!({}))];
    assert!(PipelineEntry::try_build(&spec, registry()).is_none());

    let empty = FlowSpec::new("no-nodes", "0.1.0");
    assert!(PipelineEntry::try_build(&empty, registry()).is_none());
}
