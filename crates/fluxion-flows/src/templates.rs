use fluxion_core::{Edge, FlowSpec, NodeSpec, PortSchema};
use serde_json::json;

fn node(kind: &str, name: &str, config: serde_json::Value) -> NodeSpec {
    NodeSpec {
        kind: kind.to_string(),
        name: name.to_string(),
        inputs: vec![PortSchema {
            name: "input".into(),
            schema: json!({"type": "object"}),
        }],
        outputs: vec![PortSchema {
            name: "output".into(),
            schema: json!({"type": "object"}),
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

/// Seed flow definitions, installable via the CLI `init` command or the
/// flow-init endpoint.
pub fn builtin_flows() -> Vec<FlowSpec> {
    let mut support = FlowSpec::new("support-triage", "0.1.0");
    support.policy = Some("default".into());
    support.entry = Some("generateSupportEmailDraft".into());
    support.nodes = vec![
        node("LLMCall", "classify", json!({"provider": "offline", "model": "sim-1"})),
        node("LLMCall", "rag", json!({"provider": "offline", "model": "sim-1"})),
        node("LLMCall", "fix-plan", json!({"provider": "offline", "model": "sim-1"})),
        node("HumanApprove", "approve", json!({"queue": "support-leads"})),
        node(
            "HTTP",
            "create-issue",
            json!({"url": "https://api.github.com/repos/:org/:repo/issues"}),
        ),
    ];
    support.edges = vec![
        edge("classify", "rag"),
        edge("rag", "fix-plan"),
        edge("fix-plan", "approve"),
        edge("approve", "create-issue"),
    ];

    let mut summarize = FlowSpec::new("code-summarize", "0.1.0");
    summarize.policy = Some("default".into());
    summarize.nodes = vec![
        node(
            "HTTP",
            "repo-ingest",
            json!({"url": "https://api.github.com/repos/:org/:repo/contents"}),
        ),
        node("LLMCall", "summarize", json!({"provider": "offline", "model": "sim-1"})),
        node("LLMCall", "risk-highlights", json!({"provider": "offline", "model": "sim-1"})),
        node("HumanApprove", "approve", json!({"queue": "dev-leads"})),
        node(
            "HTTP",
            "open-pr",
            json!({"url": "https://api.github.com/repos/:org/:repo/pulls"}),
        ),
    ];
    summarize.edges = vec![
        edge("repo-ingest", "summarize"),
        edge("summarize", "risk-highlights"),
        edge("risk-highlights", "approve"),
        edge("approve", "open-pr"),
    ];

    vec![support, summarize]
}
