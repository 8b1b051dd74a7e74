use serde::Serialize;
use serde_json::json;

/// Port shape advertised to the editor for one node kind
#[derive(Debug, Clone, Serialize)]
pub struct PortInfo {
    pub name: String,
    pub schema: serde_json::Value,
}

/// Catalog entry describing one reusable step implementation. Consumed by
/// the visual editor only; the executor never reads this.
#[derive(Debug, Clone, Serialize)]
pub struct NodeKindInfo {
    pub kind: String,
    pub description: String,
    pub inputs: Vec<PortInfo>,
    pub outputs: Vec<PortInfo>,
    pub default_config: serde_json::Value,
}

fn port(name: &str, schema: serde_json::Value) -> PortInfo {
    PortInfo {
        name: name.to_string(),
        schema,
    }
}

/// The fixed registry of node kinds and their default shapes.
pub fn node_kind_catalog() -> Vec<NodeKindInfo> {
    vec![
        NodeKindInfo {
            kind: "LLMCall".into(),
            description: "Call a language model with a prompt".into(),
            inputs: vec![port("input", json!({"type": "object"}))],
            outputs: vec![port("output", json!({"type": "object"}))],
            default_config: json!({"provider": "offline", "model": "sim-1"}),
        },
        NodeKindInfo {
            kind: "HTTP".into(),
            description: "Fetch a URL (egress policy enforced)".into(),
            inputs: vec![port("input", json!({"type": "object"}))],
            outputs: vec![port("output", json!({
                "type": "object",
                "properties": {"status": {"type": "number"}, "body": {"type": "string"}}
            }))],
            default_config: json!({"url": ""}),
        },
        NodeKindInfo {
            kind: "HumanApprove".into(),
            description: "Suspend the run pending human review".into(),
            inputs: vec![port("input", json!({"type": "object"}))],
            outputs: vec![port("output", json!({
                "type": "object",
                "properties": {"approved": {"type": "boolean"}},
                "required": ["approved"]
            }))],
            default_config: json!({"queue": null}),
        },
        NodeKindInfo {
            kind: "Decision".into(),
            description: "Branch on a boolean flag".into(),
            inputs: vec![port("input", json!({
                "type": "object",
                "properties": {"flag": {"type": "boolean"}},
                "required": ["flag"]
            }))],
            outputs: vec![port("output", json!({
                "type": "object",
                "properties": {"branch": {"enum": ["yes", "no"]}}
            }))],
            default_config: json!({}),
        },
        NodeKindInfo {
            kind: "ParseJson".into(),
            description: "Parse a JSON string into a value".into(),
            inputs: vec![port("input", json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            }))],
            outputs: vec![port("output", json!({"type": "object"}))],
            default_config: json!({}),
        },
    ]
}
