use crate::FluxionError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete flow definition, immutable per version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowSpec {
    pub id: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    /// Overrides which flow entry implements this flow; defaults to `id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl FlowSpec {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            policy: None,
            entry: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Name of the flow entry implementing this spec
    pub fn entry_name(&self) -> &str {
        self.entry.as_deref().unwrap_or(&self.id)
    }

    pub fn find_node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Check the spec invariants: non-empty id, numeric MAJOR.MINOR.PATCH
    /// version, node names unique within the flow.
    pub fn validate(&self) -> Result<(), FluxionError> {
        if self.id.trim().is_empty() {
            return Err(FluxionError::InvalidSpec("flow spec requires an id".into()));
        }
        parse_version(&self.version).ok_or_else(|| {
            FluxionError::InvalidSpec(format!(
                "version '{}' is not a MAJOR.MINOR.PATCH semantic version",
                self.version
            ))
        })?;
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.name.as_str()) {
                return Err(FluxionError::InvalidSpec(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
        }
        for edge in &self.edges {
            if self.find_node(&edge.from).is_none() || self.find_node(&edge.to).is_none() {
                return Err(FluxionError::InvalidSpec(format!(
                    "edge references unknown node: {} -> {}",
                    edge.from, edge.to
                )));
            }
        }
        Ok(())
    }
}

/// Parse `MAJOR.MINOR.PATCH` into its numeric segments.
pub fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

/// One step's declared shape within a flow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSpec {
    /// Tag selecting a step implementation (e.g. "LLMCall", "HTTP")
    pub kind: String,
    /// Unique within the flow
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<PortSchema>,
    #[serde(default)]
    pub outputs: Vec<PortSchema>,
    /// Raw config bag as authored in the editor; parsed into a typed
    /// [`NodeConfig`] once at flow-load time
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Named port with a JSON-schema-like description
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortSchema {
    pub name: String,
    #[serde(default)]
    pub schema: serde_json::Value,
}

/// Adjacency entry between node ports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub from: String,
    pub out: String,
    pub to: String,
    #[serde(rename = "in")]
    pub into: String,
}

/// Validated, per-kind step configuration
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    LlmCall { provider: String, model: String },
    Http { url: String },
    HumanApprove { queue: Option<String> },
    Decision,
    ParseJson,
}

impl NodeConfig {
    /// Parse a node's raw config bag into its typed form. Called once when
    /// a pipeline is built, never per step invocation.
    pub fn parse(node: &NodeSpec) -> Result<Self, FluxionError> {
        let get_str = |key: &str| {
            node.config
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };
        match node.kind.as_str() {
            "LLMCall" => Ok(NodeConfig::LlmCall {
                provider: get_str("provider").unwrap_or_else(|| "offline".into()),
                model: get_str("model").ok_or_else(|| {
                    FluxionError::InvalidSpec(format!(
                        "LLMCall node '{}' requires config.model",
                        node.name
                    ))
                })?,
            }),
            "HTTP" => Ok(NodeConfig::Http {
                url: get_str("url").ok_or_else(|| {
                    FluxionError::InvalidSpec(format!(
                        "HTTP node '{}' requires config.url",
                        node.name
                    ))
                })?,
            }),
            "HumanApprove" => Ok(NodeConfig::HumanApprove {
                queue: get_str("queue"),
            }),
            "Decision" => Ok(NodeConfig::Decision),
            "ParseJson" => Ok(NodeConfig::ParseJson),
            other => Err(FluxionError::InvalidSpec(format!(
                "unknown node kind '{}' on node '{}'",
                other, node.name
            ))),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NodeConfig::LlmCall { .. } => "LLMCall",
            NodeConfig::Http { .. } => "HTTP",
            NodeConfig::HumanApprove { .. } => "HumanApprove",
            NodeConfig::Decision => "Decision",
            NodeConfig::ParseJson => "ParseJson",
        }
    }
}
