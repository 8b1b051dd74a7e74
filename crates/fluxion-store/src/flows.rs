use crate::{read_json, write_json};
use fluxion_core::{EngineConfig, FlowSpec, Result};
use std::path::PathBuf;

/// Flow definitions, one JSON document per flow id.
pub struct FlowStore {
    flows_dir: PathBuf,
}

impl FlowStore {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            flows_dir: config.flows_dir(),
        }
    }

    fn path_for(&self, flow_id: &str) -> PathBuf {
        self.flows_dir.join(format!("{}.json", flow_id))
    }

    /// Persist a spec, overwriting any prior stored spec for that id.
    /// Callers are responsible for bumping `version` before saving.
    pub async fn save(&self, spec: &FlowSpec) -> Result<()> {
        spec.validate()?;
        write_json(&self.path_for(&spec.id), spec).await?;
        tracing::debug!(flow_id = %spec.id, version = %spec.version, "saved flow spec");
        Ok(())
    }

    pub async fn load(&self, flow_id: &str) -> Result<Option<FlowSpec>> {
        read_json(&self.path_for(flow_id)).await
    }

    pub async fn list(&self) -> Result<Vec<FlowSpec>> {
        let mut specs = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.flows_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(specs),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(spec) = read_json::<FlowSpec>(&path).await? {
                specs.push(spec);
            }
        }
        specs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(specs)
    }
}
