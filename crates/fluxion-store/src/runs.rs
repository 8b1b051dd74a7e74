use crate::{read_json, write_json};
use dashmap::DashMap;
use fluxion_core::{EngineConfig, Result, RunRecord};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// On-disk layout: `{ "runs": [RunRecord, ...] }`, most-recent first.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredRuns {
    runs: Vec<RunRecord>,
}

/// Per-flow, time-ordered persistence of run records.
///
/// Appends to the same flow id are serialized through a per-key async lock
/// so concurrent read-modify-write cycles never drop a record; distinct
/// flow ids proceed fully in parallel. Records are never mutated or removed
/// once appended.
pub struct RunStore {
    runs_dir: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

pub const DEFAULT_LIST_LIMIT: usize = 20;

impl RunStore {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            runs_dir: config.runs_dir(),
            locks: DashMap::new(),
        }
    }

    fn path_for(&self, flow_id: &str) -> PathBuf {
        self.runs_dir.join(format!("{}.json", flow_id))
    }

    fn lock_for(&self, flow_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(flow_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Insert a record at the front of the flow's list and persist the
    /// whole document.
    pub async fn append(&self, flow_id: &str, record: RunRecord) -> Result<()> {
        let lock = self.lock_for(flow_id);
        let _guard = lock.lock().await;
        let path = self.path_for(flow_id);
        let mut stored: StoredRuns = read_json(&path).await?.unwrap_or_default();
        stored.runs.insert(0, record);
        write_json(&path, &stored).await?;
        tracing::debug!(flow_id, total = stored.runs.len(), "appended run record");
        Ok(())
    }

    /// Up to `limit` most-recent records for a flow, empty if none exist.
    pub async fn list(&self, flow_id: &str, limit: Option<usize>) -> Result<Vec<RunRecord>> {
        let stored: StoredRuns = read_json(&self.path_for(flow_id)).await?.unwrap_or_default();
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        Ok(stored.runs.into_iter().take(limit).collect())
    }

    /// Look up one record by run id.
    pub async fn find(&self, flow_id: &str, run_id: &str) -> Result<Option<RunRecord>> {
        let stored: StoredRuns = read_json(&self.path_for(flow_id)).await?.unwrap_or_default();
        Ok(stored.runs.into_iter().find(|r| r.id == run_id))
    }
}
