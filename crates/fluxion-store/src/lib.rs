//! Durable JSON persistence for flow specs and run records
//!
//! One document per flow id, rewritten in full on each append. Acceptable at
//! expected scale; the contract would survive a move to a real append-only
//! log or a database table.

mod flows;
mod runs;

pub use flows::FlowStore;
pub use runs::{RunStore, DEFAULT_LIST_LIMIT};

use fluxion_core::Result;
use std::path::Path;

pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let raw = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, raw).await?;
    Ok(())
}
