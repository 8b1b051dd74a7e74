//! Core types for the Fluxion flow run executor
//!
//! This crate provides the data model, error taxonomy, and engine
//! configuration that all other components depend on. It performs no I/O.

mod catalog;
mod config;
mod error;
mod run;
mod spec;
mod trace;
mod truncate;

pub use catalog::{node_kind_catalog, NodeKindInfo, PortInfo};
pub use config::{EngineConfig, DEFAULT_EGRESS_ALLOWLIST};
pub use error::FluxionError;
pub use run::{new_run_id, EventKind, RunEvent, RunRecord, RunStatus};
pub use spec::{parse_version, Edge, FlowSpec, NodeConfig, NodeSpec, PortSchema};
pub use trace::RunTrace;
pub use truncate::{truncate_event_str, truncate_json_strings, truncate_summary, EVENT_STR_MAX, SUMMARY_MAX};

/// Result type for fluxion operations
pub type Result<T> = std::result::Result<T, FluxionError>;
