//! Standard flow library
//!
//! Step implementations for the built-in node kinds, the LLM client seam,
//! the hand-written support-triage entry, and the seed flow templates.

mod llm;
mod steps;
mod support;
mod templates;

pub use llm::{LlmClient, OfflineClient};
pub use steps::{DecisionStep, HttpStep, HumanApproveStep, LlmCallStep, ParseJsonStep};
pub use support::SupportTriageEntry;
pub use templates::builtin_flows;

use fluxion_runtime::{EgressPolicy, EntryRegistry, RetryPolicy, StepRegistry};
use std::sync::Arc;

/// Register all built-in step implementations with a registry.
pub fn register_steps(
    registry: &mut StepRegistry,
    client: Arc<dyn LlmClient>,
    policy: EgressPolicy,
    retry: RetryPolicy,
) {
    registry.register(Arc::new(LlmCallStep::new(client, retry)));
    registry.register(Arc::new(HttpStep::new(policy)));
    registry.register(Arc::new(HumanApproveStep));
    registry.register(Arc::new(DecisionStep));
    registry.register(Arc::new(ParseJsonStep));
}

/// Register the hand-written flow entries.
pub fn register_entries(
    registry: &mut EntryRegistry,
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
) {
    let support = Arc::new(SupportTriageEntry::new(client, retry));
    registry.register(support.clone());
    registry.register_as("support-triage", support);
}
