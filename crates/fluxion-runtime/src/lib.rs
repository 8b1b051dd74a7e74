//! Flow run execution runtime
//!
//! This crate provides the egress policy guard, the retry wrapper, the flow
//! entry contract and registry, the generic pipeline interpreter, and the
//! run executor that turns one invocation into one durable RunRecord.

mod entry;
mod executor;
mod guard;
mod pipeline;
mod retry;

pub use entry::{EntryContext, EntryOutcome, EntryRegistry, FlowEntry, StubEntry};
pub use executor::{RunExecutor, RunOutput};
pub use guard::EgressPolicy;
pub use pipeline::{PipelineEntry, Step, StepContext, StepOutput, StepRegistry};
pub use retry::{run_with_retry, RetryPolicy};
