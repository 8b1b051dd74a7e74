use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fluxion_core::EngineConfig;
use fluxion_flows::{builtin_flows, OfflineClient};
use fluxion_runtime::{
    EgressPolicy, EntryRegistry, RetryPolicy, RunExecutor, StepRegistry,
};
use fluxion_store::{FlowStore, RunStore};
use serde_json::json;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fluxion")]
#[command(about = "Fluxion flow run executor CLI", long_about = None)]
struct Cli {
    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the built-in flow templates into the flow store
    Init {
        /// Seed only this flow id
        flow_id: Option<String>,
    },

    /// Start a run of a stored flow
    Run {
        flow_id: String,

        /// Input data as a JSON object string
        #[arg(short, long)]
        input: Option<String>,

        /// Advisory spec version to request
        #[arg(long)]
        version: Option<String>,
    },

    /// Continue a run that is awaiting approval
    Resume {
        flow_id: String,

        /// Id of the suspended run
        #[arg(long)]
        run_id: String,

        /// Human-approved content
        #[arg(long)]
        approved_text: String,
    },

    /// List run history for a flow, most-recent first
    Runs {
        flow_id: String,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List stored flow specs
    Flows,
}

struct Engine {
    flows: Arc<FlowStore>,
    runs: Arc<RunStore>,
    executor: Arc<RunExecutor>,
}

fn build_engine() -> Engine {
    let config = EngineConfig::from_env();
    let flows = Arc::new(FlowStore::new(&config));
    let runs = Arc::new(RunStore::new(&config));

    let client = Arc::new(OfflineClient);
    let retry = RetryPolicy::default();
    let policy = EgressPolicy::from_config(&config);

    let mut steps = StepRegistry::new();
    fluxion_flows::register_steps(&mut steps, client.clone(), policy, retry.clone());
    let mut entries = EntryRegistry::new().with_steps(Arc::new(steps));
    fluxion_flows::register_entries(&mut entries, client, retry);

    let executor = Arc::new(RunExecutor::new(
        flows.clone(),
        runs.clone(),
        Arc::new(entries),
    ));
    Engine {
        flows,
        runs,
        executor,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let engine = build_engine();

    match cli.command {
        Commands::Init { flow_id } => init_flows(&engine, flow_id).await?,
        Commands::Run {
            flow_id,
            input,
            version,
        } => {
            let input = match input {
                Some(raw) => serde_json::from_str(&raw)
                    .context("input must be a valid JSON object string")?,
                None => json!({}),
            };
            run_flow(&engine, &flow_id, version.as_deref(), input).await?;
        }
        Commands::Resume {
            flow_id,
            run_id,
            approved_text,
        } => {
            let input = json!({ "runId": run_id, "approvedText": approved_text });
            run_flow(&engine, &flow_id, None, input).await?;
        }
        Commands::Runs { flow_id, limit } => list_runs(&engine, &flow_id, limit).await?,
        Commands::Flows => list_flows(&engine).await?,
    }

    Ok(())
}

async fn init_flows(engine: &Engine, only: Option<String>) -> Result<()> {
    let mut seeded = 0;
    for spec in builtin_flows() {
        if let Some(id) = &only {
            if &spec.id != id {
                continue;
            }
        }
        engine.flows.save(&spec).await?;
        println!("seeded flow '{}' (version {})", spec.id, spec.version);
        seeded += 1;
    }
    if seeded == 0 {
        bail!("no template matched");
    }
    Ok(())
}

async fn run_flow(
    engine: &Engine,
    flow_id: &str,
    version: Option<&str>,
    input: serde_json::Value,
) -> Result<()> {
    match engine.executor.execute(flow_id, version, input).await {
        Ok(output) => {
            if let Some(warning) = &output.warning {
                eprintln!("warning: {}", warning);
            }
            println!("run {} -> {:?}", output.run_id, output.status);
            println!("{}", serde_json::to_string_pretty(&output.output)?);
            Ok(())
        }
        Err(e) => bail!("run failed: {}", e),
    }
}

async fn list_runs(engine: &Engine, flow_id: &str, limit: Option<usize>) -> Result<()> {
    let runs = engine.runs.list(flow_id, limit).await?;
    if runs.is_empty() {
        println!("no runs recorded for '{}'", flow_id);
        return Ok(());
    }
    for record in runs {
        println!(
            "{}  {:?}  {}  {}ms  {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.status,
            record.id,
            record.duration_ms.unwrap_or(0),
            record.error.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn list_flows(engine: &Engine) -> Result<()> {
    let flows = engine.flows.list().await?;
    if flows.is_empty() {
        println!("no flows stored; run `fluxion init` to seed the templates");
        return Ok(());
    }
    for spec in flows {
        println!(
            "{}  v{}  entry={}  nodes={}",
            spec.id,
            spec.version,
            spec.entry_name(),
            spec.nodes.len()
        );
    }
    Ok(())
}
