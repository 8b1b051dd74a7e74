use actix_cors::Cors;
use actix_web::{
    get, post, web, App, HttpResponse, HttpServer, Responder, Result as ActixResult,
};
use fluxion_core::{node_kind_catalog, EngineConfig, FlowSpec, FluxionError};
use fluxion_flows::{builtin_flows, OfflineClient};
use fluxion_runtime::{EgressPolicy, EntryRegistry, RetryPolicy, RunExecutor, StepRegistry};
use fluxion_store::{FlowStore, RunStore};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Application state shared across handlers
struct AppState {
    executor: Arc<RunExecutor>,
    flows: Arc<FlowStore>,
    runs: Arc<RunStore>,
}

/// Request body for starting or continuing a run
#[derive(Debug, Deserialize)]
struct RunRequest {
    #[serde(rename = "flowId")]
    flow_id: Option<String>,
    version: Option<String>,
    input: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

fn err_body(message: impl Into<String>) -> serde_json::Value {
    json!({ "ok": false, "error": message.into() })
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "fluxion"
    }))
}

/// Start or continue a run
#[post("/api/runs")]
async fn start_run(
    data: web::Data<AppState>,
    req: web::Json<RunRequest>,
) -> ActixResult<impl Responder> {
    let req = req.into_inner();
    let flow_id = match req.flow_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => return Ok(HttpResponse::BadRequest().json(err_body("flowId is required"))),
    };
    let input = req.input.unwrap_or_else(|| json!({}));

    match data
        .executor
        .execute(&flow_id, req.version.as_deref(), input)
        .await
    {
        Ok(output) => {
            let mut body = json!({ "ok": true, "output": output.output });
            if let Some(warning) = output.warning {
                body["warning"] = json!(warning);
            }
            Ok(HttpResponse::Ok().json(body))
        }
        Err(FluxionError::FlowNotFound(id)) => Ok(HttpResponse::NotFound()
            .json(err_body(format!("Flow not found: {}", id)))),
        Err(e @ FluxionError::InvalidInput(_)) => {
            Ok(HttpResponse::BadRequest().json(err_body(e.to_string())))
        }
        Err(e) => {
            error!(flow_id = %flow_id, error = %e, "run failed");
            // Only the message crosses the boundary; the error-status
            // record has already been persisted by the executor.
            Ok(HttpResponse::Ok().json(err_body(e.to_string())))
        }
    }
}

/// Run history for one flow, most-recent first
#[get("/api/runs/{flow_id}")]
async fn list_runs(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> ActixResult<impl Responder> {
    let flow_id = path.into_inner();
    match data.runs.list(&flow_id, query.limit).await {
        Ok(runs) => Ok(HttpResponse::Ok().json(json!({ "ok": true, "runs": runs }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(err_body(e.to_string()))),
    }
}

/// List all stored flow specs
#[get("/api/flows")]
async fn list_flows(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    match data.flows.list().await {
        Ok(flows) => Ok(HttpResponse::Ok().json(json!({ "ok": true, "flows": flows }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(err_body(e.to_string()))),
    }
}

/// Save a flow spec (callers bump `version` before saving)
#[post("/api/flows")]
async fn save_flow(
    data: web::Data<AppState>,
    spec: web::Json<FlowSpec>,
) -> ActixResult<impl Responder> {
    let spec = spec.into_inner();
    match data.flows.save(&spec).await {
        Ok(()) => {
            info!(flow_id = %spec.id, version = %spec.version, "saved flow");
            Ok(HttpResponse::Created().json(json!({ "ok": true, "id": spec.id })))
        }
        Err(e @ FluxionError::InvalidSpec(_)) => {
            Ok(HttpResponse::BadRequest().json(err_body(e.to_string())))
        }
        Err(e) => Ok(HttpResponse::InternalServerError().json(err_body(e.to_string()))),
    }
}

/// Get a specific flow spec
#[get("/api/flows/{flow_id}")]
async fn get_flow(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    let flow_id = path.into_inner();
    match data.flows.load(&flow_id).await {
        Ok(Some(spec)) => Ok(HttpResponse::Ok().json(json!({ "ok": true, "flow": spec }))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(err_body(format!("Flow not found: {}", flow_id)))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(err_body(e.to_string()))),
    }
}

/// Seed a built-in flow template
#[post("/api/flows/{flow_id}/init")]
async fn init_flow(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    let flow_id = path.into_inner();
    let template = builtin_flows().into_iter().find(|f| f.id == flow_id);
    match template {
        Some(spec) => match data.flows.save(&spec).await {
            Ok(()) => Ok(HttpResponse::Created().json(json!({ "ok": true, "id": spec.id }))),
            Err(e) => Ok(HttpResponse::InternalServerError().json(err_body(e.to_string()))),
        },
        None => Ok(HttpResponse::NotFound()
            .json(err_body(format!("Unknown flow template: {}", flow_id)))),
    }
}

/// List the node-kind catalog (consumed by the editor)
#[get("/api/nodes")]
async fn list_node_kinds() -> impl Responder {
    HttpResponse::Ok().json(node_kind_catalog())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("starting fluxion server");

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

    let app_state = web::Data::new(AppState {
        executor,
        flows,
        runs,
    });

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:4000".to_string());

    info!("server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .service(health_check)
            .service(start_run)
            .service(list_runs)
            .service(list_flows)
            .service(save_flow)
            .service(get_flow)
            .service(init_flow)
            .service(list_node_kinds)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
