use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use axum::{
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nimbus_orchestrator::config::OrchestratorConfig;
use nimbus_orchestrator::executors::{ExecutionContext, ExecutionRecords};
use nimbus_orchestrator::graphql::{build_schema, OrchestratorSchema};
use nimbus_orchestrator::plan::{build_plan, BuildPlanInput, FeatureFlags};
use nimbus_orchestrator::runner::PlanRunner;
use nimbus_orchestrator::state::AppState;

use nimbus_core::coordination::mock::MockCoordinationStore;
use nimbus_core::coordination::CoordinationStore;
use nimbus_core::model::{ClusterRole, PackageRef, Server, UpdateServer};
use nimbus_core::operator::mock::MockClusterOperator;
use nimbus_core::operator::{ClusterOperator, Site};

#[derive(Clone)]
struct RouterState {
    schema: OrchestratorSchema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = OrchestratorConfig::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting nimbus-orchestrator for cluster {}", config.cluster_name);

    let cancel = CancellationToken::new();
    let config = Arc::new(config);

    // The Cluster Operator and coordination store are external systems
    // this crate only consumes (§4.F/§6); wiring the real Kubernetes/etcd
    // clients is out of scope here, so the in-memory mocks stand in.
    let lead_master = Server::new("i-lead", "master-0", "10.0.0.1", ClusterRole::Master);
    let operator: Arc<dyn ClusterOperator> = Arc::new(MockClusterOperator::new(Site {
        servers: vec![lead_master.clone()],
    }));
    let coordination: Arc<dyn CoordinationStore> = Arc::new(MockCoordinationStore::new());

    let installed = PackageRef {
        name: "nimbus-runtime".into(),
        version: "1.0.0".into(),
    };
    let update = UpdateServer {
        server: lead_master.clone(),
        installed_runtime: installed.clone(),
        update_runtime: None,
        update_config: None,
        installed_teleport: installed.clone(),
        update_teleport: None,
    };

    let plan = build_plan(BuildPlanInput {
        operation_id: "bootstrap-op".into(),
        cluster_name: config.cluster_name.clone(),
        installed_app: "app-1.0.0".into(),
        update_app: "app-1.0.0".into(),
        inventory: vec![lead_master.clone()],
        lead_master: lead_master.clone(),
        flags: FeatureFlags::default(),
        num_parallel: config.parallelism.num_parallel,
        parallel_workers: config.parallelism.parallel_workers,
        bootstrap_packages: vec![],
        updates: vec![update],
        runtime_packages: vec![],
        app_package: installed,
        dns_package: None,
        trusted_clusters: vec![],
        endpoints_timeout_secs: 60,
    })
    .context("failed to build upgrade plan")?;

    let ctx = ExecutionContext {
        cluster_name: config.cluster_name.clone(),
        operation_id: plan.operation_id.clone(),
        lead_master,
        operator,
        coordination,
        drain_timeout: Duration::from_secs(config.timeouts.drain_timeout_secs),
        etcd_step_timeout: Duration::from_secs(config.timeouts.etcd_step_timeout_secs),
        election_retry_budget: Duration::from_secs(config.timeouts.election_retry_budget_secs),
        election_retry_interval: Duration::from_secs(config.timeouts.election_retry_interval_secs),
        transient_retry_budget: Duration::from_secs(config.timeouts.transient_retry_budget_secs),
        records: Arc::new(ExecutionRecords::default()),
        cancel: cancel.clone(),
    };

    let store_path = PathBuf::from(format!("/var/lib/nimbus/{}.plan.json", config.cluster_name));
    let runner = Arc::new(PlanRunner::load_or_new(plan, ctx, store_path).await?);

    let app_state = AppState::new(config.clone(), runner.clone());
    let schema = build_schema(app_state);
    let router_state = RouterState { schema };
    let app = build_router(router_state);

    let addr: std::net::SocketAddr = config
        .graphql
        .bind_address
        .parse()
        .context("invalid graphql bind address")?;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind graphql listener")?;

    info!("GraphQL observability API listening on http://{}/graphql", addr);

    let runner_handle = {
        let runner = runner.clone();
        tokio::spawn(async move { runner.run().await })
    };

    tokio::select! {
        result = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()) => {
            result.context("graphql server error")?;
        }
        _ = cancel.cancelled() => {}
    }

    cancel.cancel();
    match runner_handle.await {
        Ok(Ok(())) => info!("plan run completed"),
        Ok(Err(e)) => tracing::error!(error = %e, "plan run failed"),
        Err(e) => tracing::error!(error = %e, "plan runner task panicked"),
    }

    info!("nimbus-orchestrator shutdown complete");
    Ok(())
}

fn build_router(state: RouterState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/graphql", post(graphql_handler))
        .route_service("/ws", GraphQLSubscription::new(state.schema.clone()))
        .route("/", get(root_handler))
        .with_state(state)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "nimbus-orchestrator",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": { "graphql": "/graphql", "subscriptions": "/ws", "health": "/health" },
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "timestamp": chrono::Utc::now().to_rfc3339() }))
}

async fn graphql_handler(
    axum::extract::State(state): axum::extract::State<RouterState>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}
