use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod discovery;
mod reactor;
mod shrink;
mod state;

use config::AgentConfig;
use discovery::DiscoveryPublisher;
use reactor::EventReactor;
use state::AgentState;

use nimbus_core::cloud::autoscaling_control::mock::MockAutoscalingControl;
use nimbus_core::cloud::instance_control::mock::MockInstanceControl;
use nimbus_core::cloud::message_queue::mock::MockMessageQueue;
use nimbus_core::cloud::parameter_store::mock::MockParameterStore;
use nimbus_core::operator::mock::MockClusterOperator;
use nimbus_core::operator::Site;
use nimbus_core::registry::mock::MockServiceRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AgentConfig::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting nimbus-agent for cluster {}", config.cluster_name);

    let cancel = CancellationToken::new();

    // The cloud control surfaces (message queue, parameter store, instance
    // control, autoscaling hooks) and the Cluster Operator are external
    // systems this crate only consumes (§4.A, §6); wiring live AWS/Kubernetes
    // clients is out of scope here, so the in-memory mocks stand in.
    let queue = Arc::new(MockMessageQueue::new());
    let parameter_store = Arc::new(MockParameterStore::new());
    let instance_control = Arc::new(MockInstanceControl::new());
    let autoscaling = Arc::new(MockAutoscalingControl::new());
    let operator = Arc::new(MockClusterOperator::new(Site { servers: vec![] }));
    let service_registry = Arc::new(MockServiceRegistry::new());

    let queue_url = queue.resolve_url(&config.queue_name).await?;

    let state = Arc::new(AgentState::new(
        config,
        queue,
        parameter_store,
        instance_control,
        autoscaling,
        operator,
        service_registry,
        cancel.clone(),
    ));

    let discovery = Arc::new(DiscoveryPublisher::new(state.clone()));
    let discovery_handle = tokio::spawn(discovery.run());

    let reactor = Arc::new(EventReactor::new(state.clone()));
    let reactor_handle = tokio::spawn(async move { reactor.run(&queue_url).await });

    shutdown_signal().await;
    info!("shutdown signal received, cancelling background tasks");
    cancel.cancel();

    let _ = tokio::join!(discovery_handle, reactor_handle);
    info!("nimbus-agent shutdown complete");
    Ok(())
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
