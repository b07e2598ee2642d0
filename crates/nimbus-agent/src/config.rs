//! Agent configuration — layered defaults → file → env, mirroring the
//! teacher's `ClusterConfig::load()`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub cluster_name: String,
    pub queue_name: String,
    pub discovery: DiscoveryPublisherConfig,
    pub reactor: ReactorConfig,
    pub shrink: ShrinkConfig,
    pub service_registry: ServiceRegistryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryPublisherConfig {
    pub publish_interval_secs: u64,
    pub resync_interval_secs: u64,
    pub source_dest_check_interval_secs: u64,
    pub source_dest_check_batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReactorConfig {
    pub max_messages: u32,
    pub visibility_timeout_secs: u64,
    pub long_poll_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShrinkConfig {
    pub task_deadline_secs: u64,
    pub heartbeat_interval_secs: u64,
    pub monitor_poll_interval_secs: u64,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceRegistryConfig {
    pub namespace: String,
    pub service_name: String,
    pub port_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cluster_name: "cluster".to_string(),
            queue_name: "lifecycle-events".to_string(),
            discovery: DiscoveryPublisherConfig {
                publish_interval_secs: 60,
                resync_interval_secs: 600,
                source_dest_check_interval_secs: 300,
                source_dest_check_batch_size: 250,
            },
            reactor: ReactorConfig {
                max_messages: 1,
                visibility_timeout_secs: 30,
                long_poll_secs: 5,
            },
            shrink: ShrinkConfig {
                task_deadline_secs: 110 * 60,
                heartbeat_interval_secs: 25,
                monitor_poll_interval_secs: 5,
                initial_backoff_secs: 5,
                max_backoff_secs: 3600,
            },
            service_registry: ServiceRegistryConfig {
                namespace: "kube-system".to_string(),
                service_name: "gravity-site".to_string(),
                port_name: "web".to_string(),
            },
            logging: LoggingConfig {
                level: "info,nimbus_agent=debug".to_string(),
            },
        }
    }
}

impl AgentConfig {
    /// Load configuration from `agent.toml` and environment variables.
    /// Env vars use double-underscore nesting: `AGENT__RECTOR__MAX_MESSAGES`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&AgentConfig::default())
            .context("failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        for path in [
            "/etc/nimbus/agent",
            "config/agent",
            "crates/nimbus-agent/config/agent",
        ] {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("AGENT")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}
