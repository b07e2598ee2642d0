//! Orchestrator configuration — layered defaults → file → env, mirroring
//! the teacher's `ClusterConfig::load()`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    pub cluster_name: String,
    pub parallelism: ParallelismConfig,
    pub timeouts: TimeoutConfig,
    pub graphql: GraphQlConfig,
    pub logging: LoggingConfig,
}

/// Worker-pool bounds per §4.E/§4.G. `num_parallel` defaults to
/// `CPU/2 + 1` at load time, matching the `NumParallel` column the
/// bootstrap phase uses; `parallel_workers` is the user-configurable
/// bound for the `nodes` phase.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParallelismConfig {
    pub num_parallel: usize,
    pub parallel_workers: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    pub drain_timeout_secs: u64,
    pub etcd_step_timeout_secs: u64,
    pub election_retry_budget_secs: u64,
    pub election_retry_interval_secs: u64,
    pub transient_retry_budget_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphQlConfig {
    pub bind_address: String,
    pub max_depth: usize,
    pub max_complexity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        Self {
            cluster_name: "cluster".to_string(),
            parallelism: ParallelismConfig {
                num_parallel: cpus / 2 + 1,
                parallel_workers: 3,
            },
            timeouts: TimeoutConfig {
                drain_timeout_secs: 600,
                etcd_step_timeout_secs: 300,
                election_retry_budget_secs: 120,
                election_retry_interval_secs: 5,
                transient_retry_budget_secs: 180,
            },
            graphql: GraphQlConfig {
                bind_address: "0.0.0.0:8081".to_string(),
                max_depth: 10,
                max_complexity: 200,
            },
            logging: LoggingConfig {
                level: "info,nimbus_orchestrator=debug".to_string(),
            },
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from `orchestrator.toml` and environment
    /// variables. Env vars use double-underscore nesting:
    /// `ORCHESTRATOR__TIMEOUTS__DRAIN_TIMEOUT_SECS`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&OrchestratorConfig::default())
            .context("failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        for path in [
            "/etc/nimbus/orchestrator",
            "config/orchestrator",
            "crates/nimbus-orchestrator/config/orchestrator",
        ] {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ORCHESTRATOR")
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
