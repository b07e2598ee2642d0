//! Phase Executors (§4.F). One file per leaf executor, each implementing
//! the four-operation contract (`PreCheck`/`Execute`/`Rollback`/`PostCheck`)
//! against an `ExecutionContext` that carries the cloud/coordination
//! collaborators plus whatever local record-keeping a phase's rollback
//! needs (changesets, migration backups, created resources).

pub mod app;
pub mod bootstrap;
pub mod checks;
pub mod config_pull;
pub mod coredns;
pub mod drain;
pub mod early_runtime_dns;
pub mod election_change;
pub mod endpoints;
pub mod etcd;
pub mod gc;
pub mod group;
pub mod health;
pub mod init;
pub mod kubelet_permissions;
pub mod migration_labels;
pub mod migration_links;
pub mod migration_roles;
pub mod pre_update;
pub mod runtime;
pub mod system_upgrade;
pub mod taint;
pub mod uncordon;

use async_trait::async_trait;
use dashmap::DashMap;
use nimbus_core::model::{Phase, PhaseId, Server};
use nimbus_core::operator::ClusterOperator;
use nimbus_core::coordination::CoordinationStore;
use nimbus_core::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait PhaseExecutor: Send + Sync {
    /// Confirms the phase is running on the intended server; master-only
    /// phases reject non-master hosts (§4.F).
    async fn pre_check(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()>;

    /// Performs the work. Must be idempotent where `Executor::is_retryable_on_resume`
    /// says so.
    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()>;

    /// Reverses `execute` where reversal is defined; no-op otherwise.
    async fn rollback(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()>;

    /// Confirms the phase's effects actually landed. Most executors treat
    /// this as a cheap re-assertion of `execute`'s own success signal.
    async fn post_check(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()>;
}

/// Per-run bookkeeping the rollback contracts need: `system-upgrade`'s
/// changeset, `init`'s operation-labelled packages, migration backups and
/// created resources. Kept in-memory and scoped to one Plan Runner
/// invocation — rebuilt from the plan/progress store on resume rather
/// than persisted itself (see DESIGN.md).
#[derive(Default)]
pub struct ExecutionRecords {
    pub system_upgrade_changesets: DashMap<PhaseId, serde_json::Value>,
    pub init_packages: DashMap<PhaseId, Vec<String>>,
    pub role_backups: DashMap<PhaseId, serde_json::Value>,
    pub created_trusted_clusters: DashMap<PhaseId, Vec<String>>,
    pub config_pull_packages: DashMap<PhaseId, Vec<String>>,
    /// Server hostname -> backup id/location, bridging `etcd-backup` to
    /// the later `etcd-shutdown` phase on the same server.
    pub etcd_backups: DashMap<String, String>,
}

pub struct ExecutionContext {
    pub cluster_name: String,
    pub operation_id: String,
    pub lead_master: Server,
    pub operator: Arc<dyn ClusterOperator>,
    pub coordination: Arc<dyn CoordinationStore>,
    pub drain_timeout: Duration,
    pub etcd_step_timeout: Duration,
    pub election_retry_budget: Duration,
    pub election_retry_interval: Duration,
    pub transient_retry_budget: Duration,
    pub records: Arc<ExecutionRecords>,
    pub cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn is_lead_master(&self, server: &Server) -> bool {
        server.instance_id == self.lead_master.instance_id
    }
}

/// Payload shared by every phase whose work targets a single server
/// (bootstrap, drain, system-upgrade, health, taint, uncordon, endpoints,
/// config-pull, gc, kubelet-permissions, the etcd sub-plan leaves).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServerPhaseData {
    pub server: Server,
}

impl ServerPhaseData {
    pub fn new(server: Server) -> serde_json::Value {
        serde_json::to_value(ServerPhaseData { server }).expect("ServerPhaseData always serializes")
    }

    pub fn from_phase(phase: &Phase) -> Result<Server> {
        let data: ServerPhaseData = serde_json::from_value(phase.data.clone())
            .map_err(nimbus_core::CoreError::Serde)?;
        Ok(data.server)
    }
}

/// Retry a transient-failing operation with exponential backoff (starting
/// at 1s, capped at 30s) until `deadline` elapses or cancellation fires.
/// PreconditionFailed/PermanentOperational/Cancelled errors are returned
/// immediately (§7 propagation policy: executors retry only transient
/// errors internally).
pub async fn retry_transient<F, Fut, T>(
    cancel: &CancellationToken,
    deadline: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use nimbus_core::ErrorClass;
    let start = tokio::time::Instant::now();
    let mut backoff = Duration::from_secs(1);
    loop {
        if cancel.is_cancelled() {
            return Err(nimbus_core::CoreError::Cancelled);
        }
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.class() == ErrorClass::Transient => {
                let elapsed = start.elapsed();
                if elapsed >= deadline {
                    return Err(e);
                }
                let remaining = deadline - elapsed;
                tokio::select! {
                    _ = tokio::time::sleep(backoff.min(remaining)) => {}
                    _ = cancel.cancelled() => return Err(nimbus_core::CoreError::Cancelled),
                }
                backoff = (backoff * 2).min(Duration::from_secs(30));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Dispatch table from `Executor` to its `PhaseExecutor` implementation.
/// Executors are stateless; per-run state lives entirely in
/// `ExecutionContext`/`ExecutionRecords`.
pub fn executor_for(executor: nimbus_core::model::Executor) -> Arc<dyn PhaseExecutor> {
    use nimbus_core::model::Executor as E;
    match executor {
        E::Group => Arc::new(group::GroupExecutor),
        E::Checks => Arc::new(checks::ChecksExecutor),
        E::Init => Arc::new(init::InitExecutor),
        E::Bootstrap => Arc::new(bootstrap::BootstrapExecutor),
        E::PreUpdate => Arc::new(pre_update::PreUpdateExecutor),
        E::Coredns => Arc::new(coredns::CorednsExecutor),
        E::EarlyRuntimeDns => Arc::new(early_runtime_dns::EarlyRuntimeDnsExecutor),
        E::EtcdBackup => Arc::new(etcd::backup::EtcdBackupExecutor),
        E::EtcdShutdown => Arc::new(etcd::shutdown::EtcdShutdownExecutor),
        E::EtcdUpgrade => Arc::new(etcd::upgrade::EtcdUpgradeExecutor),
        E::EtcdRestore => Arc::new(etcd::restore::EtcdRestoreExecutor),
        E::EtcdRestart => Arc::new(etcd::restart::EtcdRestartExecutor),
        E::MigrationLabels => Arc::new(migration_labels::MigrationLabelsExecutor),
        E::MigrationLinks => Arc::new(migration_links::MigrationLinksExecutor),
        E::MigrationRoles => Arc::new(migration_roles::MigrationRolesExecutor),
        E::KubeletPermissions => Arc::new(kubelet_permissions::KubeletPermissionsExecutor),
        E::ElectionChange => Arc::new(election_change::ElectionChangeExecutor),
        E::Drain => Arc::new(drain::DrainExecutor),
        E::SystemUpgrade => Arc::new(system_upgrade::SystemUpgradeExecutor),
        E::Health => Arc::new(health::HealthExecutor),
        E::Taint => Arc::new(taint::TaintExecutor),
        E::Untaint => Arc::new(taint::UntaintExecutor),
        E::Uncordon => Arc::new(uncordon::UncordonExecutor),
        E::Endpoints => Arc::new(endpoints::EndpointsExecutor),
        E::ConfigPull => Arc::new(config_pull::ConfigPullExecutor),
        E::Runtime => Arc::new(runtime::RuntimeExecutor),
        E::App => Arc::new(app::AppExecutor),
        E::Gc => Arc::new(gc::GcExecutor),
    }
}
