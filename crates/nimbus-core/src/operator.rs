//! Cluster Operator interface (§6): consumed, not implemented, by this
//! core. Covers the shrink protocol the Shrink Coordinator drives and the
//! package-rotation/config calls the Upgrade Plan Builder's `init` phase
//! and the `app`/`config` phase executors drive.

use crate::error::Result;
use crate::model::{PackageRef, Server};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Site {
    pub servers: Vec<Server>,
}

impl Site {
    pub fn find_by_instance_id(&self, instance_id: &crate::model::InstanceId) -> Option<&Server> {
        self.servers.iter().find(|s| &s.instance_id == instance_id)
    }
}

#[derive(Debug, Clone)]
pub struct ShrinkRequest {
    pub hostnames: Vec<String>,
    pub force: bool,
    pub node_removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct OperationProgress {
    pub state: OperationState,
    pub message: String,
}

/// A pod scheduled on a node, as `drain` (§4.F) needs to see it: enough
/// to decide eviction-worthiness and how long to wait for termination.
#[derive(Debug, Clone)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
    pub daemon_set_owned: bool,
    pub termination_grace_period_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppHook {
    PreUpdate,
    Rollback,
    PostRollback,
}

/// The cluster control-plane surface consumed by the Upgrade Plan
/// Builder and Phase Executors (§4.E/§4.F), in addition to the shrink
/// and package-rotation calls §6 names explicitly. This core only
/// defines the interface; a host driver supplies the real
/// Kubernetes/etcd-backed implementation.
#[async_trait]
pub trait ClusterOperator: Send + Sync {
    async fn get_local_site(&self) -> Result<Site>;

    async fn create_site_shrink_operation(&self, req: ShrinkRequest) -> Result<OperationKey>;

    async fn get_site_operation_progress(&self, key: &OperationKey) -> Result<OperationProgress>;

    async fn rotate_secrets(&self, server: &Server) -> Result<()>;

    async fn rotate_planet_config(&self, server: &Server) -> Result<PackageRef>;

    async fn rotate_teleport_config(&self, server: &Server) -> Result<PackageRef>;

    async fn get_cluster_environment_variables(&self) -> Result<HashMap<String, String>>;

    async fn get_cluster_configuration(&self) -> Result<String>;

    async fn get_expand_token(&self) -> Result<String>;

    /// The one-time, cluster-wide part of `init`: rotate RPC credentials,
    /// create the admin agent, persist the service user, update cluster
    /// roles/DNS/docker config. Runs once on the lead master.
    async fn bootstrap_cluster_identity(&self) -> Result<()>;

    // --- node lifecycle (common-node sequence, §4.F) ---

    /// Cordon (`true`) or uncordon (`false`) a node.
    async fn set_unschedulable(&self, server: &Server, unschedulable: bool) -> Result<()>;

    async fn list_pods_on_node(&self, server: &Server) -> Result<Vec<PodRef>>;

    /// Evict one pod. `Transient` on `TooManyRequests`-style throttling,
    /// per §4.F's drain retry policy.
    async fn evict_pod(&self, pod: &PodRef) -> Result<()>;

    async fn wait_pod_terminated(&self, pod: &PodRef, timeout: std::time::Duration) -> Result<()>;

    /// Apply (`true`) or remove (`false`) the upgrade-in-progress
    /// `NoExecute` taint.
    async fn set_taint(&self, server: &Server, present: bool) -> Result<()>;

    async fn health_check(&self, server: &Server) -> Result<bool>;

    async fn wait_endpoints_ready(&self, timeout: std::time::Duration) -> Result<()>;

    // --- packages (init, system-upgrade, config, runtime) ---

    /// Install/upgrade a package on `server`. `operation_label`, when
    /// set, tags the installed package with the owning operation ID so
    /// `init`'s rollback can find and remove it later.
    async fn install_package(
        &self,
        server: &Server,
        package: &PackageRef,
        operation_label: Option<&str>,
    ) -> Result<()>;

    async fn remove_packages_by_label(&self, label: &str) -> Result<()>;

    // --- application hooks (pre-update, app, rollback) ---

    async fn run_app_hook(&self, hook: AppHook) -> Result<()>;

    // --- migration (role format / trusted-cluster links) ---

    async fn migrate_role_labels(&self) -> Result<()>;

    async fn backup_roles(&self) -> Result<serde_json::Value>;

    async fn migrate_roles(&self) -> Result<()>;

    async fn restore_roles(&self, backup: &serde_json::Value) -> Result<()>;

    async fn create_trusted_cluster(&self, name: &str) -> Result<()>;

    async fn delete_trusted_cluster(&self, name: &str) -> Result<()>;

    // --- bootstrap / checks / dns / gc ---

    async fn run_preflight_checks(&self) -> Result<()>;

    async fn configure_node(&self, server: &Server) -> Result<()>;

    /// Grant the first-upgraded master transitional permission to update
    /// node status against an older control plane (`kubelet-permissions`).
    async fn grant_kubelet_permissions(&self, server: &Server) -> Result<()>;

    async fn export_upgrade_binary(&self, server: &Server) -> Result<()>;

    async fn pre_pull_packages(&self, server: &Server, packages: &[PackageRef]) -> Result<()>;

    async fn sync_operation_plan(&self, server: &Server) -> Result<()>;

    async fn provision_dns(&self) -> Result<()>;

    async fn restart_control_plane(&self, server: &Server) -> Result<()>;

    async fn run_garbage_collection(&self, server: &Server) -> Result<()>;

    // --- etcd sub-plan ---

    /// Snapshot etcd on `server`, returning a backup location/id.
    async fn etcd_backup(&self, server: &Server) -> Result<String>;

    async fn etcd_shutdown(&self, server: &Server, backup_id: &str) -> Result<()>;

    async fn etcd_upgrade(&self, server: &Server) -> Result<()>;

    /// Lead-master-only: migrate data forward and re-import to the new
    /// cluster.
    async fn etcd_restore(&self, server: &Server) -> Result<()>;

    async fn etcd_restart(&self, server: &Server) -> Result<()>;
}

pub mod mock {
    use super::*;
    use crate::error::CoreError;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::RwLock;

    #[derive(Debug, Clone)]
    pub struct SeededOperation {
        pub progress: Vec<OperationProgress>,
    }

    /// Scriptable fake `ClusterOperator`. Tests seed `site.servers`, mark
    /// some as "offline" to trigger the §4.D offline-escalation path, and
    /// queue a sequence of progress snapshots that `get_site_operation_progress`
    /// plays back one per poll.
    pub struct MockClusterOperator {
        pub site: RwLock<Site>,
        offline_hostnames: DashMap<String, ()>,
        pub shrink_calls: DashMap<u64, ShrinkRequest>,
        next_call_id: AtomicU64,
        operations: DashMap<String, RwLock<std::collections::VecDeque<OperationProgress>>>,
        next_op_id: AtomicU64,
    }

    impl MockClusterOperator {
        pub fn new(site: Site) -> Self {
            Self {
                site: RwLock::new(site),
                offline_hostnames: DashMap::new(),
                shrink_calls: DashMap::new(),
                next_call_id: AtomicU64::new(0),
                operations: DashMap::new(),
                next_op_id: AtomicU64::new(0),
            }
        }

        pub fn mark_offline(&self, hostname: &str) {
            self.offline_hostnames.insert(hostname.to_string(), ());
        }

        /// Seed the progress snapshots a created operation will report,
        /// in poll order.
        pub fn queue_progress(&self, key: &OperationKey, snapshots: Vec<OperationProgress>) {
            self.operations
                .insert(key.0.clone(), RwLock::new(snapshots.into()));
        }

        pub fn shrink_call_count(&self) -> usize {
            self.shrink_calls.len()
        }

        pub fn force_call_count(&self) -> usize {
            self.shrink_calls.iter().filter(|e| e.value().force).count()
        }
    }

    #[async_trait]
    impl ClusterOperator for MockClusterOperator {
        async fn get_local_site(&self) -> Result<Site> {
            Ok(self.site.read().await.clone())
        }

        async fn create_site_shrink_operation(&self, req: ShrinkRequest) -> Result<OperationKey> {
            if !req.force {
                if let Some(host) = req.hostnames.iter().find(|h| self.offline_hostnames.contains_key(*h)) {
                    return Err(CoreError::PreconditionFailed(format!(
                        "node is offline: {host}"
                    )));
                }
            }
            let id = self.next_call_id.fetch_add(1, Ordering::SeqCst);
            self.shrink_calls.insert(id, req);
            let op_id = self.next_op_id.fetch_add(1, Ordering::SeqCst);
            let key = OperationKey(format!("op-{op_id}"));
            if !self.operations.contains_key(&key.0) {
                self.operations.insert(
                    key.0.clone(),
                    RwLock::new(
                        vec![OperationProgress {
                            state: OperationState::Completed,
                            message: "done".into(),
                        }]
                        .into(),
                    ),
                );
            }
            Ok(key)
        }

        async fn get_site_operation_progress(&self, key: &OperationKey) -> Result<OperationProgress> {
            let queue = self
                .operations
                .get(&key.0)
                .ok_or_else(|| CoreError::NotFound(format!("operation {}", key.0)))?;
            let mut guard = queue.write().await;
            if guard.len() > 1 {
                Ok(guard.pop_front().unwrap())
            } else {
                Ok(guard.front().cloned().unwrap_or(OperationProgress {
                    state: OperationState::InProgress,
                    message: "pending".into(),
                }))
            }
        }

        async fn rotate_secrets(&self, _server: &Server) -> Result<()> {
            Ok(())
        }

        async fn rotate_planet_config(&self, _server: &Server) -> Result<PackageRef> {
            Ok(PackageRef {
                name: "planet".into(),
                version: "rotated".into(),
            })
        }

        async fn rotate_teleport_config(&self, _server: &Server) -> Result<PackageRef> {
            Ok(PackageRef {
                name: "teleport".into(),
                version: "rotated".into(),
            })
        }

        async fn get_cluster_environment_variables(&self) -> Result<HashMap<String, String>> {
            Ok(HashMap::new())
        }

        async fn get_cluster_configuration(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn get_expand_token(&self) -> Result<String> {
            Ok("expand-token".into())
        }

        async fn bootstrap_cluster_identity(&self) -> Result<()> {
            Ok(())
        }

        async fn set_unschedulable(&self, _server: &Server, _unschedulable: bool) -> Result<()> {
            Ok(())
        }

        async fn list_pods_on_node(&self, _server: &Server) -> Result<Vec<PodRef>> {
            Ok(vec![])
        }

        async fn evict_pod(&self, _pod: &PodRef) -> Result<()> {
            Ok(())
        }

        async fn wait_pod_terminated(
            &self,
            _pod: &PodRef,
            _timeout: std::time::Duration,
        ) -> Result<()> {
            Ok(())
        }

        async fn set_taint(&self, _server: &Server, _present: bool) -> Result<()> {
            Ok(())
        }

        async fn health_check(&self, server: &Server) -> Result<bool> {
            Ok(!self.offline_hostnames.contains_key(&server.hostname))
        }

        async fn wait_endpoints_ready(&self, _timeout: std::time::Duration) -> Result<()> {
            Ok(())
        }

        async fn install_package(
            &self,
            _server: &Server,
            _package: &PackageRef,
            _operation_label: Option<&str>,
        ) -> Result<()> {
            Ok(())
        }

        async fn remove_packages_by_label(&self, _label: &str) -> Result<()> {
            Ok(())
        }

        async fn run_app_hook(&self, _hook: AppHook) -> Result<()> {
            Ok(())
        }

        async fn migrate_role_labels(&self) -> Result<()> {
            Ok(())
        }

        async fn backup_roles(&self) -> Result<serde_json::Value> {
            Ok(serde_json::json!({}))
        }

        async fn migrate_roles(&self) -> Result<()> {
            Ok(())
        }

        async fn restore_roles(&self, _backup: &serde_json::Value) -> Result<()> {
            Ok(())
        }

        async fn create_trusted_cluster(&self, _name: &str) -> Result<()> {
            Ok(())
        }

        async fn delete_trusted_cluster(&self, _name: &str) -> Result<()> {
            Ok(())
        }

        async fn run_preflight_checks(&self) -> Result<()> {
            Ok(())
        }

        async fn configure_node(&self, _server: &Server) -> Result<()> {
            Ok(())
        }

        async fn grant_kubelet_permissions(&self, _server: &Server) -> Result<()> {
            Ok(())
        }

        async fn export_upgrade_binary(&self, _server: &Server) -> Result<()> {
            Ok(())
        }

        async fn pre_pull_packages(&self, _server: &Server, _packages: &[PackageRef]) -> Result<()> {
            Ok(())
        }

        async fn sync_operation_plan(&self, _server: &Server) -> Result<()> {
            Ok(())
        }

        async fn provision_dns(&self) -> Result<()> {
            Ok(())
        }

        async fn restart_control_plane(&self, _server: &Server) -> Result<()> {
            Ok(())
        }

        async fn run_garbage_collection(&self, _server: &Server) -> Result<()> {
            Ok(())
        }

        async fn etcd_backup(&self, server: &Server) -> Result<String> {
            Ok(format!("backup-{}", server.hostname))
        }

        async fn etcd_shutdown(&self, _server: &Server, _backup_id: &str) -> Result<()> {
            Ok(())
        }

        async fn etcd_upgrade(&self, _server: &Server) -> Result<()> {
            Ok(())
        }

        async fn etcd_restore(&self, _server: &Server) -> Result<()> {
            Ok(())
        }

        async fn etcd_restart(&self, _server: &Server) -> Result<()> {
            Ok(())
        }
    }
}
