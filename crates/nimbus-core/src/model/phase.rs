//! Phase — a node in the plan graph (§3). The `Plan` that owns these is
//! immutable once emitted by the builder; mutable execution state lives in
//! a sibling `ProgressLog` keyed by `PhaseId`, never on `Phase` itself.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhaseId(pub String);

impl PhaseId {
    pub fn new(path: impl Into<String>) -> Self {
        PhaseId(path.into())
    }

    pub fn child(&self, name: &str) -> PhaseId {
        PhaseId(format!("{}/{}", self.0, name))
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The work a phase performs. One variant per leaf executor named in
/// §4.F, plus the composite/organizational phases from §4.E that exist
/// purely to group children (`Executor::Group`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Executor {
    Group,
    Checks,
    Init,
    Bootstrap,
    PreUpdate,
    Coredns,
    EarlyRuntimeDns,
    EtcdBackup,
    EtcdShutdown,
    EtcdUpgrade,
    EtcdRestore,
    EtcdRestart,
    MigrationLabels,
    MigrationLinks,
    MigrationRoles,
    KubeletPermissions,
    ElectionChange,
    Drain,
    SystemUpgrade,
    Health,
    Taint,
    Untaint,
    Uncordon,
    Endpoints,
    ConfigPull,
    Runtime,
    App,
    Gc,
}

impl Executor {
    /// `Execute` must be idempotent for these; listed explicitly in
    /// §4.F so the Plan Runner can resume safely after process restart.
    pub fn is_retryable_on_resume(&self) -> bool {
        matches!(
            self,
            Executor::Init
                | Executor::SystemUpgrade
                | Executor::ConfigPull
                | Executor::MigrationLabels
        )
    }

    /// Whether `Rollback` is a no-op for this executor (§4.F bullet list).
    pub fn rollback_is_noop(&self) -> bool {
        matches!(
            self,
            Executor::Group
                | Executor::Bootstrap
                | Executor::Gc
                | Executor::Health
                | Executor::Checks
                | Executor::Endpoints
                | Executor::Uncordon
                | Executor::MigrationLabels
        )
    }
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseState {
    Unstarted,
    InProgress,
    Completed,
    Failed,
    RolledBack,
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A node in the plan's arena. `children` and `depends_on` are indices
/// into the owning `PlanArena`'s `Vec<Phase>`, resolved once at build
/// time — never re-looked-up by string after that (§9 "store phases in
/// an arena... reference them by index").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub executor: Executor,
    pub data: serde_json::Value,
    pub children: Vec<usize>,
    pub depends_on: Vec<usize>,
    /// `None` means children run strictly sequentially; `Some(n)` bounds
    /// how many may be `InProgress` at once.
    pub limit_parallel: Option<usize>,
}

impl Phase {
    pub fn leaf(id: PhaseId, executor: Executor, data: serde_json::Value) -> Self {
        Self {
            id,
            executor,
            data,
            children: vec![],
            depends_on: vec![],
            limit_parallel: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
