pub mod discovery;
pub mod election;
pub mod event;
pub mod instance;
pub mod phase;
pub mod plan;
pub mod progress;
pub mod server;
pub mod update_server;

pub use discovery::{sanitize_cluster_name, service_param_name, token_param_name, DiscoveryRecord};
pub use election::ElectionChange;
pub use event::{LifecycleEvent, LifecycleEventType, LifecycleMessage, RawMessage};
pub use instance::{Instance, InstanceId};
pub use phase::{Executor, Phase, PhaseId, PhaseState};
pub use plan::{Plan, PlanArena};
pub use progress::{ErrorClassDto, ProgressEntry, ProgressLog};
pub use server::{ClusterRole, Server};
pub use update_server::{PackageRef, UpdateServer};
