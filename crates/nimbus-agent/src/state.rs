//! Shared agent state — config plus the cloud/operator/registry
//! collaborators, wired as trait objects so tests can swap in the mocks
//! from `nimbus_core::{cloud,operator,registry}::*::mock`.

use crate::config::AgentConfig;
use nimbus_core::cloud::{AutoscalingControl, InstanceControl, MessageQueue, ParameterStore};
use nimbus_core::operator::ClusterOperator;
use nimbus_core::registry::ServiceRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct AgentState {
    pub config: AgentConfig,
    pub queue: Arc<dyn MessageQueue>,
    pub parameter_store: Arc<dyn ParameterStore>,
    pub instance_control: Arc<dyn InstanceControl>,
    pub autoscaling: Arc<dyn AutoscalingControl>,
    pub operator: Arc<dyn ClusterOperator>,
    pub service_registry: Arc<dyn ServiceRegistry>,
    pub cancel: CancellationToken,
}

pub type SharedState = Arc<AgentState>;

impl AgentState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AgentConfig,
        queue: Arc<dyn MessageQueue>,
        parameter_store: Arc<dyn ParameterStore>,
        instance_control: Arc<dyn InstanceControl>,
        autoscaling: Arc<dyn AutoscalingControl>,
        operator: Arc<dyn ClusterOperator>,
        service_registry: Arc<dyn ServiceRegistry>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            queue,
            parameter_store,
            instance_control,
            autoscaling,
            operator,
            service_registry,
            cancel,
        }
    }
}
