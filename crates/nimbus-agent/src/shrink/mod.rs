//! Shrink Coordinator (§4.D). One instance per termination event, run as
//! a detached task bounded by a hard deadline. Keeps the cloud lifecycle
//! hook alive via heartbeats while it drives a graceful-then-forced
//! shrink of the cluster member through the Cluster Operator interface.

use nimbus_core::error::ErrorClass;
use nimbus_core::model::{LifecycleEvent, Server};
use nimbus_core::operator::{OperationKey, OperationState, ShrinkRequest};
use nimbus_core::cloud::HookResult;
use crate::state::SharedState;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// The subset of context the heartbeat loop needs, kept separate from
/// `ShrinkCoordinator` so the loop can be spawned without sharing an
/// `Arc<ShrinkCoordinator>`.
#[derive(Clone)]
struct HeartbeatCtx {
    state: SharedState,
    event: LifecycleEvent,
}

async fn heartbeat_loop(ctx: HeartbeatCtx, cancel: CancellationToken, deadline: Instant, interval_secs: u64) {
    let mut interval = time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if Instant::now() >= deadline {
                    return;
                }
                let event = &ctx.event;
                if let Err(e) = ctx
                    .state
                    .autoscaling
                    .heartbeat(&event.group_name, &event.hook_name, &event.instance_id, &event.token)
                    .await
                {
                    warn!("heartbeat failed for {}: {}", event.instance_id, e);
                }
            }
            _ = cancel.cancelled() => return,
            _ = ctx.state.cancel.cancelled() => return,
        }
    }
}

pub struct ShrinkCoordinator {
    state: SharedState,
    event: LifecycleEvent,
}

impl ShrinkCoordinator {
    pub fn new(state: SharedState, event: LifecycleEvent) -> Self {
        Self { state, event }
    }

    /// Drives the full state machine (§4.D diagram) to completion.
    /// Always releases the lifecycle hook at the end, regardless of
    /// outcome (§4.D step 5).
    pub async fn run(self) {
        let deadline = Instant::now() + Duration::from_secs(self.state.config.shrink.task_deadline_secs);
        let hb_cancel = CancellationToken::new();
        let hb_ctx = HeartbeatCtx {
            state: self.state.clone(),
            event: self.event.clone(),
        };
        let heartbeat_interval = self.state.config.shrink.heartbeat_interval_secs;
        let hb_handle = tokio::spawn(heartbeat_loop(
            hb_ctx,
            hb_cancel.clone(),
            deadline,
            heartbeat_interval,
        ));

        self.drive(deadline).await;

        hb_cancel.cancel();
        let _ = hb_handle.await;

        if let Err(e) = self
            .state
            .autoscaling
            .complete(
                &self.event.group_name,
                &self.event.hook_name,
                &self.event.instance_id,
                &self.event.token,
                HookResult::Continue,
            )
            .await
        {
            // Non-fatal: the hook may already have timed out.
            warn!(
                "final lifecycle hook release failed for {}: {}",
                self.event.instance_id, e
            );
        }
    }

    async fn drive(&self, deadline: Instant) {
        let site = match self.state.operator.get_local_site().await {
            Ok(site) => site,
            Err(e) => {
                error!("failed to fetch local site for {}: {}", self.event.instance_id, e);
                return;
            }
        };

        let server = match site.find_by_instance_id(&self.event.instance_id) {
            Some(s) => s.clone(),
            None => {
                info!(
                    "instance {} is not a cluster member, nothing to shrink",
                    self.event.instance_id
                );
                return;
            }
        };

        let key = match self.attempt_initial_shrink(&server, deadline).await {
            Some(key) => key,
            None => return,
        };

        self.monitor(&key, &server, deadline).await;
    }

    /// Graceful attempt with exponential backoff (capped at 1h);
    /// escalates immediately to a forced shrink on the "node is offline"
    /// precondition (§4.D steps 2-3).
    async fn attempt_initial_shrink(&self, server: &Server, deadline: Instant) -> Option<OperationKey> {
        let mut backoff = Duration::from_secs(self.state.config.shrink.initial_backoff_secs);
        let max_backoff = Duration::from_secs(self.state.config.shrink.max_backoff_secs);

        loop {
            if Instant::now() >= deadline {
                error!("deadline exceeded attempting shrink for {}", server.hostname);
                return None;
            }

            let graceful = ShrinkRequest {
                hostnames: vec![server.hostname.clone()],
                force: false,
                node_removed: false,
            };

            match self.state.operator.create_site_shrink_operation(graceful).await {
                Ok(key) => return Some(key),
                Err(e) if e.class() == ErrorClass::PreconditionFailed => {
                    info!(
                        "node {} reported offline, escalating to forced shrink",
                        server.hostname
                    );
                    let forced = ShrinkRequest {
                        hostnames: vec![server.hostname.clone()],
                        force: true,
                        node_removed: true,
                    };
                    return match self.state.operator.create_site_shrink_operation(forced).await {
                        Ok(key) => Some(key),
                        Err(e) => {
                            error!("forced shrink request failed for {}: {}", server.hostname, e);
                            None
                        }
                    };
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        "transient error requesting shrink for {}, retrying in {:?}: {}",
                        server.hostname, backoff, e
                    );
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    time::sleep(backoff.min(remaining)).await;
                    backoff = (backoff * 2).min(max_backoff);
                }
                Err(e) => {
                    error!("permanent error requesting shrink for {}: {}", server.hostname, e);
                    return None;
                }
            }
        }
    }

    /// Polls operation progress until `Completed`, or escalates on
    /// `Failed` (§4.D step 4). Does not retry after the final forced
    /// shrink — by design (§9 open question), the caller is the last
    /// line of defence.
    async fn monitor(&self, key: &OperationKey, server: &Server, deadline: Instant) {
        let poll_interval = Duration::from_secs(self.state.config.shrink.monitor_poll_interval_secs);

        loop {
            if Instant::now() >= deadline {
                warn!("deadline exceeded monitoring shrink for {}", server.hostname);
                return;
            }

            let progress = match self.state.operator.get_site_operation_progress(key).await {
                Ok(p) => p,
                Err(e) => {
                    warn!("failed to poll shrink progress for {}: {}", server.hostname, e);
                    time::sleep(poll_interval).await;
                    continue;
                }
            };

            match progress.state {
                OperationState::Completed => {
                    info!("shrink completed for {}", server.hostname);
                    return;
                }
                OperationState::Failed => {
                    warn!(
                        "shrink operation failed for {}, escalating to forced shrink",
                        server.hostname
                    );
                    if let Err(e) = self
                        .state
                        .autoscaling
                        .complete(
                            &self.event.group_name,
                            &self.event.hook_name,
                            &self.event.instance_id,
                            &self.event.token,
                            HookResult::Continue,
                        )
                        .await
                    {
                        warn!("hook release before forced shrink failed: {}", e);
                    }

                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if self
                        .state
                        .instance_control
                        .describe(&self.event.instance_id)
                        .await
                        .ok()
                        .flatten()
                        .is_some()
                    {
                        if let Err(e) = self
                            .state
                            .instance_control
                            .wait_terminated(&self.event.instance_id, remaining)
                            .await
                        {
                            warn!("wait_terminated failed for {}: {}", self.event.instance_id, e);
                        }
                    }

                    let forced = ShrinkRequest {
                        hostnames: vec![server.hostname.clone()],
                        force: true,
                        node_removed: true,
                    };
                    if let Err(e) = self.state.operator.create_site_shrink_operation(forced).await {
                        error!("final forced shrink failed for {}: {}", server.hostname, e);
                    }
                    return;
                }
                OperationState::InProgress => {
                    time::sleep(poll_interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use nimbus_core::cloud::autoscaling_control::mock::MockAutoscalingControl;
    use nimbus_core::cloud::instance_control::mock::MockInstanceControl;
    use nimbus_core::cloud::message_queue::mock::MockMessageQueue;
    use nimbus_core::cloud::parameter_store::mock::MockParameterStore;
    use nimbus_core::model::{ClusterRole, Instance, InstanceId};
    use nimbus_core::operator::mock::MockClusterOperator;
    use nimbus_core::operator::{OperationProgress, OperationState, Site};
    use nimbus_core::registry::mock::MockServiceRegistry;
    use std::sync::Arc;

    fn test_state(operator: Arc<MockClusterOperator>) -> (SharedState, Arc<MockAutoscalingControl>, Arc<MockInstanceControl>) {
        let autoscaling = Arc::new(MockAutoscalingControl::new());
        let instance_control = Arc::new(MockInstanceControl::new());
        let state = Arc::new(crate::state::AgentState::new(
            AgentConfig {
                shrink: crate::config::ShrinkConfig {
                    task_deadline_secs: 5,
                    heartbeat_interval_secs: 1,
                    monitor_poll_interval_secs: 0,
                    initial_backoff_secs: 0,
                    max_backoff_secs: 1,
                },
                ..AgentConfig::default()
            },
            Arc::new(MockMessageQueue::new()),
            Arc::new(MockParameterStore::new()),
            instance_control.clone(),
            autoscaling.clone(),
            operator,
            Arc::new(MockServiceRegistry::new()),
            CancellationToken::new(),
        ));
        (state, autoscaling, instance_control)
    }

    fn sample_event() -> LifecycleEvent {
        LifecycleEvent {
            instance_id: InstanceId::from("i-2"),
            event_type: nimbus_core::model::LifecycleEventType::Terminating,
            receipt_handle: "recv-1".into(),
            token: "token-1".into(),
            hook_name: "hook".into(),
            group_name: "asg".into(),
        }
    }

    #[tokio::test]
    async fn graceful_shrink_completes_and_releases_hook() {
        let server = Server::new("i-2", "host-2", "10.0.0.2", ClusterRole::Node);
        let operator = Arc::new(MockClusterOperator::new(Site {
            servers: vec![server],
        }));
        let (state, autoscaling, _ic) = test_state(operator);

        let coordinator = ShrinkCoordinator::new(state, sample_event());
        coordinator.run().await;

        let completions = autoscaling.completions_for(&InstanceId::from("i-2"));
        assert_eq!(completions.last(), Some(&HookResult::Continue));
    }

    #[tokio::test]
    async fn offline_node_escalates_to_forced_shrink() {
        let server = Server::new("i-2", "host-2", "10.0.0.2", ClusterRole::Node);
        let operator = Arc::new(MockClusterOperator::new(Site {
            servers: vec![server],
        }));
        operator.mark_offline("host-2");
        let (state, _autoscaling, _ic) = test_state(operator.clone());

        let coordinator = ShrinkCoordinator::new(state, sample_event());
        coordinator.run().await;

        assert!(operator.force_call_count() >= 1);
    }

    #[tokio::test]
    async fn exits_noop_when_instance_not_a_cluster_member() {
        let operator = Arc::new(MockClusterOperator::new(Site { servers: vec![] }));
        let (state, autoscaling, _ic) = test_state(operator.clone());

        let coordinator = ShrinkCoordinator::new(state, sample_event());
        coordinator.run().await;

        assert_eq!(operator.shrink_call_count(), 0);
        let completions = autoscaling.completions_for(&InstanceId::from("i-2"));
        assert_eq!(completions, vec![HookResult::Continue]);
    }

    #[tokio::test]
    async fn failed_monitor_escalates_to_forced_shrink_after_wait_terminated() {
        let server = Server::new("i-2", "host-2", "10.0.0.2", ClusterRole::Node);
        let operator = Arc::new(MockClusterOperator::new(Site {
            servers: vec![server.clone()],
        }));
        let (state, _autoscaling, instance_control) = test_state(operator.clone());

        instance_control.seed(
            Instance::new("i-2", "10.0.0.2", "host-2.internal", "us-east-1"),
            true,
        );

        let coordinator = ShrinkCoordinator::new(state, sample_event());

        // Mark the instance terminated shortly after the forced shrink
        // request so wait_terminated resolves quickly instead of riding
        // out the whole deadline.
        let instance_control_clone = instance_control.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            instance_control_clone.mark_terminated(&InstanceId::from("i-2"));
        });

        // The coordinator's first (and only, in this test) shrink request
        // mints operation key "op-0"; queuing its progress before `run()`
        // ensures the operator reports Failed rather than its default Completed.
        operator.queue_progress(
            &OperationKey("op-0".into()),
            vec![OperationProgress {
                state: OperationState::Failed,
                message: "disk pressure".into(),
            }],
        );

        coordinator.run().await;

        assert!(operator.force_call_count() >= 1);
    }
}
