//! `drain` — cordon the node, evict every pod that isn't a still-owned
//! daemon-set pod, and wait for each to terminate (§4.F "Key executor
//! details"). Throttled evictions retry indefinitely within the outer
//! `drainTimeout`; every other API error is permanent once the retry
//! budget elapses. Rollback is `uncordon`.

use super::{retry_transient, ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;
use std::time::Duration;

const TERMINATION_WAIT_OVERHEAD: Duration = Duration::from_secs(10);

pub struct DrainExecutor;

#[async_trait]
impl PhaseExecutor for DrainExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.set_unschedulable(&server, true).await?;

        let pods = ctx.operator.list_pods_on_node(&server).await?;
        for pod in pods.into_iter().filter(|p| !p.daemon_set_owned) {
            retry_transient(&ctx.cancel, ctx.drain_timeout, || {
                let operator = ctx.operator.clone();
                let pod = pod.clone();
                async move { operator.evict_pod(&pod).await }
            })
            .await?;

            let wait = Duration::from_secs(pod.termination_grace_period_secs)
                + TERMINATION_WAIT_OVERHEAD;
            ctx.operator.wait_pod_terminated(&pod, wait).await?;
        }
        Ok(())
    }

    async fn rollback(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.set_unschedulable(&server, false).await
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
