//! `etcd/restart` — rolling restart of one master to the normal port,
//! plus a restart of the cluster control-plane service so elections
//! stabilise (§4.E etcd sub-plan step 5). `build_etcd_subplan` nests
//! `upgrade`, `restore` and `restart` as sequential sibling groups, so
//! this phase only ever dispatches after same-server `upgrade` and
//! lead-master `restore` have completed, holding §5's ordering
//! guarantee by construction.

use crate::executors::{ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

pub struct EtcdRestartExecutor;

#[async_trait]
impl PhaseExecutor for EtcdRestartExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.etcd_restart(&server).await?;
        ctx.operator.restart_control_plane(&server).await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
