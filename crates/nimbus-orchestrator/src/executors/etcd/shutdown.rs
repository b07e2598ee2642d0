//! `etcd/shutdown` — stop etcd on one master, preserving data under the
//! backup location recorded by the same-server `backup` phase (§4.E
//! etcd sub-plan step 2; `build_etcd_subplan` nests `backup` and
//! `shutdown` as sequential sibling groups, so `backup` has already run
//! by the time this phase dispatches).

use crate::executors::{ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::{CoreError, Result};

pub struct EtcdShutdownExecutor;

#[async_trait]
impl PhaseExecutor for EtcdShutdownExecutor {
    async fn pre_check(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        if !ctx.records.etcd_backups.contains_key(&server.hostname) {
            return Err(CoreError::PermanentOperational(format!(
                "no etcd backup recorded for {}",
                server.hostname
            )));
        }
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        let backup_id = ctx
            .records
            .etcd_backups
            .get(&server.hostname)
            .map(|e| e.value().clone())
            .ok_or_else(|| {
                CoreError::PermanentOperational(format!(
                    "no etcd backup recorded for {}",
                    server.hostname
                ))
            })?;
        ctx.operator.etcd_shutdown(&server, &backup_id).await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
