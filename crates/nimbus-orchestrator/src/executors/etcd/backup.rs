//! `etcd/backup` — snapshot etcd on one master (§4.E etcd sub-plan step
//! 1). No declared rollback: a snapshot is additive, non-destructive
//! state.

use crate::executors::{ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

pub struct EtcdBackupExecutor;

#[async_trait]
impl PhaseExecutor for EtcdBackupExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        let backup_id = ctx.operator.etcd_backup(&server).await?;
        ctx.records.etcd_backups.insert(server.hostname, backup_id);
        Ok(())
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
