//! `etcd/upgrade` — replace the etcd binary and data directory with the
//! new version, start on a temporary port (§4.E etcd sub-plan step 3).
//! No declared rollback; `restore` and `restart` complete the sequence
//! regardless of whether this step is "undone".

use crate::executors::{ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

pub struct EtcdUpgradeExecutor;

#[async_trait]
impl PhaseExecutor for EtcdUpgradeExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.etcd_upgrade(&server).await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
