//! `etcd/restore` — lead-master-only: migrate data forward with a
//! version-specific converter, then re-import to the new cluster (§4.E
//! etcd sub-plan step 4, §4.F "etcd-restore"). Restricted to the lead
//! master because the restore writes cluster-wide state.

use crate::executors::{ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::{CoreError, Result};

pub struct EtcdRestoreExecutor;

#[async_trait]
impl PhaseExecutor for EtcdRestoreExecutor {
    async fn pre_check(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        if !ctx.is_lead_master(&server) {
            return Err(CoreError::PermanentOperational(
                "etcd-restore must run on the lead master".into(),
            ));
        }
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.etcd_restore(&server).await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
