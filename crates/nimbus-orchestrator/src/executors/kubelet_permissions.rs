//! `kubelet-permissions` — grant the first-upgraded master transitional
//! permission to update node status against an older control plane,
//! inserted around the lead master's common-node sequence (§4.E "Master
//! sub-plan"). No declared rollback; the permission is transitional and
//! superseded once the rest of the masters are upgraded.

use crate::executors::{ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::{CoreError, Result};

pub struct KubeletPermissionsExecutor;

#[async_trait]
impl PhaseExecutor for KubeletPermissionsExecutor {
    async fn pre_check(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        if !ctx.is_lead_master(&server) {
            return Err(CoreError::PermanentOperational(
                "kubelet-permissions must run on the lead master".into(),
            ));
        }
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.grant_kubelet_permissions(&server).await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
