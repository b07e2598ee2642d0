//! `uncordon` — make the node schedulable again after `system-upgrade`
//! and (if supported) `taint` (§4.E "Common-node sequence"). Rollback
//! is a no-op (§4.F): an already-upgraded node staying schedulable is
//! the desired end state even under rollback.

use super::{ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

pub struct UncordonExecutor;

#[async_trait]
impl PhaseExecutor for UncordonExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.set_unschedulable(&server, false).await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
