//! `taint`/`untaint` — bracket the common-node sequence with the
//! `NoExecute` taint when the cluster supports it (§4.E). Both
//! directions roll back the same way: remove the taint, tolerating
//! already-removed (§4.F "`taint` ↔ `untaint` → remove the taint").

use super::{ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

pub struct TaintExecutor;

#[async_trait]
impl PhaseExecutor for TaintExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.set_taint(&server, true).await
    }

    async fn rollback(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.set_taint(&server, false).await
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}

pub struct UntaintExecutor;

#[async_trait]
impl PhaseExecutor for UntaintExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.set_taint(&server, false).await
    }

    async fn rollback(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        ctx.operator.set_taint(&server, false).await
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
