//! `checks` — preflight resource/connectivity/version-compatibility
//! checks (§4.E step 1). Rollback is a no-op (§4.F).

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

pub struct ChecksExecutor;

#[async_trait]
impl PhaseExecutor for ChecksExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        ctx.operator.run_preflight_checks().await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
