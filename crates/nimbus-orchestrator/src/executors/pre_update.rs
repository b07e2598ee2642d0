//! `pre-update` — run the installed application's pre-update hook
//! (§4.E step 4). No declared rollback; hooks are one-directional.

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::operator::AppHook;
use nimbus_core::Result;

pub struct PreUpdateExecutor;

#[async_trait]
impl PhaseExecutor for PreUpdateExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        ctx.operator.run_app_hook(AppHook::PreUpdate).await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
