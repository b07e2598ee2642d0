//! `health` — confirm a node reports healthy after `system-upgrade`
//! (§4.E "Common-node sequence"). Rollback is a no-op (§4.F): health is
//! an assertion, not a mutation.

use super::{ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::{CoreError, Result};

pub struct HealthExecutor;

#[async_trait]
impl PhaseExecutor for HealthExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        if ctx.operator.health_check(&server).await? {
            Ok(())
        } else {
            Err(CoreError::PermanentOperational(format!(
                "{} reported unhealthy after upgrade",
                server.hostname
            )))
        }
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
