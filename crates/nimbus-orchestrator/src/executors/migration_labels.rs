//! `migration/labels` — role-format label migration, emitted only when
//! the plan's role-migration feature flag is set (§4.E step 8).
//! `Execute` is idempotent (`Executor::is_retryable_on_resume`); rollback
//! is a no-op (§4.F).

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

pub struct MigrationLabelsExecutor;

#[async_trait]
impl PhaseExecutor for MigrationLabelsExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        ctx.operator.migrate_role_labels().await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
