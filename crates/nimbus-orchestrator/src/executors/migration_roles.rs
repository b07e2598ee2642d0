//! `migration/roles` — role format migration with a per-operation
//! backup, emitted only when the plan's role-migration feature flag is
//! set (§4.E step 8). Rollback restores roles from that backup (§4.F).

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

pub struct MigrationRolesExecutor;

#[async_trait]
impl PhaseExecutor for MigrationRolesExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let backup = ctx.operator.backup_roles().await?;
        ctx.records.role_backups.insert(phase.id.clone(), backup);
        ctx.operator.migrate_roles().await
    }

    async fn rollback(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        if let Some((_, backup)) = ctx.records.role_backups.remove(&phase.id) {
            ctx.operator.restore_roles(&backup).await?;
        }
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
