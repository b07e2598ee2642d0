//! `config` — pull the rotated teleport-equivalent configuration for
//! one node (§4.E step 11). `Execute` is idempotent
//! (`Executor::is_retryable_on_resume`). Rollback deletes the pulled
//! master-config packages by label (§4.F, grouped under the `app`
//! bullet but scoped to this phase).

use super::{ExecutionContext, PhaseExecutor, ServerPhaseData};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

fn label(operation_id: &str, phase: &Phase) -> String {
    format!("config-pull:{operation_id}:{}", phase.id)
}

pub struct ConfigPullExecutor;

#[async_trait]
impl PhaseExecutor for ConfigPullExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let server = ServerPhaseData::from_phase(phase)?;
        let package = ctx.operator.rotate_teleport_config(&server).await?;
        let label = label(&ctx.operation_id, phase);
        ctx.operator
            .install_package(&server, &package, Some(&label))
            .await?;
        ctx.records
            .config_pull_packages
            .insert(phase.id.clone(), vec![package.to_string()]);
        Ok(())
    }

    async fn rollback(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        ctx.operator
            .remove_packages_by_label(&label(&ctx.operation_id, phase))
            .await
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
