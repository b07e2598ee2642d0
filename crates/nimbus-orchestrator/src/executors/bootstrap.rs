//! `bootstrap` — parallel across all servers, bounded by `NumParallel`:
//! configure node, export the upgrade binary locally, pre-pull update
//! packages, sync the operation plan to the local backend (§4.E step 3).
//! Rollback is a no-op (§4.F).

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::{PackageRef, Phase, Server};
use nimbus_core::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapData {
    pub server: Server,
    pub packages: Vec<PackageRef>,
}

pub struct BootstrapExecutor;

#[async_trait]
impl PhaseExecutor for BootstrapExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let data: BootstrapData = serde_json::from_value(phase.data.clone())
            .map_err(nimbus_core::CoreError::Serde)?;
        ctx.operator.configure_node(&data.server).await?;
        ctx.operator.export_upgrade_binary(&data.server).await?;
        ctx.operator
            .pre_pull_packages(&data.server, &data.packages)
            .await?;
        ctx.operator.sync_operation_plan(&data.server).await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
