//! `app` — upgrade the end-user application (§4.E step 13). Rollback
//! runs the application's rollback and post-rollback hooks (§4.F).

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::{PackageRef, Phase};
use nimbus_core::operator::AppHook;
use nimbus_core::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppData {
    pub package: PackageRef,
}

pub struct AppExecutor;

#[async_trait]
impl PhaseExecutor for AppExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let data: AppData =
            serde_json::from_value(phase.data.clone()).map_err(nimbus_core::CoreError::Serde)?;
        ctx.operator
            .install_package(&ctx.lead_master, &data.package, None)
            .await
    }

    async fn rollback(&self, ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        ctx.operator.run_app_hook(AppHook::Rollback).await?;
        ctx.operator.run_app_hook(AppHook::PostRollback).await
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
