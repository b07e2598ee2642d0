//! `runtime` — upgrade the remaining system applications on a node,
//! with the RBAC-bootstrap package first (§4.E step 12; the builder
//! orders `packages` accordingly). No declared rollback.

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::{PackageRef, Phase};
use nimbus_core::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeData {
    pub server: nimbus_core::model::Server,
    pub packages: Vec<PackageRef>,
}

pub struct RuntimeExecutor;

#[async_trait]
impl PhaseExecutor for RuntimeExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let data: RuntimeData =
            serde_json::from_value(phase.data.clone()).map_err(nimbus_core::CoreError::Serde)?;
        for package in &data.packages {
            ctx.operator
                .install_package(&data.server, package, None)
                .await?;
        }
        Ok(())
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
