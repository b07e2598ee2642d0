//! `init` — run once on the lead master: rotate RPC credentials, create
//! the admin agent, persist the service user, update cluster
//! roles/DNS/docker config, then rotate secrets and configuration
//! packages for every server in the inventory (§4.E step 2).
//!
//! `Execute` is idempotent (`Executor::is_retryable_on_resume`).
//! `Rollback` removes every package that carries the operation ID label.

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::{Phase, Server};
use nimbus_core::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitData {
    pub inventory: Vec<Server>,
}

pub struct InitExecutor;

#[async_trait]
impl PhaseExecutor for InitExecutor {
    async fn pre_check(&self, ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        if !ctx.lead_master.role.is_master() {
            return Err(nimbus_core::CoreError::PermanentOperational(
                "init must run on the lead master".into(),
            ));
        }
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let data: InitData = serde_json::from_value(phase.data.clone())
            .map_err(nimbus_core::CoreError::Serde)?;

        ctx.operator.bootstrap_cluster_identity().await?;

        let mut labelled = Vec::new();
        for server in &data.inventory {
            ctx.operator.rotate_secrets(server).await?;
            let planet = ctx.operator.rotate_planet_config(server).await?;
            let teleport = ctx.operator.rotate_teleport_config(server).await?;
            ctx.operator
                .install_package(server, &planet, Some(&ctx.operation_id))
                .await?;
            ctx.operator
                .install_package(server, &teleport, Some(&ctx.operation_id))
                .await?;
            labelled.push(planet.to_string());
            labelled.push(teleport.to_string());
        }
        ctx.records.init_packages.insert(phase.id.clone(), labelled);
        Ok(())
    }

    async fn rollback(&self, ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        ctx.operator
            .remove_packages_by_label(&ctx.operation_id)
            .await
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
