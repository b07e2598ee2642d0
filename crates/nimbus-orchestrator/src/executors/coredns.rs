//! `coredns` — provision DNS-related cluster resources, emitted only
//! when the plan's feature flags call for it (§4.E step 5). No declared
//! rollback; the resources are additive cluster configuration.

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

pub struct CorednsExecutor;

#[async_trait]
impl PhaseExecutor for CorednsExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        ctx.operator.provision_dns().await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
