//! `endpoints` — wait for the control-plane service's endpoints to
//! settle, emitted only when the calling context requires it (the lead
//! master's second pass and non-lead masters, §4.E "Master sub-plan").
//! Rollback is a no-op (§4.F).

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;
use std::time::Duration;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EndpointsData {
    pub timeout_secs: u64,
}

pub struct EndpointsExecutor;

#[async_trait]
impl PhaseExecutor for EndpointsExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let data: EndpointsData =
            serde_json::from_value(phase.data.clone()).map_err(nimbus_core::CoreError::Serde)?;
        ctx.operator
            .wait_endpoints_ready(Duration::from_secs(data.timeout_secs))
            .await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
