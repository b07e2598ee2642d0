//! `early-runtime-dns` — update only the DNS application package ahead
//! of the main runtime roll, emitted only when the plan's feature flags
//! call for it (§4.E step 6). `Execute` is idempotent (a package install
//! is safely repeatable); no declared rollback.

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::{PackageRef, Phase};
use nimbus_core::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyRuntimeDnsData {
    pub dns_package: PackageRef,
}

pub struct EarlyRuntimeDnsExecutor;

#[async_trait]
impl PhaseExecutor for EarlyRuntimeDnsExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let data: EarlyRuntimeDnsData = serde_json::from_value(phase.data.clone())
            .map_err(nimbus_core::CoreError::Serde)?;
        ctx.operator
            .install_package(&ctx.lead_master, &data.dns_package, None)
            .await
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
