//! `election-change` — write election keys then wait for the
//! coordination store to agree on a leader consistent with the change
//! (§4.F "Key executor details"). Rollback applies the inverse mapping
//! and waits again for stabilisation.

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::{ElectionChange, Phase, Server};
use nimbus_core::{CoreError, Result};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionChangeData {
    pub change: ElectionChange,
    pub known: Vec<Server>,
}

impl ElectionChangeData {
    fn inverse(&self) -> Self {
        Self {
            change: ElectionChange {
                enable: self.change.disable.clone(),
                disable: self.change.enable.clone(),
            },
            known: self.known.clone(),
        }
    }
}

pub struct ElectionChangeExecutor;

#[async_trait]
impl PhaseExecutor for ElectionChangeExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let data: ElectionChangeData =
            serde_json::from_value(phase.data.clone()).map_err(CoreError::Serde)?;
        apply_and_wait(ctx, &data).await
    }

    async fn rollback(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let data: ElectionChangeData =
            serde_json::from_value(phase.data.clone()).map_err(CoreError::Serde)?;
        apply_and_wait(ctx, &data.inverse()).await
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}

/// Leader satisfies `data.change` once it matches one of `enable`
/// (the `elect` variant) or, absent any `enable` target, is simply not
/// one of `disable` (the `stepdown` variant).
fn satisfied(data: &ElectionChangeData, leader: &Option<Server>) -> bool {
    match leader {
        Some(l) if !data.change.enable.is_empty() => data
            .change
            .enable
            .iter()
            .any(|s| s.instance_id == l.instance_id),
        Some(l) => !data
            .change
            .disable
            .iter()
            .any(|s| s.instance_id == l.instance_id),
        None => false,
    }
}

async fn apply_and_wait(ctx: &ExecutionContext, data: &ElectionChangeData) -> Result<()> {
    for server in &data.change.disable {
        ctx.coordination
            .set_election(&ctx.cluster_name, server, false)
            .await?;
    }
    for server in &data.change.enable {
        ctx.coordination
            .set_election(&ctx.cluster_name, server, true)
            .await?;
    }

    let start = Instant::now();
    loop {
        let leader = ctx
            .coordination
            .resolve_leader(&ctx.cluster_name, &data.known)
            .await?;
        if satisfied(data, &leader) {
            return Ok(());
        }
        if start.elapsed() >= ctx.election_retry_budget {
            return Err(CoreError::PermanentOperational(
                "election did not stabilise within budget".into(),
            ));
        }
        tokio::select! {
            _ = tokio::time::sleep(ctx.election_retry_interval) => {}
            _ = ctx.cancel.cancelled() => return Err(CoreError::Cancelled),
        }
    }
}
