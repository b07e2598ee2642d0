//! `migration/links` — create trusted-cluster links, emitted only when
//! the plan's link-migration feature flag is set (§4.E step 8).
//! Rollback deletes every trusted cluster created during the phase
//! (§4.F).

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationLinksData {
    pub trusted_clusters: Vec<String>,
}

pub struct MigrationLinksExecutor;

#[async_trait]
impl PhaseExecutor for MigrationLinksExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let data: MigrationLinksData = serde_json::from_value(phase.data.clone())
            .map_err(nimbus_core::CoreError::Serde)?;
        let mut created = Vec::new();
        for name in &data.trusted_clusters {
            ctx.operator.create_trusted_cluster(name).await?;
            created.push(name.clone());
        }
        ctx.records
            .created_trusted_clusters
            .insert(phase.id.clone(), created);
        Ok(())
    }

    async fn rollback(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        if let Some((_, created)) = ctx.records.created_trusted_clusters.remove(&phase.id) {
            for name in created {
                ctx.operator.delete_trusted_cluster(&name).await?;
            }
        }
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
