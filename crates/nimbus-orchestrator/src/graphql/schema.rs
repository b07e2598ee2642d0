use super::subscriptions::SubscriptionRoot;
use super::types::{PhaseProgress, PlanSummary};
use crate::error::ApiError;
use crate::state::AppState;
use async_graphql::{Context, EmptyMutation, Schema};
use nimbus_core::model::PhaseId;

pub type OrchestratorSchema = Schema<QueryRoot, EmptyMutation, SubscriptionRoot>;

pub struct QueryRoot;

#[async_graphql::Object]
impl QueryRoot {
    async fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    async fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    async fn plan_summary(&self, ctx: &Context<'_>) -> async_graphql::Result<PlanSummary> {
        let state = ctx.data::<AppState>()?;
        let progress = state.runner.progress_snapshot().await;
        Ok(PlanSummary::compute(state.runner.plan(), &progress))
    }

    /// Every phase in the plan, leaf and group alike, with its current
    /// progress.
    async fn phases(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<PhaseProgress>> {
        let state = ctx.data::<AppState>()?;
        let plan = state.runner.plan();
        let progress = state.runner.progress_snapshot().await;

        Ok(plan
            .arena
            .iter()
            .map(|(_, phase)| PhaseProgress::from_phase(plan, &progress, phase))
            .collect())
    }

    async fn phase(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<PhaseProgress> {
        let state = ctx.data::<AppState>()?;
        let plan = state.runner.plan();
        let progress = state.runner.progress_snapshot().await;

        PhaseProgress::lookup(plan, &progress, &PhaseId::new(id.clone()))
            .ok_or_else(|| ApiError::PhaseNotFound(id).extend())
    }
}

#[derive(async_graphql::SimpleObject)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

pub fn build_schema(state: AppState) -> OrchestratorSchema {
    let max_depth = state.config.graphql.max_depth;
    let max_complexity = state.config.graphql.max_complexity;

    Schema::build(QueryRoot, EmptyMutation, SubscriptionRoot)
        .data(state)
        .limit_depth(max_depth)
        .limit_complexity(max_complexity)
        .finish()
}
