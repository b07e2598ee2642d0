use super::types::{PhaseProgress, PlanSummary};
use crate::error::ApiError;
use crate::state::AppState;
use async_graphql::{Context, Result, Subscription};
use futures::{Stream, StreamExt};
use nimbus_core::model::PhaseId;
use tokio_stream::wrappers::WatchStream;

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Stream progress for a single phase every time the Plan Runner
    /// persists an update.
    async fn phase_updates(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> Result<impl Stream<Item = Result<PhaseProgress>>> {
        let state = ctx.data::<AppState>()?;
        let phase_id = PhaseId::new(id.clone());

        if state.runner.plan().phase(&phase_id).is_none() {
            return Err(ApiError::PhaseNotFound(id).extend());
        }

        let runner = state.runner.clone();
        let rx = state.runner.subscribe_progress();

        Ok(WatchStream::new(rx).map(move |progress| {
            PhaseProgress::lookup(runner.plan(), &progress, &phase_id)
                .ok_or_else(|| ApiError::PhaseNotFound(phase_id.to_string()).extend())
        }))
    }

    /// Stream the aggregate plan summary every time any phase changes.
    async fn plan_summary_stream(
        &self,
        ctx: &Context<'_>,
    ) -> Result<impl Stream<Item = Result<PlanSummary>>> {
        let state = ctx.data::<AppState>()?;
        let runner = state.runner.clone();
        let rx = state.runner.subscribe_progress();

        Ok(WatchStream::new(rx).map(move |progress| Ok(PlanSummary::compute(runner.plan(), &progress))))
    }
}
