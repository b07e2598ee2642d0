//! Organizational phases that exist only to group children (§4.E). They
//! carry no work of their own; the Plan Runner still calls all four
//! operations on them, so each is a deliberate no-op.

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::Phase;
use nimbus_core::Result;

pub struct GroupExecutor;

#[async_trait]
impl PhaseExecutor for GroupExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn rollback(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
