//! Shared application state for the GraphQL observability API (§6),
//! mirroring the container platform's `AppState`.

use crate::config::OrchestratorConfig;
use crate::runner::PlanRunner;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<OrchestratorConfig>,
    pub runner: Arc<PlanRunner>,
}

impl AppState {
    pub fn new(config: Arc<OrchestratorConfig>, runner: Arc<PlanRunner>) -> Self {
        Self { config, runner }
    }
}
