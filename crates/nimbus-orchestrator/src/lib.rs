//! Orchestrator library: the Upgrade Plan Builder (§4.E), Phase Executors
//! (§4.F) and Plan Runner (§4.G), plus a read-only GraphQL observability
//! layer (§6) over whatever plan the binary is currently driving.

pub mod config;
pub mod error;
pub mod executors;
pub mod graphql;
pub mod plan;
pub mod runner;
pub mod state;

pub use config::OrchestratorConfig;
pub use executors::{ExecutionContext, ExecutionRecords};
pub use plan::{build_plan, BuildPlanInput, FeatureFlags};
pub use runner::PlanRunner;
