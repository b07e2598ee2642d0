pub mod schema;
pub mod subscriptions;
pub mod types;

pub use schema::{build_schema, OrchestratorSchema};
