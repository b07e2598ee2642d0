//! Upgrade Plan Builder (§4.E): turns a cluster inventory, manifest pair
//! and feature-flag set into an immutable `Plan`.

pub mod builder;

pub use builder::{build_plan, BuildPlanInput, FeatureFlags};
