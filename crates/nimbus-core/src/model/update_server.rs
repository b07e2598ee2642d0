//! UpdateServer — a Server augmented with package-update specifications.
//! Constructed once per plan by the Upgrade Plan Builder.

use super::server::Server;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
}

impl std::fmt::Display for PackageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateServer {
    pub server: Server,
    pub installed_runtime: PackageRef,
    pub update_runtime: Option<PackageRef>,
    pub update_config: Option<PackageRef>,
    pub installed_teleport: PackageRef,
    pub update_teleport: Option<PackageRef>,
}

impl UpdateServer {
    pub fn needs_runtime_update(&self) -> bool {
        self.update_runtime
            .as_ref()
            .is_some_and(|p| *p != self.installed_runtime)
    }

    pub fn needs_teleport_update(&self) -> bool {
        self.update_teleport
            .as_ref()
            .is_some_and(|p| *p != self.installed_teleport)
    }
}
