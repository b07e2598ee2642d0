//! Server — a cluster member. Created at install, mutated only when
//! role/metadata change, destroyed by shrink.

use super::instance::InstanceId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterRole {
    Master,
    Node,
}

impl ClusterRole {
    pub fn is_master(&self) -> bool {
        matches!(self, ClusterRole::Master)
    }
}

impl fmt::Display for ClusterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterRole::Master => write!(f, "master"),
            ClusterRole::Node => write!(f, "node"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub instance_id: InstanceId,
    pub hostname: String,
    pub advertise_ip: String,
    pub role: ClusterRole,
}

impl Server {
    pub fn new(
        instance_id: impl Into<InstanceId>,
        hostname: impl Into<String>,
        advertise_ip: impl Into<String>,
        role: ClusterRole,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            hostname: hostname.into(),
            advertise_ip: advertise_ip.into(),
            role,
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.hostname, self.role)
    }
}
