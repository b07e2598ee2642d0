//! Instance — cloud VM abstraction read once from the instance-metadata
//! service on startup, immutable thereafter.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        InstanceId(s.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(s: String) -> Self {
        InstanceId(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub private_ipv4: String,
    pub public_ipv4: Option<String>,
    pub private_dns_name: String,
    pub region: String,
    pub tags: HashMap<String, String>,
}

impl Instance {
    pub fn new(
        id: impl Into<InstanceId>,
        private_ipv4: impl Into<String>,
        private_dns_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            private_ipv4: private_ipv4.into(),
            public_ipv4: None,
            private_dns_name: private_dns_name.into(),
            region: region.into(),
            tags: HashMap::new(),
        }
    }
}
