//! ElectionChange — two disjoint sets of Servers used by the
//! election-change phase executor.

use super::server::Server;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionChange {
    pub enable: Vec<Server>,
    pub disable: Vec<Server>,
}

impl ElectionChange {
    pub fn new(enable: Vec<Server>, disable: Vec<Server>) -> Self {
        Self { enable, disable }
    }

    /// The `stepdown` phase: disable the lead master only.
    pub fn stepdown(lead_master: &Server) -> Self {
        Self {
            enable: vec![],
            disable: vec![lead_master.clone()],
        }
    }

    /// The `elect` phase: re-enable the lead master, disable every other
    /// master named in `others`.
    pub fn elect(lead_master: &Server, others: &[Server]) -> Self {
        Self {
            enable: vec![lead_master.clone()],
            disable: others.to_vec(),
        }
    }

    /// The common-node `enable` phase for a non-lead master.
    pub fn enable_one(server: &Server) -> Self {
        Self {
            enable: vec![server.clone()],
            disable: vec![],
        }
    }
}
