//! Cluster coordination store (§6): the etcd-equivalent backing the
//! election keys the `election-change` phase reads and writes. In the
//! real deployment this shells out to an etcd client binary; that detail
//! is out of scope (§1), so this crate only defines the narrow interface.

use crate::error::Result;
use crate::model::Server;
use async_trait::async_trait;

#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Write `true`/`false` to the per-server election key.
    async fn set_election(&self, cluster_name: &str, server: &Server, enabled: bool) -> Result<()>;

    /// Resolve the current leader by DNS lookup against the cluster's
    /// internal DNS address, then match the resolved advertise-ip
    /// against `known`. Returns `None` if no leader currently resolves,
    /// or the resolved ip does not match any server in `known`.
    async fn resolve_leader(
        &self,
        cluster_name: &str,
        known: &[Server],
    ) -> Result<Option<Server>>;
}

pub mod mock {
    use super::*;
    use dashmap::DashMap;
    use tokio::sync::RwLock;

    /// In-memory coordination store. The "leader" is whichever server
    /// was most recently `set_election(enabled=true)`'d — a stand-in for
    /// DNS-based resolution driven by which election keys are `true`.
    #[derive(Default)]
    pub struct MockCoordinationStore {
        enabled: DashMap<String, bool>,
        order: RwLock<Vec<String>>,
    }

    impl MockCoordinationStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn key(server: &Server) -> String {
            server.advertise_ip.clone()
        }
    }

    #[async_trait]
    impl CoordinationStore for MockCoordinationStore {
        async fn set_election(
            &self,
            _cluster_name: &str,
            server: &Server,
            enabled: bool,
        ) -> Result<()> {
            let key = Self::key(server);
            self.enabled.insert(key.clone(), enabled);
            let mut order = self.order.write().await;
            order.retain(|k| k != &key);
            if enabled {
                order.push(key);
            }
            Ok(())
        }

        async fn resolve_leader(
            &self,
            _cluster_name: &str,
            known: &[Server],
        ) -> Result<Option<Server>> {
            let order = self.order.read().await;
            Ok(order
                .last()
                .and_then(|ip| known.iter().find(|s| &s.advertise_ip == ip).cloned()))
        }
    }
}
