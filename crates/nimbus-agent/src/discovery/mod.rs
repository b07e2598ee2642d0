//! Discovery Publisher (§4.B). Three periodic tickers run as one
//! cooperative task: `publish` (republish only on change), `resync`
//! (unconditional republish, recovers from external mutation), and
//! `source_dest_check` (batch-reconcile the cloud source/destination
//! check across the cluster inventory).

use crate::state::SharedState;
use nimbus_core::cloud::ParameterType;
use nimbus_core::cloud::InstanceAttribute;
use nimbus_core::model::{service_param_name, token_param_name, DiscoveryRecord};
use nimbus_core::registry::resolve_service_url;
use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tokio::sync::RwLock;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The publisher's own memo of what it last wrote — instance-scoped, not
/// a process-wide singleton (§9 design note).
struct LastPublished {
    record: Option<DiscoveryRecord>,
}

pub struct DiscoveryPublisher {
    state: SharedState,
    last_published: RwLock<LastPublished>,
}

impl DiscoveryPublisher {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            last_published: RwLock::new(LastPublished { record: None }),
        }
    }

    /// Run the publisher loop until the state's cancellation token fires.
    /// One unconditional publish happens before the loop begins (§4.B).
    pub async fn run(self: Arc<Self>) {
        if let Err(e) = self.publish(true).await {
            error!("initial discovery publish failed: {}", e);
        }

        let cfg = &self.state.config.discovery;
        let mut publish_tick = time::interval(Duration::from_secs(cfg.publish_interval_secs));
        publish_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut resync_tick = time::interval(Duration::from_secs(cfg.resync_interval_secs));
        resync_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sdc_tick =
            time::interval(Duration::from_secs(cfg.source_dest_check_interval_secs));
        sdc_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = publish_tick.tick() => {
                    if let Err(e) = self.publish(false).await {
                        error!("discovery publish failed: {}", e);
                    }
                }
                _ = resync_tick.tick() => {
                    if let Err(e) = self.publish(true).await {
                        error!("discovery resync failed: {}", e);
                    }
                }
                _ = sdc_tick.tick() => {
                    if let Err(e) = self.reconcile_source_dest_check().await {
                        error!("source/destination-check reconcile failed: {}", e);
                    }
                }
                _ = self.state.cancel.cancelled() => {
                    info!("discovery publisher stopping on cancellation");
                    return;
                }
            }
        }
    }

    /// Resolve the current (token, serviceURL) and publish it. When
    /// `force` is false, values unchanged from the in-memory last-
    /// published record are not rewritten (PI3).
    async fn publish(&self, force: bool) -> nimbus_core::Result<()> {
        let service_url = resolve_service_url(
            self.state.service_registry.as_ref(),
            &self.state.config.service_registry.namespace,
            &self.state.config.service_registry.service_name,
            &self.state.config.service_registry.port_name,
        )
        .await?;

        let join_token = self.state.operator.get_expand_token().await?;

        let record = DiscoveryRecord {
            join_token,
            service_url,
        };

        let mut last = self.last_published.write().await;
        let changed = last.record.as_ref() != Some(&record);

        if !force && !changed {
            debug!("discovery record unchanged, skipping publish");
            return Ok(());
        }

        let cluster = &self.state.config.cluster_name;
        self.state
            .parameter_store
            .put(
                &token_param_name(cluster),
                &record.join_token,
                ParameterType::Encrypted,
                true,
            )
            .await?;
        self.state
            .parameter_store
            .put(
                &service_param_name(cluster),
                &record.service_url,
                ParameterType::Plain,
                true,
            )
            .await?;

        info!(
            "published discovery record: service_url={} (force={})",
            record.service_url, force
        );
        last.record = Some(record);
        Ok(())
    }

    /// Enumerate cluster servers in batches, re-disabling source/dest
    /// check on any instance found with it enabled (§4.B).
    async fn reconcile_source_dest_check(&self) -> nimbus_core::Result<()> {
        let site = self.state.operator.get_local_site().await?;
        let batch_size = self.state.config.discovery.source_dest_check_batch_size;

        for batch in site.servers.chunks(batch_size) {
            for server in batch {
                match self
                    .state
                    .instance_control
                    .describe(&server.instance_id)
                    .await
                {
                    Ok(Some(_instance)) => {
                        // `Instance` doesn't carry the source/dest-check
                        // flag itself (§3); `modify_attribute` is
                        // idempotent so we reassert it blind.
                        if let Err(e) = self
                            .state
                            .instance_control
                            .modify_attribute(
                                &server.instance_id,
                                InstanceAttribute::SourceDestCheck,
                                false,
                            )
                            .await
                        {
                            warn!(
                                "failed to disable source/dest check on {}: {}",
                                server.instance_id, e
                            );
                        }
                    }
                    Ok(None) => {
                        debug!("instance {} not found during reconcile", server.instance_id);
                    }
                    Err(e) => {
                        warn!("describe failed for {}: {}", server.instance_id, e);
                    }
                }
            }
        }
        Ok(())
    }
}
