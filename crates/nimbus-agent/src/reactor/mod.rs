//! Event Reactor (§4.C). Long-polls the message queue on a single-
//! threaded loop; termination events are handed off to a detached Shrink
//! Coordinator task so the receive loop itself never blocks on one.

use crate::shrink::ShrinkCoordinator;
use crate::state::SharedState;
use nimbus_core::cloud::InstanceAttribute;
use nimbus_core::model::{LifecycleEvent, LifecycleEventType, RawMessage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct EventReactor {
    state: SharedState,
}

impl EventReactor {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Blocks until the state's cancellation token fires.
    pub async fn run(self: Arc<Self>, queue_url: &str) {
        let cfg = &self.state.config.reactor;
        let max_messages = cfg.max_messages;
        let visibility_timeout = Duration::from_secs(cfg.visibility_timeout_secs);
        let long_poll = Duration::from_secs(cfg.long_poll_secs);

        loop {
            if self.state.cancel.is_cancelled() {
                info!("event reactor stopping on cancellation");
                return;
            }

            let received = self
                .state
                .queue
                .receive(
                    queue_url,
                    max_messages,
                    visibility_timeout,
                    long_poll,
                    &self.state.cancel,
                )
                .await;

            let messages = match received {
                Ok(messages) => messages,
                Err(e) => {
                    if self.state.cancel.is_cancelled() {
                        info!("event reactor stopping on cancellation");
                        return;
                    }
                    // Long-poll already provides backoff; no extra sleep.
                    error!("message queue receive failed: {}", e);
                    continue;
                }
            };

            for message in messages {
                self.dispatch(queue_url, message).await;
            }
        }
    }

    async fn dispatch(&self, queue_url: &str, raw: RawMessage) {
        let event = match LifecycleEvent::parse(&raw) {
            Ok(event) => event,
            Err(e) => {
                warn!("failed to parse lifecycle message: {}", e);
                self.ack(queue_url, &raw.receipt_handle).await;
                return;
            }
        };

        match event.event_type {
            LifecycleEventType::Launching => {
                if let Err(e) = self
                    .state
                    .instance_control
                    .modify_attribute(&event.instance_id, InstanceAttribute::SourceDestCheck, false)
                    .await
                {
                    // Loose coupling by design (§9 open question): the
                    // periodic reconciler in the Discovery Publisher
                    // retries this, so the error here is logged only.
                    warn!(
                        "failed to disable source/dest check on launch for {}: {}",
                        event.instance_id, e
                    );
                }
                self.ack(queue_url, &event.receipt_handle).await;
            }
            LifecycleEventType::Terminating => {
                let coordinator = ShrinkCoordinator::new(self.state.clone(), event.clone());
                tokio::spawn(async move {
                    coordinator.run().await;
                });
                self.ack(queue_url, &event.receipt_handle).await;
            }
            LifecycleEventType::Other => {
                debug!("ignoring lifecycle event of unknown type for {}", event.instance_id);
                self.ack(queue_url, &event.receipt_handle).await;
            }
        }
    }

    async fn ack(&self, queue_url: &str, receipt_handle: &str) {
        if let Err(e) = self.state.queue.delete(queue_url, receipt_handle).await {
            error!("failed to acknowledge message {}: {}", receipt_handle, e);
        }
    }
}
