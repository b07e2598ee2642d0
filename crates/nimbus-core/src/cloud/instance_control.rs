//! InstanceControl — the per-VM cloud control surface (§4.A), used to
//! disable source/destination check and to wait for termination.

use crate::error::Result;
use crate::model::{Instance, InstanceId};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceAttribute {
    SourceDestCheck,
}

#[async_trait]
pub trait InstanceControl: Send + Sync {
    async fn modify_attribute(
        &self,
        instance_id: &InstanceId,
        attr: InstanceAttribute,
        value: bool,
    ) -> Result<()>;

    /// `Ok(None)` models the "instance not found" case rather than an
    /// error — callers (e.g. the shrink coordinator's `ensureTerminated`
    /// step) treat a vanished instance as already-done, not a failure.
    async fn describe(&self, instance_id: &InstanceId) -> Result<Option<Instance>>;

    async fn wait_terminated(&self, instance_id: &InstanceId, deadline: Duration) -> Result<()>;
}

pub mod mock {
    use super::*;
    use crate::error::CoreError;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, Clone)]
    pub struct MockInstance {
        pub instance: Instance,
        pub source_dest_check: bool,
        pub terminated: bool,
    }

    #[derive(Default)]
    pub struct MockInstanceControl {
        instances: DashMap<String, MockInstance>,
        /// Records every `modify_attribute(SourceDestCheck, false)` call
        /// for assertions, keyed by instance id.
        pub modify_calls: DashMap<String, u64>,
        became_terminated: AtomicBool,
    }

    impl MockInstanceControl {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed(&self, instance: Instance, source_dest_check: bool) {
            self.instances.insert(
                instance.id.0.clone(),
                MockInstance {
                    instance,
                    source_dest_check,
                    terminated: false,
                },
            );
        }

        pub fn mark_terminated(&self, id: &InstanceId) {
            if let Some(mut e) = self.instances.get_mut(&id.0) {
                e.terminated = true;
                self.became_terminated.store(true, Ordering::SeqCst);
            }
        }

        pub fn source_dest_check_enabled(&self, id: &InstanceId) -> Option<bool> {
            self.instances.get(&id.0).map(|e| e.source_dest_check)
        }
    }

    #[async_trait]
    impl InstanceControl for MockInstanceControl {
        async fn modify_attribute(
            &self,
            instance_id: &InstanceId,
            attr: InstanceAttribute,
            value: bool,
        ) -> Result<()> {
            match attr {
                InstanceAttribute::SourceDestCheck => {
                    if let Some(mut e) = self.instances.get_mut(&instance_id.0) {
                        e.source_dest_check = value;
                    }
                    *self.modify_calls.entry(instance_id.0.clone()).or_insert(0) += 1;
                }
            }
            Ok(())
        }

        async fn describe(&self, instance_id: &InstanceId) -> Result<Option<Instance>> {
            Ok(self
                .instances
                .get(&instance_id.0)
                .filter(|e| !e.terminated)
                .map(|e| e.instance.clone()))
        }

        async fn wait_terminated(&self, instance_id: &InstanceId, deadline: Duration) -> Result<()> {
            let deadline_at = tokio::time::Instant::now() + deadline;
            loop {
                let terminated = self
                    .instances
                    .get(&instance_id.0)
                    .map(|e| e.terminated)
                    .unwrap_or(true); // vanished == done, per trait contract
                if terminated {
                    return Ok(());
                }
                if tokio::time::Instant::now() >= deadline_at {
                    return Err(CoreError::Transient(format!(
                        "instance {} did not terminate before deadline",
                        instance_id
                    )));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}
