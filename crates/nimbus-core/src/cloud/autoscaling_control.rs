//! AutoscalingControl — the cloud lifecycle-hook heartbeat/completion
//! surface (§4.A), the protocol the Shrink Coordinator must speak to hold
//! and then release a termination hook.

use crate::error::Result;
use crate::model::InstanceId;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    Continue,
    Abandon,
}

#[async_trait]
pub trait AutoscalingControl: Send + Sync {
    async fn heartbeat(
        &self,
        group: &str,
        hook: &str,
        instance_id: &InstanceId,
        token: &str,
    ) -> Result<()>;

    async fn complete(
        &self,
        group: &str,
        hook: &str,
        instance_id: &InstanceId,
        token: &str,
        result: HookResult,
    ) -> Result<()>;
}

pub mod mock {
    use super::*;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompleteCall {
        pub result: HookResult,
    }

    /// Records heartbeats and completions per instance so tests can
    /// assert PI1 (exactly one `Force=false` shrink request followed by
    /// at most one `Force=true` request maps 1:1 onto at most one final
    /// `complete` call here) and the §8 S2/S3 hook-release expectations.
    #[derive(Default)]
    pub struct MockAutoscalingControl {
        pub heartbeats: DashMap<String, u64>,
        pub completions: DashMap<String, Vec<HookResult>>,
        heartbeat_count: AtomicU64,
    }

    impl MockAutoscalingControl {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn heartbeat_count(&self) -> u64 {
            self.heartbeat_count.load(Ordering::SeqCst)
        }

        pub fn completions_for(&self, instance_id: &InstanceId) -> Vec<HookResult> {
            self.completions
                .get(&instance_id.0)
                .map(|v| v.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl AutoscalingControl for MockAutoscalingControl {
        async fn heartbeat(
            &self,
            _group: &str,
            _hook: &str,
            instance_id: &InstanceId,
            _token: &str,
        ) -> Result<()> {
            *self.heartbeats.entry(instance_id.0.clone()).or_insert(0) += 1;
            self.heartbeat_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn complete(
            &self,
            _group: &str,
            _hook: &str,
            instance_id: &InstanceId,
            _token: &str,
            result: HookResult,
        ) -> Result<()> {
            self.completions
                .entry(instance_id.0.clone())
                .or_default()
                .push(result);
            Ok(())
        }
    }
}
