//! MessageQueue — the cloud message-queue surface consumed by the Event
//! Reactor (§4.A, §4.C).

use crate::error::Result;
use crate::model::RawMessage;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: u32,
        visibility_timeout: Duration,
        long_poll: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawMessage>>;

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<()>;

    async fn resolve_url(&self, queue_name: &str) -> Result<String>;
}

pub mod mock {
    use super::*;
    use crate::error::CoreError;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Inner {
        pending: VecDeque<RawMessage>,
        deleted: Vec<String>,
    }

    /// In-memory message queue: `push` seeds messages, `receive` drains up
    /// to `max_messages` at a time, `deleted` records acknowledgements for
    /// assertions (PI2: a message is always acknowledged after dispatch).
    pub struct MockMessageQueue {
        inner: Mutex<Inner>,
    }

    impl MockMessageQueue {
        pub fn new() -> Self {
            Self {
                inner: Mutex::new(Inner::default()),
            }
        }

        pub async fn push(&self, msg: RawMessage) {
            self.inner.lock().await.pending.push_back(msg);
        }

        pub async fn deleted_handles(&self) -> Vec<String> {
            self.inner.lock().await.deleted.clone()
        }
    }

    impl Default for MockMessageQueue {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl MessageQueue for MockMessageQueue {
        async fn receive(
            &self,
            _queue_url: &str,
            max_messages: u32,
            _visibility_timeout: Duration,
            _long_poll: Duration,
            cancel: &CancellationToken,
        ) -> Result<Vec<RawMessage>> {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
            let mut inner = self.inner.lock().await;
            let mut out = Vec::new();
            while out.len() < max_messages as usize {
                match inner.pending.pop_front() {
                    Some(m) => out.push(m),
                    None => break,
                }
            }
            Ok(out)
        }

        async fn delete(&self, _queue_url: &str, receipt_handle: &str) -> Result<()> {
            self.inner.lock().await.deleted.push(receipt_handle.to_string());
            Ok(())
        }

        async fn resolve_url(&self, queue_name: &str) -> Result<String> {
            Ok(format!("https://queue.mock/{queue_name}"))
        }
    }
}
