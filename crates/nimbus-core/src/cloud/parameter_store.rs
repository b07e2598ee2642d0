//! ParameterStore — the cloud parameter-store surface consumed by the
//! Discovery Publisher (§4.A, §4.B).

use crate::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Plain,
    Encrypted,
}

#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get(&self, name: &str, with_decryption: bool) -> Result<Option<String>>;

    async fn put(
        &self,
        name: &str,
        value: &str,
        kind: ParameterType,
        overwrite: bool,
    ) -> Result<()>;
}

pub mod mock {
    use super::*;
    use dashmap::DashMap;

    #[derive(Debug, Clone)]
    pub struct StoredValue {
        pub value: String,
        pub kind: ParameterType,
    }

    /// In-memory parameter store. `writes` is an append-only log of every
    /// `put` call, used by tests to assert PI3 (last write wins, unchanged
    /// values are not rewritten between force-resync intervals).
    #[derive(Default)]
    pub struct MockParameterStore {
        values: DashMap<String, StoredValue>,
        pub writes: DashMap<String, u64>,
    }

    impl MockParameterStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn write_count(&self, name: &str) -> u64 {
            self.writes.get(name).map(|v| *v).unwrap_or(0)
        }

        /// Simulate external mutation (§8 S6 "discovery drift").
        pub fn set_external(&self, name: &str, value: &str, kind: ParameterType) {
            self.values.insert(
                name.to_string(),
                StoredValue {
                    value: value.to_string(),
                    kind,
                },
            );
        }

        pub fn current(&self, name: &str) -> Option<String> {
            self.values.get(name).map(|v| v.value.clone())
        }
    }

    #[async_trait]
    impl ParameterStore for MockParameterStore {
        async fn get(&self, name: &str, _with_decryption: bool) -> Result<Option<String>> {
            Ok(self.values.get(name).map(|v| v.value.clone()))
        }

        async fn put(
            &self,
            name: &str,
            value: &str,
            kind: ParameterType,
            overwrite: bool,
        ) -> Result<()> {
            if !overwrite && self.values.contains_key(name) {
                return Ok(());
            }
            self.values.insert(
                name.to_string(),
                StoredValue {
                    value: value.to_string(),
                    kind,
                },
            );
            *self.writes.entry(name.to_string()).or_insert(0) += 1;
            Ok(())
        }
    }
}
