//! Shared per-device key/value stores
//!
//! A simulated device owns two stores: telemetry-like state and
//! metadata-like properties. Both outlive any single invocation and are
//! shared across concurrently running invocations, so every snapshot and
//! every batch of writes goes through the store's own lock. A snapshot
//! reader never observes a partially applied batch.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::engine::normalize::UpdateSet;

/// Host-native mapping of string keys to values.
pub type ValueMap = HashMap<String, Value>;

/// A named, lock-guarded key/value store owned by one simulated device.
pub struct DeviceStore {
    name: String,
    values: Mutex<ValueMap>,
}

impl DeviceStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_values(name, ValueMap::new())
    }

    pub fn with_values(
        name: impl Into<String>,
        values: ValueMap,
    ) -> Self {
        Self {
            name: name.into(),
            values: Mutex::new(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full copy of the current contents, taken under the store lock.
    pub fn snapshot(&self) -> ValueMap {
        self.values.lock().clone()
    }

    /// Read one key.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    /// Write one key.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: Value,
    ) {
        self.values.lock().insert(key.into(), value);
    }

    /// Apply a whole update set under one lock acquisition. Concurrent
    /// writers to the same device interleave at batch granularity, never
    /// below a single key assignment.
    pub fn apply(
        &self,
        updates: &UpdateSet,
    ) {
        if updates.is_empty() {
            return;
        }
        let mut values = self.values.lock();
        for (key, value) in updates {
            values.insert(key.clone(), value.clone());
        }
        debug!("{} changed: {} keys applied", self.name, updates.len());
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}
