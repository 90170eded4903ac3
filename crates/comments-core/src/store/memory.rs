//! In-memory stores for testing

use super::{ConfigStore, RecordStore};
use crate::error::{CommentsError, Result};
use crate::query::{Criteria, Filter};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

/// Injected failures
#[derive(Debug, Default)]
struct Faults {
    /// Queries carrying this equality filter fail
    fail_on: Vec<(String, Value)>,
    /// Every query on these collections fails
    failing_collections: Vec<String>,
    /// Updates touch at most this many records
    update_cap: Option<usize>,
}

/// In-memory record store with fault injection
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    faults: RwLock<Faults>,
    calls: Mutex<Vec<String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one pre-filled collection
    pub fn with_records(collection: &str, records: Vec<Value>) -> Self {
        let store = Self::new();
        store.insert(collection, records);
        store
    }

    /// Append records to a collection
    pub fn insert(&self, collection: &str, records: Vec<Value>) {
        let mut collections = self.collections.write().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(records);
    }

    /// Snapshot of a collection
    pub fn records(&self, collection: &str) -> Vec<Value> {
        let collections = self.collections.read().unwrap();
        collections.get(collection).cloned().unwrap_or_default()
    }

    /// Fail every query carrying `field = value`
    pub fn fail_on(&self, field: &str, value: Value) {
        self.faults
            .write()
            .unwrap()
            .fail_on
            .push((field.to_string(), value));
    }

    /// Fail every query against `collection`
    pub fn fail_collection(&self, collection: &str) {
        self.faults
            .write()
            .unwrap()
            .failing_collections
            .push(collection.to_string());
    }

    /// Limit how many records a single update touches
    pub fn cap_updates(&self, cap: usize) {
        self.faults.write().unwrap().update_cap = Some(cap);
    }

    /// Logged operations as `op:collection`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, op: &str, collection: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", op, collection));
    }

    fn check_faults(&self, collection: &str, criteria: &Criteria) -> Result<()> {
        let faults = self.faults.read().unwrap();
        if faults.failing_collections.iter().any(|c| c == collection) {
            return Err(CommentsError::Store(format!(
                "injected failure on collection {}",
                collection
            )));
        }
        for filter in &criteria.filters {
            if let Filter::Eq(field, value) = filter {
                if faults.fail_on.iter().any(|(f, v)| f == field && v == value) {
                    return Err(CommentsError::Store(format!(
                        "injected failure on {} = {}",
                        field, value
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_one(&self, collection: &str, criteria: &Criteria) -> Result<Option<Value>> {
        self.record_call("find_one", collection);
        self.check_faults(collection, criteria)?;
        Ok(criteria.apply(self.records(collection)).into_iter().next())
    }

    async fn find_many(&self, collection: &str, criteria: &Criteria) -> Result<Vec<Value>> {
        self.record_call("find_many", collection);
        self.check_faults(collection, criteria)?;
        Ok(criteria.apply(self.records(collection)))
    }

    async fn find_with_count(
        &self,
        collection: &str,
        criteria: &Criteria,
    ) -> Result<(Vec<Value>, u64)> {
        self.record_call("find_with_count", collection);
        self.check_faults(collection, criteria)?;
        let records = self.records(collection);
        let total = criteria.count(&records);
        Ok((criteria.apply(records), total))
    }

    async fn count(&self, collection: &str, criteria: &Criteria) -> Result<u64> {
        self.record_call("count", collection);
        self.check_faults(collection, criteria)?;
        Ok(criteria.count(&self.records(collection)))
    }

    async fn update_many(
        &self,
        collection: &str,
        criteria: &Criteria,
        patch: &Map<String, Value>,
    ) -> Result<Vec<Value>> {
        self.record_call("update_many", collection);
        self.check_faults(collection, criteria)?;
        let cap = self.faults.read().unwrap().update_cap.unwrap_or(usize::MAX);

        let mut collections = self.collections.write().unwrap();
        let records = collections.entry(collection.to_string()).or_default();
        let mut updated = Vec::new();
        for record in records.iter_mut().filter(|r| criteria.matches(r)) {
            if updated.len() >= cap {
                break;
            }
            if let Value::Object(map) = record {
                for (key, value) in patch {
                    map.insert(key.clone(), value.clone());
                }
            }
            updated.push(record.clone());
        }
        Ok(updated)
    }
}

/// In-memory configuration store
#[derive(Default)]
pub struct MemoryConfigStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryConfigStore {
    /// Create a store without a remote document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `doc` as the remote document
    pub fn with_document(doc: Value) -> Self {
        let store = Self::new();
        store
            .documents
            .write()
            .unwrap()
            .insert(crate::config::REMOTE_CONFIG_KEY.to_string(), doc);
        store
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.documents.read().unwrap().get(key).cloned())
    }
}
