//! File system storage for records

use async_trait::async_trait;
use comments_core::error::{CommentsError, Result};
use comments_core::query::Criteria;
use comments_core::store::RecordStore;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// File system based record store.
///
/// Each collection is one JSON array in `<base>/collections/<name>.json`.
/// Writes go through a temp file and a rename.
pub struct JsonFileStore {
    /// Collections subdirectory
    collections_dir: PathBuf,
    /// Serializes read-modify-write cycles
    lock: RwLock<()>,
}

impl JsonFileStore {
    /// Create a new file system store
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let collections_dir = base_dir.into().join("collections");

        if !collections_dir.exists() {
            std::fs::create_dir_all(&collections_dir).map_err(|e| {
                CommentsError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create collections directory: {}", e),
                ))
            })?;
            debug!("Created collections directory: {:?}", collections_dir);
        }

        Ok(Self {
            collections_dir,
            lock: RwLock::new(()),
        })
    }

    /// Get collections directory
    pub fn collections_dir(&self) -> &Path {
        &self.collections_dir
    }

    /// Get the path for a collection file
    fn collection_path(&self, collection: &str) -> PathBuf {
        self.collections_dir
            .join(format!("{}.json", file_stem(collection)))
    }

    /// Get a temporary path for atomic writes
    fn temp_path(&self, collection: &str) -> PathBuf {
        self.collections_dir
            .join(format!(".{}.json.tmp", file_stem(collection)))
    }

    /// Load a collection; a missing file is an empty collection
    async fn read_collection(&self, collection: &str) -> Result<Vec<Value>> {
        let path = self.collection_path(collection);
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CommentsError::Io(e)),
        };

        match serde_json::from_slice(&content)? {
            Value::Array(records) => Ok(records),
            _ => Err(CommentsError::Store(format!(
                "Collection file {:?} does not hold an array",
                path
            ))),
        }
    }

    /// Write collection atomically (write to temp, then rename)
    async fn write_collection(&self, collection: &str, records: &[Value]) -> Result<()> {
        let temp_path = self.temp_path(collection);
        let final_path = self.collection_path(collection);

        let content = serde_json::to_vec_pretty(records)?;
        fs::write(&temp_path, content).await.map_err(|e| {
            CommentsError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write temp file: {}", e),
            ))
        })?;

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(CommentsError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file: {}", e),
            )));
        }

        debug!("Saved {} records to {:?}", records.len(), final_path);
        Ok(())
    }

    /// Append one record, assigning the next numeric id when it has none.
    ///
    /// The id is picked while the write lock is held, so concurrent callers
    /// on this store never receive the same id.
    pub async fn create(&self, collection: &str, mut record: Value) -> Result<Value> {
        let _guard = self.lock.write().await;
        let mut records = self.read_collection(collection).await?;

        let Value::Object(fields) = &mut record else {
            return Err(CommentsError::Store(format!(
                "Cannot store a non-object record in '{}'",
                collection
            )));
        };
        if fields.get("id").map_or(true, Value::is_null) {
            let next = records
                .iter()
                .filter_map(|r| r.get("id").and_then(Value::as_i64))
                .max()
                .unwrap_or(0)
                + 1;
            fields.insert("id".to_string(), Value::from(next));
        }

        records.push(record.clone());
        self.write_collection(collection, &records).await?;
        debug!(collection, id = %record["id"], "created record");
        Ok(record)
    }

    /// Collections present on disk
    pub async fn collections(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.collections_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // Skip temp files and anything that is not a collection
            if name.starts_with('.') || !name.ends_with(".json") {
                continue;
            }
            match name.strip_suffix(".json") {
                Some(stem) => names.push(collection_name(stem)),
                None => warn!("Skipping unexpected file {:?}", path),
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Collection ids contain `::`, which is not portable in file names
fn file_stem(collection: &str) -> String {
    collection.replace("::", "__")
}

fn collection_name(stem: &str) -> String {
    stem.replace("__", "::")
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn find_one(&self, collection: &str, criteria: &Criteria) -> Result<Option<Value>> {
        let _guard = self.lock.read().await;
        let records = self.read_collection(collection).await?;
        Ok(criteria.apply(records).into_iter().next())
    }

    async fn find_many(&self, collection: &str, criteria: &Criteria) -> Result<Vec<Value>> {
        let _guard = self.lock.read().await;
        let records = self.read_collection(collection).await?;
        Ok(criteria.apply(records))
    }

    async fn find_with_count(
        &self,
        collection: &str,
        criteria: &Criteria,
    ) -> Result<(Vec<Value>, u64)> {
        let _guard = self.lock.read().await;
        let records = self.read_collection(collection).await?;
        let total = criteria.count(&records);
        Ok((criteria.apply(records), total))
    }

    async fn count(&self, collection: &str, criteria: &Criteria) -> Result<u64> {
        let _guard = self.lock.read().await;
        let records = self.read_collection(collection).await?;
        Ok(criteria.count(&records))
    }

    async fn update_many(
        &self,
        collection: &str,
        criteria: &Criteria,
        patch: &Map<String, Value>,
    ) -> Result<Vec<Value>> {
        let _guard = self.lock.write().await;
        let mut records = self.read_collection(collection).await?;

        let mut updated = Vec::new();
        for record in records.iter_mut().filter(|r| criteria.matches(r)) {
            if let Value::Object(map) = record {
                for (key, value) in patch {
                    map.insert(key.clone(), value.clone());
                }
                updated.push(record.clone());
            }
        }

        if !updated.is_empty() {
            self.write_collection(collection, &records).await?;
        }
        debug!(collection, updated = updated.len(), "updated records");
        Ok(updated)
    }
}
