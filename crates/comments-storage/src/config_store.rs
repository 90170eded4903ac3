//! File system storage for configuration

use async_trait::async_trait;
use comments_core::config::{lookup_path, LocalConfig, CONFIG_NAMESPACE};
use comments_core::error::{CommentsError, Result};
use comments_core::store::ConfigStore;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Remote configuration documents, one JSON file per key under
/// `<base>/config/<key>.json`
pub struct FileConfigStore {
    config_dir: PathBuf,
}

impl FileConfigStore {
    /// Create a new file system config store
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = base_dir.into().join("config");
        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)?;
            debug!("Created config directory: {:?}", config_dir);
        }
        Ok(Self { config_dir })
    }

    /// Get config directory
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.config_dir.join(format!("{}.json", key))
    }

    /// Store `doc` under `key` (write to temp, then rename)
    pub async fn put(&self, key: &str, doc: &Value) -> Result<()> {
        let final_path = self.document_path(key);
        let temp_path = self.config_dir.join(format!(".{}.json.tmp", key));

        fs::write(&temp_path, serde_json::to_vec_pretty(doc)?).await?;
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(CommentsError::Io(e));
        }
        debug!("Saved config document {} to {:?}", key, final_path);
        Ok(())
    }

    /// Remove the document under `key`, if any
    pub async fn remove(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.document_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CommentsError::Io(e)),
        }
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        match fs::read(self.document_path(key)).await {
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CommentsError::Io(e)),
        }
    }
}

/// Load the local static configuration from a TOML file.
///
/// The file is either a whole application tree carrying a
/// `[plugin.comments]` table, or just the engine section.
pub fn load_local_config(path: &Path) -> Result<LocalConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CommentsError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read config file {:?}: {}", path, e),
        ))
    })?;
    parse_local_config(&content)
}

/// Parse local configuration TOML; see [`load_local_config`]
pub fn parse_local_config(content: &str) -> Result<LocalConfig> {
    let tree: toml::Value =
        toml::from_str(content).map_err(|e| CommentsError::Toml(e.to_string()))?;
    let tree = serde_json::to_value(tree)?;

    if lookup_path(&tree, CONFIG_NAMESPACE).is_some() {
        Ok(LocalConfig::new(tree))
    } else {
        Ok(LocalConfig::namespaced(tree))
    }
}
