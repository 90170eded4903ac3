//! comments-storage - Storage library for the comments engine
//!
//! This crate provides file-backed implementations of the record and
//! configuration stores, plus loading of the local static configuration.

mod config_store;
mod record_store;

pub use config_store::{load_local_config, parse_local_config, FileConfigStore};
pub use record_store::JsonFileStore;

use comments_core::config::{ConfigResolver, LocalConfig};
use comments_core::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Local configuration file name inside a data directory
pub const LOCAL_CONFIG_FILE: &str = "comments.toml";

/// Data directory holding collections, the remote config document and the
/// local configuration file
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default directory (platform data dir, or ~/.comments)
    pub fn default_location() -> Self {
        let root = directories::ProjectDirs::from("com", "comments", "comments")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".comments")
            });
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the local configuration file
    pub fn local_config_path(&self) -> PathBuf {
        self.root.join(LOCAL_CONFIG_FILE)
    }

    /// Open the record store
    pub fn record_store(&self) -> Result<JsonFileStore> {
        JsonFileStore::new(&self.root)
    }

    /// Open the remote configuration store
    pub fn config_store(&self) -> Result<FileConfigStore> {
        FileConfigStore::new(&self.root)
    }

    /// Local configuration; empty when the file does not exist
    pub fn local_config(&self) -> Result<LocalConfig> {
        let path = self.local_config_path();
        if path.exists() {
            load_local_config(&path)
        } else {
            debug!("No local config at {:?}", path);
            Ok(LocalConfig::default())
        }
    }

    /// Resolver over this directory's remote document and local file
    pub fn resolver(&self) -> Result<ConfigResolver> {
        Ok(ConfigResolver::new(
            Arc::new(self.config_store()?),
            self.local_config()?,
        ))
    }
}
