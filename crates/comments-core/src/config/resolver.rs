//! Two-tier configuration lookup

use super::CommentsConfig;
use crate::error::{CommentsError, Result};
use crate::store::ConfigStore;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Namespace of the engine inside the local static configuration
pub const CONFIG_NAMESPACE: &str = "plugin.comments";

/// Key of the remote configuration document
pub const REMOTE_CONFIG_KEY: &str = "config";

/// Resolve a dot-separated path inside a JSON document.
///
/// An empty path yields the document itself. Numeric segments index arrays.
pub fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(doc, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Local static configuration tree
#[derive(Debug, Clone, Default)]
pub struct LocalConfig {
    root: Value,
}

impl LocalConfig {
    /// Wrap a whole application configuration tree
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Build a tree holding `section` under [`CONFIG_NAMESPACE`]
    pub fn namespaced(section: Value) -> Self {
        let mut node = section;
        for segment in CONFIG_NAMESPACE.rsplit('.') {
            let mut map = serde_json::Map::new();
            map.insert(segment.to_string(), node);
            node = Value::Object(map);
        }
        Self { root: node }
    }

    /// Build a tree holding `config` under [`CONFIG_NAMESPACE`]
    pub fn from_config(config: &CommentsConfig) -> Result<Self> {
        Ok(Self::namespaced(serde_json::to_value(config)?))
    }

    /// Engine section of the tree
    pub fn namespace(&self) -> Option<&Value> {
        lookup_path(&self.root, CONFIG_NAMESPACE)
    }

    /// Look up a path relative to the engine namespace
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.namespace().and_then(|ns| lookup_path(ns, path))
    }
}

/// Configuration lookup: remote document first, local tree second.
///
/// Selection is per call and binary: when the remote document exists and
/// `use_local` is false, the local tree is never consulted, even when the
/// path is absent remotely.
#[derive(Clone)]
pub struct ConfigResolver {
    remote: Arc<dyn ConfigStore>,
    local: LocalConfig,
}

impl ConfigResolver {
    /// Create a resolver over a remote store and a local tree
    pub fn new(remote: Arc<dyn ConfigStore>, local: LocalConfig) -> Self {
        Self { remote, local }
    }

    /// Local tree
    pub fn local(&self) -> &LocalConfig {
        &self.local
    }

    /// Resolve `path`, falling back to `default` when the value is absent
    pub async fn get(&self, path: &str, default: Value, use_local: bool) -> Result<Value> {
        let resolved = if use_local {
            self.local.get(path).cloned()
        } else {
            match self.remote.get(REMOTE_CONFIG_KEY).await? {
                Some(doc) => {
                    debug!(path, "resolving config from remote document");
                    lookup_path(&doc, path).cloned()
                }
                None => self.local.get(path).cloned(),
            }
        };

        Ok(match resolved {
            Some(Value::Null) | None => default,
            Some(value) => value,
        })
    }

    /// Resolve `path` and deserialize it
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        path: &str,
        default: T,
        use_local: bool,
    ) -> Result<T> {
        match self.get(path, Value::Null, use_local).await? {
            Value::Null => Ok(default),
            value => serde_json::from_value(value).map_err(|e| {
                CommentsError::Config(format!("Invalid value for '{}': {}", path, e))
            }),
        }
    }

    /// Typed snapshot of the effective configuration
    pub async fn config(&self) -> Result<CommentsConfig> {
        let doc = match self.remote.get(REMOTE_CONFIG_KEY).await? {
            Some(doc) => doc,
            None => self.local.namespace().cloned().unwrap_or(Value::Null),
        };

        if doc.is_null() {
            return Ok(CommentsConfig::default());
        }
        serde_json::from_value(doc)
            .map_err(|e| CommentsError::Config(format!("Invalid comments configuration: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keys;
    use crate::store::memory::MemoryConfigStore;
    use serde_json::json;

    fn local() -> LocalConfig {
        LocalConfig::new(json!({
            "plugin": { "comments": {
                "enabledCollections": ["api::page.page"],
                "badWords": false,
                "nested": { "flag": true }
            }}
        }))
    }

    #[test]
    fn test_lookup_path() {
        let doc = json!({ "a": { "b": [10, { "c": "x" }] } });
        assert_eq!(lookup_path(&doc, "a.b.0"), Some(&json!(10)));
        assert_eq!(lookup_path(&doc, "a.b.1.c"), Some(&json!("x")));
        assert_eq!(lookup_path(&doc, "a.missing"), None);
        assert_eq!(lookup_path(&doc, ""), Some(&doc));
    }

    #[test]
    fn test_local_config_from_config() {
        let config = CommentsConfig {
            enabled_collections: vec!["api::article.article".to_string()],
            ..Default::default()
        };
        let local = LocalConfig::from_config(&config).unwrap();
        assert_eq!(
            local.get(keys::ENABLED_COLLECTIONS),
            Some(&json!(["api::article.article"]))
        );
    }

    #[tokio::test]
    async fn test_remote_wins_when_present() {
        let remote = MemoryConfigStore::with_document(json!({
            "enabledCollections": ["api::article.article"]
        }));
        let resolver = ConfigResolver::new(Arc::new(remote), local());

        let value = resolver
            .get(keys::ENABLED_COLLECTIONS, json!([]), false)
            .await
            .unwrap();
        assert_eq!(value, json!(["api::article.article"]));

        // No merge: absent remotely means default, not local
        let value = resolver.get(keys::BAD_WORDS, json!(true), false).await.unwrap();
        assert_eq!(value, json!(true));
    }

    #[tokio::test]
    async fn test_use_local_skips_remote() {
        let remote = MemoryConfigStore::with_document(json!({ "badWords": true }));
        let resolver = ConfigResolver::new(Arc::new(remote), local());

        let value = resolver.get(keys::BAD_WORDS, json!(true), true).await.unwrap();
        assert_eq!(value, json!(false));
        let value = resolver.get("nested.flag", json!(false), true).await.unwrap();
        assert_eq!(value, json!(true));
    }

    #[tokio::test]
    async fn test_falls_back_to_local_without_remote() {
        let resolver = ConfigResolver::new(Arc::new(MemoryConfigStore::new()), local());

        let collections: Vec<String> = resolver
            .get_as(keys::ENABLED_COLLECTIONS, Vec::new(), false)
            .await
            .unwrap();
        assert_eq!(collections, vec!["api::page.page".to_string()]);

        let missing = resolver.get("does.not.exist", json!(7), false).await.unwrap();
        assert_eq!(missing, json!(7));
    }

    #[tokio::test]
    async fn test_typed_snapshot() {
        let resolver = ConfigResolver::new(Arc::new(MemoryConfigStore::new()), local());
        let config = resolver.config().await.unwrap();
        assert_eq!(config.enabled_collections, vec!["api::page.page".to_string()]);
        assert!(!config.bad_words.is_enabled());

        let empty = ConfigResolver::new(Arc::new(MemoryConfigStore::new()), LocalConfig::default());
        assert_eq!(empty.config().await.unwrap(), CommentsConfig::default());
    }

    #[tokio::test]
    async fn test_get_as_reports_bad_shape() {
        let remote = MemoryConfigStore::with_document(json!({ "enabledCollections": 3 }));
        let resolver = ConfigResolver::new(Arc::new(remote), LocalConfig::default());
        let result: Result<Vec<String>> = resolver
            .get_as(keys::ENABLED_COLLECTIONS, Vec::new(), false)
            .await;
        assert!(matches!(result, Err(CommentsError::Config(_))));
    }
}
