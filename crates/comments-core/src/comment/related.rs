//! Related entity resolution
//!
//! Comments reference arbitrary records through relation tokens. Tokens of
//! a batch are grouped by collection, ids deduplicated, and each collection
//! is fetched with a single `id in (...)` query. Queries for distinct
//! collections run concurrently; results are keyed by token, so arrival
//! order does not matter.

use super::model::{Comment, Related};
use crate::error::Result;
use crate::query::Criteria;
use crate::relation;
use crate::store::RecordStore;
use crate::types::RecordId;
use futures::future::try_join_all;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Field tagging a fetched record with its collection
pub const COLLECTION_TAG: &str = "uid";

/// Records fetched for a batch of relation tokens, keyed by token
#[derive(Debug, Clone, Default)]
pub struct RelatedEntities {
    by_token: HashMap<String, Value>,
}

impl RelatedEntities {
    /// Fetch every record referenced by `tokens`.
    ///
    /// Malformed tokens are skipped. Store errors propagate.
    pub async fn fetch<'t>(
        store: &dyn RecordStore,
        tokens: impl IntoIterator<Item = &'t str>,
    ) -> Result<Self> {
        let mut groups: BTreeMap<String, BTreeSet<RecordId>> = BTreeMap::new();
        for token in tokens {
            match relation::decode(token) {
                Ok((collection, id)) => {
                    groups.entry(collection).or_default().insert(id);
                }
                Err(e) => warn!(token, error = %e, "skipping malformed relation token"),
            }
        }

        let lookups = groups.into_iter().map(|(collection, ids)| async move {
            let ids: Vec<Value> = ids.iter().map(RecordId::to_value).collect();
            let criteria = Criteria::new().is_in("id", ids);
            let records = store.find_many(&collection, &criteria).await?;
            debug!(collection = %collection, found = records.len(), "fetched related entities");
            Ok::<_, crate::error::CommentsError>((collection, records))
        });

        let mut by_token = HashMap::new();
        for (collection, records) in try_join_all(lookups).await? {
            for mut record in records {
                let Some(id) = record.get("id").and_then(RecordId::from_value) else {
                    continue;
                };
                if let Value::Object(map) = &mut record {
                    map.insert(COLLECTION_TAG.to_string(), Value::from(collection.as_str()));
                }
                by_token.insert(relation::encode(&collection, &id), record);
            }
        }
        Ok(Self { by_token })
    }

    /// Fetch the records referenced by a batch of comments
    pub async fn for_comments(store: &dyn RecordStore, comments: &[Comment]) -> Result<Self> {
        Self::fetch(store, comments.iter().filter_map(Comment::related_token)).await
    }

    /// Record behind `token`, if fetched
    pub fn get(&self, token: &str) -> Option<&Value> {
        self.by_token.get(token).or_else(|| {
            // Tokens written with a padded or string-typed id still round-trip
            let (collection, id) = relation::decode(token).ok()?;
            self.by_token.get(&relation::encode(&collection, &id))
        })
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }

    /// Replace the comment's token with its record; unresolved tokens stay raw
    pub fn merge_into(&self, comment: &mut Comment) {
        let resolved = comment.related_token().and_then(|token| self.get(token)).cloned();
        if let Some(entity) = resolved {
            comment.related = Some(Related::Entity(entity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommentsError;
    use crate::store::memory::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ARTICLES: &str = "api::article.article";
    const PAGES: &str = "api::page.page";

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(
            ARTICLES,
            vec![json!({ "id": 1, "title": "One" }), json!({ "id": 2, "title": "Two" })],
        );
        store.insert(PAGES, vec![json!({ "id": "about", "title": "About" })]);
        store
    }

    #[tokio::test]
    async fn test_groups_and_dedups_per_collection() {
        let store = store();
        let tokens = [
            "api::article.article:1",
            "api::article.article:1",
            "api::article.article:2",
            "api::page.page:about",
        ];
        let related = RelatedEntities::fetch(&store, tokens).await.unwrap();
        assert_eq!(related.len(), 3);
        assert_eq!(
            related.get("api::article.article:2"),
            Some(&json!({ "id": 2, "title": "Two", "uid": ARTICLES }))
        );
        assert_eq!(related.get("api::page.page:about").unwrap()["uid"], json!(PAGES));

        let mut calls = store.calls();
        calls.sort();
        assert_eq!(
            calls,
            vec![
                format!("find_many:{}", ARTICLES),
                format!("find_many:{}", PAGES),
            ]
        );
    }

    #[tokio::test]
    async fn test_merge_into_comment() {
        let store = store();
        let mut found = Comment::from_record(json!({ "id": 10, "related": "api::article.article:1" })).unwrap();
        let mut missing = Comment::from_record(json!({ "id": 11, "related": "api::article.article:99" })).unwrap();

        let related = RelatedEntities::for_comments(&store, &[found.clone(), missing.clone()])
            .await
            .unwrap();
        related.merge_into(&mut found);
        related.merge_into(&mut missing);

        assert_eq!(
            found.related,
            Some(Related::Entity(json!({ "id": 1, "title": "One", "uid": ARTICLES })))
        );
        assert_eq!(missing.related_token(), Some("api::article.article:99"));
    }

    #[tokio::test]
    async fn test_malformed_tokens_are_skipped() {
        let store = store();
        let related = RelatedEntities::fetch(&store, ["no-separator", "api::article.article:1"])
            .await
            .unwrap();
        assert_eq!(related.len(), 1);
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let store = store();
        store.fail_collection(PAGES);

        let result = RelatedEntities::fetch(&store, ["api::page.page:about"]).await;
        assert!(matches!(result, Err(CommentsError::Store(_))));
    }
}
