//! Comment service
//!
//! Caller-facing operations over the record store: flat and threaded
//! listings, single lookups, moderation actions and comment admission.

use crate::comment::{
    annotate_threads, build_tree, cascade_field_update, filter_resolved_reports, sanitize,
    CascadeReport, Comment, CommentNode, CommentValidator, CommentView, NewComment,
    RelatedEntities, ApprovalStatus,
};
use crate::comment::thread::children_of;
use crate::config::{keys, CommentsConfig, ConfigResolver};
use crate::error::{CommentsError, Result};
use crate::moderation::ModerationFilter;
use crate::query::{Criteria, Filter, PageMeta, PaginationInput, QueryPlan, SortInput};
use crate::relation::{self, RelationRef};
use crate::store::{RecordStore, COMMENTS_COLLECTION};
use crate::types::RecordId;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Message of the single-lookup `NotFound` error
pub const COMMENT_NOT_FOUND: &str = "Comment does not exist. Check your payload please.";

/// Parameters of a flat listing
#[derive(Debug, Clone, Default)]
pub struct FindParams {
    /// Filters; ordering and paging come from `sort` and `pagination`
    pub filters: Criteria,
    pub sort: Option<SortInput>,
    pub pagination: Option<PaginationInput>,
}

impl FindParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only comments attached to the `related` token
    pub fn related(mut self, token: impl Into<String>) -> Self {
        self.filters = self.filters.eq("related", token.into());
        self
    }

    /// Add a filter
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters = self.filters.filter(filter);
        self
    }

    pub fn sort(mut self, sort: impl Into<SortInput>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn pagination(mut self, pagination: PaginationInput) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

/// Parameters of a threaded listing
#[derive(Debug, Clone, Default)]
pub struct HierarchyParams {
    /// Filters and ordering; pagination is ignored
    pub find: FindParams,
    /// Parent whose replies form the forest; `None` for root comments
    pub starting_from: Option<RecordId>,
    /// Leave out `blockedThread` comments and everything below them
    pub drop_blocked_threads: bool,
}

/// How relation tokens in a listing are resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelatedLookup {
    /// One batched lookup per target collection
    #[default]
    Batch,
    /// The caller already holds the related entity; tokens stay raw
    Skip,
}

/// One page of a flat listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentPage {
    pub data: Vec<CommentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

/// Result of a moderation action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationOutcome {
    pub comment: CommentView,
    /// Present when the action cascaded to replies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade: Option<CascadeReport>,
}

/// Comment retrieval and moderation engine
#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn RecordStore>,
    resolver: ConfigResolver,
    moderation: ModerationFilter,
}

impl CommentService {
    /// Create a service with the built-in profanity filter
    pub fn new(store: Arc<dyn RecordStore>, resolver: ConfigResolver) -> Self {
        let moderation = ModerationFilter::new(resolver.clone());
        Self::with_moderation(store, resolver, moderation)
    }

    /// Create a service with a custom moderation filter
    pub fn with_moderation(
        store: Arc<dyn RecordStore>,
        resolver: ConfigResolver,
        moderation: ModerationFilter,
    ) -> Self {
        Self {
            store,
            resolver,
            moderation,
        }
    }

    /// Effective configuration
    pub async fn get_config(&self) -> Result<CommentsConfig> {
        self.resolver.config().await
    }

    /// Raw configuration lookup
    pub async fn get_config_value(&self, path: &str, default: Value, use_local: bool) -> Result<Value> {
        self.resolver.get(path, default, use_local).await
    }

    /// Flat, annotated listing.
    ///
    /// With [`RelatedLookup::Batch`], relation tokens are resolved in one
    /// batch per target collection. [`RelatedLookup::Skip`] leaves them raw.
    pub async fn find_all_flat(
        &self,
        params: &FindParams,
        lookup: RelatedLookup,
    ) -> Result<CommentPage> {
        let plan = QueryPlan::compile(params.sort.as_ref(), params.pagination.as_ref())?;
        let criteria = plan.apply_to(params.filters.clone());

        let records = self.store.find_many(COMMENTS_COLLECTION, &criteria).await?;
        let total = if plan.with_count {
            Some(
                self.store
                    .count(COMMENTS_COLLECTION, &criteria.without_paging())
                    .await?,
            )
        } else {
            None
        };

        let mut comments = records
            .into_iter()
            .map(Comment::from_record)
            .collect::<Result<Vec<_>>>()?;
        debug!(fetched = comments.len(), ?total, "flat comment listing");

        let summaries = annotate_threads(self.store.as_ref(), &comments).await?;
        if lookup == RelatedLookup::Batch {
            let related = RelatedEntities::for_comments(self.store.as_ref(), &comments).await?;
            for comment in &mut comments {
                related.merge_into(comment);
            }
        }

        let blocked_props = self.blocked_author_props().await?;
        let data = comments
            .into_iter()
            .map(|comment| {
                let summary = summaries.get(&comment.id).cloned().unwrap_or_default();
                filter_resolved_reports(sanitize(comment, &blocked_props)).with_thread(summary)
            })
            .collect();

        Ok(CommentPage {
            data,
            meta: plan.meta(total),
        })
    }

    /// Threaded listing built from an unpaginated flat listing
    pub async fn find_all_in_hierarchy(
        &self,
        params: &HierarchyParams,
        lookup: RelatedLookup,
    ) -> Result<Vec<CommentNode>> {
        let find = FindParams {
            pagination: None,
            ..params.find.clone()
        };
        let page = self.find_all_flat(&find, lookup).await?;
        Ok(build_tree(
            page.data,
            params.starting_from.as_ref(),
            params.drop_blocked_threads,
        ))
    }

    /// Single comment matching `criteria`
    pub async fn find_one(&self, criteria: &Criteria) -> Result<CommentView> {
        let record = self
            .store
            .find_one(COMMENTS_COLLECTION, criteria)
            .await?
            .ok_or_else(|| CommentsError::NotFound(COMMENT_NOT_FOUND.to_string()))?;
        let blocked_props = self.blocked_author_props().await?;
        Ok(filter_resolved_reports(sanitize(
            Comment::from_record(record)?,
            &blocked_props,
        )))
    }

    /// Propagate `field = value` to every descendant of `root`
    pub async fn cascade_field_update(&self, root: &RecordId, field: &str, value: Value) -> bool {
        self.cascade_field_update_report(root, field, value)
            .await
            .succeeded()
    }

    /// Same as [`cascade_field_update`](Self::cascade_field_update) with the full report
    pub async fn cascade_field_update_report(
        &self,
        root: &RecordId,
        field: &str,
        value: Value,
    ) -> CascadeReport {
        cascade_field_update(self.store.as_ref(), root, field, &value).await
    }

    /// Block or unblock a single comment
    pub async fn block_comment(&self, id: &RecordId, blocked: bool) -> Result<ModerationOutcome> {
        let comment = self.update_one(id, "blocked", Value::Bool(blocked)).await?;
        info!(comment = %id, blocked, "comment moderation updated");
        Ok(ModerationOutcome {
            comment,
            cascade: None,
        })
    }

    /// Block or unblock a comment's whole reply thread
    pub async fn block_thread(&self, id: &RecordId, blocked: bool) -> Result<ModerationOutcome> {
        let comment = self
            .update_one(id, "blockedThread", Value::Bool(blocked))
            .await?;
        let report = self
            .cascade_field_update_report(id, "blockedThread", Value::Bool(blocked))
            .await;
        info!(
            comment = %id,
            blocked,
            updated = report.updated,
            succeeded = report.succeeded(),
            "thread moderation updated"
        );
        Ok(ModerationOutcome {
            comment,
            cascade: Some(report),
        })
    }

    /// Profanity gate for comment content
    pub async fn check_bad_words<'a>(&self, content: Option<&'a str>) -> Result<Option<&'a str>> {
        self.moderation.check_bad_words(content).await
    }

    /// Decode `token` and check its collection against the allow-list
    pub async fn validate_relation(&self, token: &str) -> Result<RelationRef> {
        let config = self.get_config().await?;
        enabled_relation(&config, token)
    }

    /// Admission checks for a new comment; returns the record to store.
    ///
    /// The relation must target an enabled collection, the content must
    /// pass validation and the profanity gate, and a referenced parent must
    /// exist under the same related entity. Collections under the approval
    /// flow get `PENDING` comments.
    pub async fn prepare_comment(&self, mut draft: NewComment) -> Result<Value> {
        let config = self.get_config().await?;
        let relation = enabled_relation(&config, &draft.related)?;
        CommentValidator::new().validate(&draft)?;
        self.check_bad_words(Some(&draft.content)).await?;

        if let Some(parent) = &draft.thread_of {
            let criteria = Criteria::new()
                .eq("id", parent.to_value())
                .eq("related", draft.related.as_str());
            if self.store.find_one(COMMENTS_COLLECTION, &criteria).await?.is_none() {
                return Err(CommentsError::NotFound(format!(
                    "Thread {} does not exist for {}",
                    parent, draft.related
                )));
            }
        }

        if config.requires_approval(&relation.collection) {
            draft.approval_status = Some(ApprovalStatus::Pending);
        }
        Ok(draft.to_record())
    }

    /// Number of direct replies to `id`
    pub async fn count_replies(&self, id: &RecordId) -> Result<u64> {
        self.store
            .count(COMMENTS_COLLECTION, &children_of(id))
            .await
    }

    async fn update_one(&self, id: &RecordId, field: &str, value: Value) -> Result<CommentView> {
        let mut patch = Map::new();
        patch.insert(field.to_string(), value);
        let criteria = Criteria::new().eq("id", id.to_value());
        let updated = self
            .store
            .update_many(COMMENTS_COLLECTION, &criteria, &patch)
            .await?;
        let record = updated
            .into_iter()
            .next()
            .ok_or_else(|| CommentsError::NotFound(COMMENT_NOT_FOUND.to_string()))?;
        let blocked_props = self.blocked_author_props().await?;
        Ok(sanitize(Comment::from_record(record)?, &blocked_props))
    }

    async fn blocked_author_props(&self) -> Result<Vec<String>> {
        self.resolver
            .get_as(keys::BLOCKED_AUTHOR_PROPS, Vec::new(), false)
            .await
    }
}

fn enabled_relation(config: &CommentsConfig, token: &str) -> Result<RelationRef> {
    let relation = RelationRef::decode(token)?;
    relation::validate(&relation.collection, &config.enabled_collections)?;
    Ok(relation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::{NewAuthor, Related};
    use crate::config::LocalConfig;
    use crate::store::memory::{MemoryConfigStore, MemoryStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ARTICLES: &str = "api::article.article";

    fn service_with(store: Arc<MemoryStore>, remote: Value) -> CommentService {
        let resolver = ConfigResolver::new(
            Arc::new(MemoryConfigStore::with_document(remote)),
            LocalConfig::default(),
        );
        CommentService::new(store, resolver)
    }

    fn ten_comments() -> Arc<MemoryStore> {
        let records = (1..=10)
            .map(|id| json!({ "id": id, "content": format!("comment {id}"), "related": "api::article.article:1" }))
            .collect();
        let store = MemoryStore::with_records(COMMENTS_COLLECTION, records);
        store.insert(ARTICLES, vec![json!({ "id": 1, "title": "Hello" })]);
        Arc::new(store)
    }

    fn chain_store(blocked_thread_on_2: bool) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_records(
            COMMENTS_COLLECTION,
            vec![
                json!({ "id": 1, "threadOf": null }),
                json!({ "id": 2, "threadOf": 1, "blockedThread": blocked_thread_on_2 }),
                json!({ "id": 3, "threadOf": 2 }),
            ],
        ))
    }

    fn ids(views: &[CommentView]) -> Vec<RecordId> {
        views.iter().map(|v| v.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_second_page_in_natural_order() {
        let service = service_with(ten_comments(), json!({}));
        let params = FindParams::new().pagination(PaginationInput::page(2, 5));

        let page = service.find_all_flat(&params, RelatedLookup::Batch).await.unwrap();
        assert_eq!(ids(&page.data), (6..=10).map(RecordId::Int).collect::<Vec<_>>());
        assert_eq!(
            serde_json::to_value(&page.meta).unwrap(),
            json!({ "pagination": { "page": 2, "pageSize": 5 } })
        );
    }

    #[tokio::test]
    async fn test_with_count_reports_totals() {
        let store = ten_comments();
        store.insert(COMMENTS_COLLECTION, vec![json!({ "id": 11, "related": "api::article.article:1" })]);
        let service = service_with(store, json!({}));
        let params = FindParams::new()
            .related("api::article.article:1")
            .pagination(PaginationInput::page(1, 5).with_count());

        let page = service.find_all_flat(&params, RelatedLookup::Batch).await.unwrap();
        assert_eq!(page.data.len(), 5);
        assert_eq!(
            serde_json::to_value(&page.meta).unwrap(),
            json!({ "pagination": { "page": 1, "pageSize": 5, "total": 11, "pageCount": 3 } })
        );
    }

    #[tokio::test]
    async fn test_flat_listing_resolves_related_entities() {
        let store = ten_comments();
        let service = service_with(store.clone(), json!({}));
        let params = FindParams::new().pagination(PaginationInput::offset(0, 2));

        let page = service.find_all_flat(&params, RelatedLookup::Batch).await.unwrap();
        assert_eq!(
            page.data[0].related,
            Some(Related::Entity(json!({ "id": 1, "title": "Hello", "uid": ARTICLES })))
        );
        // One batched lookup for the shared target
        let lookups = store
            .calls()
            .iter()
            .filter(|c| c.as_str() == format!("find_many:{}", ARTICLES))
            .count();
        assert_eq!(lookups, 1);
        assert_eq!(
            serde_json::to_value(&page.meta).unwrap(),
            json!({ "pagination": { "start": 0, "limit": 2 } })
        );
    }

    #[tokio::test]
    async fn test_skipped_lookup_leaves_tokens_raw() {
        let store = ten_comments();
        let service = service_with(store.clone(), json!({}));

        let page = service
            .find_all_flat(&FindParams::new(), RelatedLookup::Skip)
            .await
            .unwrap();
        assert_eq!(page.data.len(), 10);
        assert!(page.meta.is_none());
        assert!(matches!(page.data[0].related, Some(Related::Token(_))));
        assert!(!store.calls().contains(&format!("find_many:{}", ARTICLES)));
    }

    #[tokio::test]
    async fn test_flat_listing_annotates_threads() {
        let service = service_with(chain_store(false), json!({}));
        let page = service.find_all_flat(&FindParams::new(), RelatedLookup::Batch).await.unwrap();
        let root = page.data[0].thread.clone().unwrap();
        assert!(root.has_children);
        assert_eq!(root.first_child_id, Some(RecordId::Int(2)));
        assert!(!page.data[2].thread.clone().unwrap().has_children);
    }

    #[tokio::test]
    async fn test_sort_normalization() {
        let service = service_with(ten_comments(), json!({}));
        let asc = service
            .find_all_flat(&FindParams::new().sort("content"), RelatedLookup::Batch)
            .await
            .unwrap();
        let explicit = service
            .find_all_flat(&FindParams::new().sort("content:asc"), RelatedLookup::Batch)
            .await
            .unwrap();
        assert_eq!(ids(&asc.data), ids(&explicit.data));

        let desc = service
            .find_all_flat(&FindParams::new().sort("id:desc"), RelatedLookup::Batch)
            .await
            .unwrap();
        assert_eq!(desc.data[0].id, RecordId::Int(10));
    }

    #[tokio::test]
    async fn test_invalid_pagination_is_rejected() {
        let service = service_with(ten_comments(), json!({}));
        let pagination: PaginationInput =
            serde_json::from_value(json!({ "page": "two" })).unwrap();
        let err = service
            .find_all_flat(&FindParams::new().pagination(pagination), RelatedLookup::Batch)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_huge_page_is_rejected() {
        let service = service_with(ten_comments(), json!({}));
        let pagination: PaginationInput = serde_json::from_value(
            json!({ "page": "9223372036854775807", "pageSize": "10" }),
        )
        .unwrap();
        let err = service
            .find_all_flat(&FindParams::new().pagination(pagination), RelatedLookup::Batch)
            .await
            .unwrap_err();
        assert!(matches!(err, CommentsError::InvalidQuery(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_hierarchy_preserves_depth() {
        let service = service_with(chain_store(false), json!({}));
        let forest = service
            .find_all_in_hierarchy(&HierarchyParams::default(), RelatedLookup::Batch)
            .await
            .unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].comment.id, RecordId::Int(1));
        assert_eq!(forest[0].children[0].comment.id, RecordId::Int(2));
        assert_eq!(forest[0].children[0].children[0].comment.id, RecordId::Int(3));
    }

    #[tokio::test]
    async fn test_hierarchy_drops_blocked_threads() {
        let service = service_with(chain_store(true), json!({}));
        let params = HierarchyParams {
            drop_blocked_threads: true,
            ..Default::default()
        };
        let forest = service.find_all_in_hierarchy(&params, RelatedLookup::Batch).await.unwrap();
        assert_eq!(forest.len(), 1);
        assert!(forest[0].children.is_empty());
    }

    #[tokio::test]
    async fn test_find_one() {
        let store = Arc::new(MemoryStore::with_records(
            COMMENTS_COLLECTION,
            vec![json!({
                "id": 4,
                "authorName": "Guest",
                "authorEmail": "guest@example.com",
                "reports": [{ "id": 1, "resolved": true }, { "id": 2, "resolved": false }]
            })],
        ));
        let service = service_with(store, json!({ "blockedAuthorProps": ["email"] }));

        let view = service
            .find_one(&Criteria::new().eq("id", 4))
            .await
            .unwrap();
        assert_eq!(view.reports.len(), 1);
        let author = view.author.unwrap();
        assert_eq!(author.name.as_deref(), Some("Guest"));
        assert!(author.email.is_none());

        let err = service
            .find_one(&Criteria::new().eq("id", 99))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), COMMENT_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cascade_partial_outcome_is_true() {
        let store = Arc::new(MemoryStore::with_records(
            COMMENTS_COLLECTION,
            vec![
                json!({ "id": 1 }),
                json!({ "id": 2, "threadOf": 1 }),
                json!({ "id": 3, "threadOf": 1 }),
                json!({ "id": 4, "threadOf": 2 }),
            ],
        ));
        store.cap_updates(1);
        let service = service_with(store.clone(), json!({}));

        assert!(
            service
                .cascade_field_update(&RecordId::Int(1), "blocked", json!(true))
                .await
        );
        assert_eq!(store.records(COMMENTS_COLLECTION)[3].get("blocked"), None);
    }

    #[tokio::test]
    async fn test_block_thread_cascades() {
        let store = chain_store(false);
        let service = service_with(store.clone(), json!({}));

        let outcome = service.block_thread(&RecordId::Int(1), true).await.unwrap();
        assert!(outcome.comment.blocked_thread);
        let report = outcome.cascade.unwrap();
        assert!(report.succeeded());
        assert_eq!(report.updated, 2);
        assert!(store
            .records(COMMENTS_COLLECTION)
            .iter()
            .all(|r| r["blockedThread"] == json!(true)));

        let outcome = service.block_thread(&RecordId::Int(1), false).await.unwrap();
        assert!(!outcome.comment.blocked_thread);
        assert_eq!(service.count_replies(&RecordId::Int(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_block_comment() {
        let service = service_with(chain_store(false), json!({}));
        let outcome = service.block_comment(&RecordId::Int(3), true).await.unwrap();
        assert!(outcome.comment.blocked);
        assert!(outcome.cascade.is_none());

        let err = service.block_comment(&RecordId::Int(42), true).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_validate_relation() {
        let service = service_with(
            Arc::new(MemoryStore::new()),
            json!({ "enabledCollections": [ARTICLES] }),
        );
        let relation = service.validate_relation("api::article.article:3").await.unwrap();
        assert_eq!(relation.id, RecordId::Int(3));

        let err = service.validate_relation("api::page.page:3").await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(err.to_string().contains(ARTICLES));
    }

    fn draft(content: &str, thread_of: Option<i64>) -> NewComment {
        NewComment {
            content: content.to_string(),
            related: "api::article.article:1".to_string(),
            thread_of: thread_of.map(RecordId::Int),
            author: NewAuthor::Anonymous {
                id: None,
                name: "Guest".to_string(),
                email: "guest@example.com".to_string(),
                avatar: None,
            },
            approval_status: None,
        }
    }

    #[tokio::test]
    async fn test_prepare_comment() {
        let store = ten_comments();
        let service = service_with(
            store,
            json!({ "enabledCollections": [ARTICLES], "approvalFlow": [ARTICLES] }),
        );

        let record = service.prepare_comment(draft("Nice post", Some(3))).await.unwrap();
        assert_eq!(record["approvalStatus"], json!("PENDING"));
        assert_eq!(record["threadOf"], json!(3));

        let err = service
            .prepare_comment(draft("what the hell", None))
            .await
            .unwrap_err();
        assert_eq!(
            err.details().unwrap(),
            json!({ "content": { "original": "what the hell", "filtered": "what the ****" } })
        );

        let err = service
            .prepare_comment(draft("Nice post", Some(99)))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_prepare_comment_outside_approval_flow() {
        let service = service_with(
            ten_comments(),
            json!({ "enabledCollections": [ARTICLES], "approvalFlow": ["api::page.page"] }),
        );
        let record = service.prepare_comment(draft("Nice post", None)).await.unwrap();
        assert!(record.get("approvalStatus").is_none());
        assert_eq!(record["threadOf"], Value::Null);

        let service = service_with(ten_comments(), json!({ "approvalFlow": [ARTICLES] }));
        let err = service.prepare_comment(draft("Nice post", None)).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_store_errors_propagate_unwrapped() {
        let store = ten_comments();
        store.fail_collection(COMMENTS_COLLECTION);
        let service = service_with(store, json!({}));

        let err = service
            .find_all_flat(&FindParams::new(), RelatedLookup::Batch)
            .await
            .unwrap_err();
        assert!(matches!(err, CommentsError::Store(_)));
    }
}
