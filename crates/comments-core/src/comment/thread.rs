//! Thread annotation
//!
//! Every flat read reports, per comment, whether it has direct replies and
//! which reply comes first. Summaries are computed per request and never
//! cached.

use super::model::Comment;
use crate::error::Result;
use crate::query::Criteria;
use crate::store::{RecordStore, COMMENTS_COLLECTION};
use crate::types::RecordId;
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Direct-reply summary of one comment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub has_children: bool,
    pub first_child_id: Option<RecordId>,
    pub immediate_child_count: u64,
}

/// Criteria selecting the direct replies of `parent`
pub fn children_of(parent: &RecordId) -> Criteria {
    Criteria::new().eq("threadOf", parent.to_value())
}

/// Summarize the direct replies of every comment in the batch.
///
/// Issues one count-and-fetch-first query per comment, all awaited
/// together. Store errors propagate.
pub async fn annotate_threads(
    store: &dyn RecordStore,
    comments: &[Comment],
) -> Result<HashMap<RecordId, ThreadSummary>> {
    let lookups = comments.iter().map(|comment| async move {
        let criteria = children_of(&comment.id).limit(1);
        let (first, total) = store.find_with_count(COMMENTS_COLLECTION, &criteria).await?;
        let summary = ThreadSummary {
            has_children: total > 0,
            first_child_id: first.first().and_then(|r| r.get("id")).and_then(RecordId::from_value),
            immediate_child_count: total,
        };
        Ok::<_, crate::error::CommentsError>((comment.id.clone(), summary))
    });

    let summaries: HashMap<RecordId, ThreadSummary> =
        try_join_all(lookups).await?.into_iter().collect();
    debug!(count = summaries.len(), "annotated comment threads");
    Ok(summaries)
}
