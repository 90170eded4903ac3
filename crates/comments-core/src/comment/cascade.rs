//! Cascading field updates over a reply subtree
//!
//! The update proceeds level by level: a parent's direct replies are
//! fetched and batch-updated, and only a fully applied level is descended
//! into. Sibling subtrees run concurrently. Store failures never escape;
//! they are folded into the returned [`CascadeReport`].

use super::thread::children_of;
use crate::query::Criteria;
use crate::store::{RecordStore, COMMENTS_COLLECTION};
use crate::types::RecordId;
use futures::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Outcome of a cascading update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    /// Descendants found while walking the tree
    pub matched: u64,
    /// Descendants actually updated
    pub updated: u64,
    /// Levels where fewer records were updated than matched
    pub mismatched_levels: u32,
    /// Branches abandoned after a store error
    pub failed_branches: u32,
    /// Replies found pointing back at one of their ancestors
    pub cycles: u32,
}

impl CascadeReport {
    /// Boolean outcome: no branch failed and no cycle was met.
    ///
    /// A count mismatch still counts as success for the part already applied.
    pub fn succeeded(&self) -> bool {
        self.failed_branches == 0 && self.cycles == 0
    }

    /// Whether every matched descendant was updated
    pub fn is_complete(&self) -> bool {
        self.succeeded() && self.mismatched_levels == 0 && self.matched == self.updated
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: CascadeReport) {
        self.matched += other.matched;
        self.updated += other.updated;
        self.mismatched_levels += other.mismatched_levels;
        self.failed_branches += other.failed_branches;
        self.cycles += other.cycles;
    }

    fn failed() -> Self {
        Self {
            failed_branches: 1,
            ..Self::default()
        }
    }
}

/// Set `field = value` on every descendant of `root`
pub async fn cascade_field_update(
    store: &dyn RecordStore,
    root: &RecordId,
    field: &str,
    value: &Value,
) -> CascadeReport {
    let mut patch = Map::new();
    patch.insert(field.to_string(), value.clone());

    let report = cascade_level(store, root.clone(), &patch, Vec::new()).await;
    debug!(
        root = %root,
        field,
        matched = report.matched,
        updated = report.updated,
        "cascade finished"
    );
    report
}

fn cascade_level<'a>(
    store: &'a dyn RecordStore,
    parent: RecordId,
    patch: &'a Map<String, Value>,
    mut ancestors: Vec<RecordId>,
) -> BoxFuture<'a, CascadeReport> {
    async move {
        let children = match store
            .find_many(COMMENTS_COLLECTION, &children_of(&parent))
            .await
        {
            Ok(children) => children,
            Err(e) => {
                warn!(parent = %parent, error = %e, "cascade: fetching replies failed");
                return CascadeReport::failed();
            }
        };

        ancestors.push(parent.clone());
        let mut report = CascadeReport::default();
        let mut targets = Vec::with_capacity(children.len());
        for child in &children {
            let Some(id) = child.get("id").and_then(RecordId::from_value) else {
                continue;
            };
            if ancestors.contains(&id) {
                warn!(parent = %parent, child = %id, "cascade: reply cycle detected");
                report.cycles += 1;
            } else {
                targets.push(id.to_value());
            }
        }
        if targets.is_empty() {
            return report;
        }

        let matched = targets.len() as u64;
        let criteria: Criteria = children_of(&parent).is_in("id", targets);
        let updated = match store
            .update_many(COMMENTS_COLLECTION, &criteria, patch)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                warn!(parent = %parent, error = %e, "cascade: updating replies failed");
                report.merge(CascadeReport::failed());
                return report;
            }
        };
        report.matched += matched;
        report.updated += updated.len() as u64;

        if updated.is_empty() || updated.len() as u64 != matched {
            warn!(
                parent = %parent,
                matched,
                updated = updated.len(),
                "cascade: update count mismatch, not descending"
            );
            report.mismatched_levels += 1;
            return report;
        }

        let branches = updated
            .iter()
            .filter_map(|record| record.get("id").and_then(RecordId::from_value))
            .map(|child| cascade_level(store, child, patch, ancestors.clone()));
        for branch in join_all(branches).await {
            report.merge(branch);
        }
        report
    }
    .boxed()
}
