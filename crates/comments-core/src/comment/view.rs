//! Externally visible comment shape
//!
//! Stored records carry author internals (linked user, anonymous author
//! columns) and populated parents. The sanitizer folds those into a single
//! `author` view, normalizes `threadOf` to an id and drops whatever the
//! configuration marks as hidden.

use super::model::{ApprovalStatus, Author, Comment, Related, Report};
use super::thread::ThreadSummary;
use crate::types::{Extensions, RecordId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Record fields never exposed, whatever the configuration says
pub const INTERNAL_FIELDS: &[&str] = &["createdBy", "updatedBy", "password", "resetPasswordToken"];

/// Author as seen by callers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthorView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Value>,
}

impl AuthorView {
    fn from_author(author: Author) -> Self {
        match author {
            Author::Registered(user) => Self {
                id: Some(user.id),
                name: user.username,
                email: user.email,
                avatar: user.avatar,
            },
            Author::Anonymous {
                id,
                name,
                email,
                avatar,
            } => Self {
                id,
                name,
                email,
                avatar: avatar.map(Value::String),
            },
        }
    }

    /// Clear one field by its external name; unknown names are ignored
    fn hide(&mut self, prop: &str) {
        match prop {
            "id" => self.id = None,
            "name" | "username" => self.name = None,
            "email" => self.email = None,
            "avatar" => self.avatar = None,
            _ => {}
        }
    }
}

/// Sanitized comment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: RecordId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Related>,
    pub thread_of: Option<RecordId>,
    pub blocked: bool,
    pub blocked_thread: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    pub reports: Vec<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Thread annotation, present on flat listings
    #[serde(flatten)]
    pub thread: Option<ThreadSummary>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl CommentView {
    /// Attach a thread annotation
    pub fn with_thread(mut self, thread: ThreadSummary) -> Self {
        self.thread = Some(thread);
        self
    }
}

/// Strip internal-only fields and normalize `threadOf`.
///
/// `blocked_props` names author fields or extra record fields to hide.
pub fn sanitize(comment: Comment, blocked_props: &[String]) -> CommentView {
    let author = comment.author().map(|author| {
        let mut view = AuthorView::from_author(author);
        for prop in blocked_props {
            view.hide(prop);
        }
        view
    });
    let thread_of = comment.thread_of_id();

    let mut extensions = comment.extensions;
    for field in INTERNAL_FIELDS {
        extensions.remove(field);
    }
    for prop in blocked_props {
        extensions.remove(prop);
    }

    CommentView {
        id: comment.id,
        content: comment.content,
        related: comment.related,
        thread_of,
        blocked: comment.blocked,
        blocked_thread: comment.blocked_thread,
        block_reason: comment.block_reason,
        approval_status: comment.approval_status,
        reports: comment.reports,
        author,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        thread: None,
        extensions,
    }
}

/// Drop already resolved reports from the visible collection
pub fn filter_resolved_reports(mut view: CommentView) -> CommentView {
    view.reports.retain(|report| !report.resolved);
    view
}
