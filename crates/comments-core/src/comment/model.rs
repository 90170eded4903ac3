//! Comment data models

use crate::error::{CommentsError, Result};
use crate::types::{Extensions, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored comment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique comment identifier
    pub id: RecordId,
    /// Comment content
    #[serde(default)]
    pub content: String,
    /// Polymorphic target: raw token as stored, or the resolved record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Related>,
    /// Parent comment, `None` for roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_of: Option<ThreadOf>,
    /// Comment hidden by a moderator
    #[serde(default)]
    pub blocked: bool,
    /// Whole reply thread hidden by a moderator
    #[serde(default)]
    pub blocked_thread: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    /// Abuse reports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<Report>,
    /// Registered author, when populated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_user: Option<AuthorUser>,
    /// Anonymous author fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Comment {
    /// Parse a raw store record
    pub fn from_record(record: Value) -> Result<Self> {
        serde_json::from_value(record).map_err(|e| {
            CommentsError::Store(format!("Malformed comment record: {}", e))
        })
    }

    /// Parent comment id, whatever form the parent reference takes
    pub fn thread_of_id(&self) -> Option<RecordId> {
        self.thread_of.as_ref().map(ThreadOf::id)
    }

    /// Raw relation token, if the relation is still unresolved
    pub fn related_token(&self) -> Option<&str> {
        match &self.related {
            Some(Related::Token(token)) => Some(token),
            _ => None,
        }
    }

    /// Author in whichever form is populated
    pub fn author(&self) -> Option<Author> {
        if let Some(user) = &self.author_user {
            return Some(Author::Registered(user.clone()));
        }
        if self.author_id.is_none() && self.author_name.is_none() && self.author_email.is_none() {
            return None;
        }
        Some(Author::Anonymous {
            id: self.author_id.clone(),
            name: self.author_name.clone(),
            email: self.author_email.clone(),
            avatar: self.author_avatar.clone(),
        })
    }
}

/// Relation field: stored token or resolved entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Related {
    Token(String),
    Entity(Value),
}

/// Parent reference: plain id or populated parent record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThreadOf {
    Id(RecordId),
    Parent(Box<Comment>),
}

impl ThreadOf {
    pub fn id(&self) -> RecordId {
        match self {
            ThreadOf::Id(id) => id.clone(),
            ThreadOf::Parent(parent) => parent.id.clone(),
        }
    }
}

/// Moderation approval state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Abuse report attached to a comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: RecordId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Registered user linked to a comment.
///
/// Accepts a bare id or a populated profile. Only public profile fields
/// are kept; credentials never deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AuthorUserRepr")]
pub struct AuthorUser {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AuthorUserRepr {
    Id(RecordId),
    Profile {
        id: RecordId,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        avatar: Option<Value>,
    },
}

impl From<AuthorUserRepr> for AuthorUser {
    fn from(repr: AuthorUserRepr) -> Self {
        match repr {
            AuthorUserRepr::Id(id) => Self {
                id,
                username: None,
                email: None,
                avatar: None,
            },
            AuthorUserRepr::Profile {
                id,
                username,
                email,
                avatar,
            } => Self {
                id,
                username,
                email,
                avatar,
            },
        }
    }
}

/// Comment author
#[derive(Debug, Clone, PartialEq)]
pub enum Author {
    Registered(AuthorUser),
    Anonymous {
        id: Option<RecordId>,
        name: Option<String>,
        email: Option<String>,
        avatar: Option<String>,
    },
}

/// Author of a comment being created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NewAuthor {
    User(RecordId),
    Anonymous {
        id: Option<String>,
        name: String,
        email: String,
        #[serde(default)]
        avatar: Option<String>,
    },
}

/// Comment submitted for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub related: String,
    #[serde(default)]
    pub thread_of: Option<RecordId>,
    pub author: NewAuthor,
    #[serde(default)]
    pub approval_status: Option<ApprovalStatus>,
}

impl NewComment {
    /// Record shape handed to the store for insertion
    pub fn to_record(&self) -> Value {
        let mut record = Map::new();
        record.insert("content".into(), Value::from(self.content.as_str()));
        record.insert("related".into(), Value::from(self.related.as_str()));
        record.insert(
            "threadOf".into(),
            self.thread_of.as_ref().map(RecordId::to_value).unwrap_or(Value::Null),
        );
        record.insert("blocked".into(), Value::Bool(false));
        record.insert("blockedThread".into(), Value::Bool(false));
        match &self.author {
            NewAuthor::User(id) => {
                record.insert("authorUser".into(), id.to_value());
            }
            NewAuthor::Anonymous {
                id,
                name,
                email,
                avatar,
            } => {
                if let Some(id) = id {
                    record.insert("authorId".into(), Value::from(id.as_str()));
                }
                record.insert("authorName".into(), Value::from(name.as_str()));
                record.insert("authorEmail".into(), Value::from(email.as_str()));
                if let Some(avatar) = avatar {
                    record.insert("authorAvatar".into(), Value::from(avatar.as_str()));
                }
            }
        }
        if let Some(status) = self.approval_status {
            record.insert(
                "approvalStatus".into(),
                serde_json::to_value(status).unwrap_or(Value::Null),
            );
        }
        Value::Object(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_record() {
        let comment = Comment::from_record(json!({ "id": 1, "content": "hi" })).unwrap();
        assert_eq!(comment.id, RecordId::Int(1));
        assert!(comment.thread_of.is_none());
        assert!(!comment.blocked);
        assert!(comment.author().is_none());
    }

    #[test]
    fn test_thread_of_forms() {
        let plain = Comment::from_record(json!({ "id": 2, "threadOf": 1 })).unwrap();
        assert_eq!(plain.thread_of_id(), Some(RecordId::Int(1)));

        let populated = Comment::from_record(json!({
            "id": 3,
            "threadOf": { "id": 1, "content": "parent" }
        }))
        .unwrap();
        assert_eq!(populated.thread_of_id(), Some(RecordId::Int(1)));

        let root = Comment::from_record(json!({ "id": 4, "threadOf": null })).unwrap();
        assert_eq!(root.thread_of_id(), None);
    }

    #[test]
    fn test_author_forms() {
        let registered = Comment::from_record(json!({
            "id": 1,
            "authorUser": { "id": 9, "username": "ann", "password": "secret" }
        }))
        .unwrap();
        match registered.author() {
            Some(Author::Registered(user)) => {
                assert_eq!(user.username.as_deref(), Some("ann"));
            }
            other => panic!("unexpected author: {other:?}"),
        }

        let anonymous = Comment::from_record(json!({
            "id": 2,
            "authorId": "guest-1",
            "authorName": "Guest",
            "authorEmail": "guest@example.com"
        }))
        .unwrap();
        assert!(matches!(anonymous.author(), Some(Author::Anonymous { .. })));

        let linked = Comment::from_record(json!({ "id": 3, "authorUser": 9 })).unwrap();
        assert_eq!(linked.author_user.map(|u| u.id), Some(RecordId::Int(9)));
    }

    #[test]
    fn test_related_and_extensions() {
        let comment = Comment::from_record(json!({
            "id": 1,
            "related": "api::article.article:4",
            "locale": "en",
            "approvalStatus": "APPROVED"
        }))
        .unwrap();
        assert_eq!(comment.related_token(), Some("api::article.article:4"));
        assert_eq!(comment.approval_status, Some(ApprovalStatus::Approved));
        assert_eq!(comment.extensions.get("locale"), Some(&json!("en")));
    }

    #[test]
    fn test_malformed_record() {
        let result = Comment::from_record(json!({ "content": "no id" }));
        assert!(matches!(result, Err(CommentsError::Store(_))));
    }

    #[test]
    fn test_new_comment_record() {
        let draft = NewComment {
            content: "First!".to_string(),
            related: "api::article.article:1".to_string(),
            thread_of: Some(RecordId::Int(5)),
            author: NewAuthor::Anonymous {
                id: None,
                name: "Guest".to_string(),
                email: "guest@example.com".to_string(),
                avatar: None,
            },
            approval_status: Some(ApprovalStatus::Pending),
        };
        let record = draft.to_record();
        assert_eq!(record["threadOf"], json!(5));
        assert_eq!(record["authorName"], json!("Guest"));
        assert_eq!(record["approvalStatus"], json!("PENDING"));
        assert_eq!(record["blocked"], json!(false));
    }
}
