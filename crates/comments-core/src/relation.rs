//! Polymorphic relation tokens
//!
//! A comment points at an arbitrary domain record through a
//! `"<collectionId>:<recordId>"` token. Collection ids may themselves contain
//! colons (`api::article.article`), so the record id is whatever follows the
//! last one.

use crate::error::{CommentsError, Result};
use crate::types::RecordId;
use std::fmt;
use std::str::FromStr;

/// Decoded relation token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationRef {
    pub collection: String,
    pub id: RecordId,
}

impl RelationRef {
    pub fn new(collection: impl Into<String>, id: impl Into<RecordId>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Encode as `collection:id`
    pub fn encode(&self) -> String {
        encode(&self.collection, &self.id)
    }

    /// Decode a token; the id is numeric when it parses as an integer
    pub fn decode(token: &str) -> Result<Self> {
        let (collection, id) = decode(token)?;
        Ok(Self { collection, id })
    }
}

impl fmt::Display for RelationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.collection, self.id)
    }
}

impl FromStr for RelationRef {
    type Err = CommentsError;

    fn from_str(s: &str) -> Result<Self> {
        RelationRef::decode(s)
    }
}

/// Encode a relation token
pub fn encode(collection: &str, id: &RecordId) -> String {
    format!("{}:{}", collection, id)
}

/// Decode a relation token into `(collection, id)`
pub fn decode(token: &str) -> Result<(String, RecordId)> {
    let invalid = || CommentsError::InvalidQuery(format!("Invalid relation token '{}'", token));

    let (collection, id) = token.trim().rsplit_once(':').ok_or_else(invalid)?;
    if collection.is_empty() || collection.ends_with(':') || id.trim().is_empty() {
        return Err(invalid());
    }
    Ok((collection.to_string(), RecordId::parse(id)))
}

/// Check `collection` against the enabled allow-list
pub fn validate<'a>(collection: &'a str, allowed: &[String]) -> Result<&'a str> {
    if allowed.iter().any(|c| c == collection) {
        Ok(collection)
    } else {
        Err(CommentsError::Forbidden {
            collection: collection.to_string(),
            allowed: allowed.to_vec(),
        })
    }
}
