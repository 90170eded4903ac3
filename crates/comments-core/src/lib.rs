//! comments-core - Core library for the comments engine
//!
//! This crate provides the retrieval and moderation logic for threaded
//! comments: layered configuration, polymorphic relation tokens, profanity
//! gating, query compilation, thread annotation, related-entity resolution,
//! tree reconstruction and cascading moderation updates.

pub mod error;
pub mod types;
pub mod config;
pub mod store;
pub mod query;
pub mod relation;
pub mod moderation;
pub mod comment;
pub mod service;

pub use error::{CommentsError, Result};
pub use types::*;
pub use service::{
    CommentPage, CommentService, FindParams, HierarchyParams, ModerationOutcome, RelatedLookup,
};
