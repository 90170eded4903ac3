//! Comment system module
//!
//! Models, sanitization, thread annotation, related-entity resolution,
//! tree reconstruction and cascading moderation updates.

pub mod model;
pub mod view;
pub mod validator;
pub mod thread;
pub mod related;
pub mod tree;
pub mod cascade;

pub use model::*;
pub use view::{filter_resolved_reports, sanitize, AuthorView, CommentView};
pub use validator::CommentValidator;
pub use thread::{annotate_threads, ThreadSummary};
pub use related::RelatedEntities;
pub use tree::{build_tree, CommentNode, ThreadIndex};
pub use cascade::{cascade_field_update, CascadeReport};
