//! Content moderation
//!
//! Gates comment text through a profanity filter switched by the
//! `badWords` configuration entry.

mod filter;

pub use filter::{ContentFilter, WordListFilter};

use crate::config::{keys, BadWordsSetting, ConfigResolver, FilterOptions};
use crate::error::{CommentsError, Result};
use std::sync::Arc;
use tracing::debug;

/// Builds a content filter from optional custom options
pub type FilterFactory =
    Arc<dyn Fn(Option<&FilterOptions>) -> Box<dyn ContentFilter> + Send + Sync>;

/// Configuration-gated profanity check
#[derive(Clone)]
pub struct ModerationFilter {
    resolver: ConfigResolver,
    factory: FilterFactory,
}

impl ModerationFilter {
    /// Moderation backed by the built-in word list
    pub fn new(resolver: ConfigResolver) -> Self {
        Self::with_factory(resolver, Arc::new(word_list_filter))
    }

    /// Moderation backed by a custom filter implementation
    pub fn with_factory(resolver: ConfigResolver, factory: FilterFactory) -> Self {
        Self { resolver, factory }
    }

    /// Return `content` unchanged unless it is profane and filtering is on.
    ///
    /// Missing content always passes.
    pub async fn check_bad_words<'a>(&self, content: Option<&'a str>) -> Result<Option<&'a str>> {
        let Some(text) = content else {
            return Ok(None);
        };

        let setting: BadWordsSetting = self
            .resolver
            .get_as(keys::BAD_WORDS, BadWordsSetting::default(), false)
            .await?;
        if !setting.is_enabled() {
            return Ok(content);
        }

        let filter = (self.factory)(setting.options());
        if filter.is_profane(text) {
            debug!("comment content rejected by profanity filter");
            return Err(CommentsError::PolicyViolation {
                original: text.to_string(),
                filtered: filter.clean(text),
            });
        }
        Ok(content)
    }
}

fn word_list_filter(options: Option<&FilterOptions>) -> Box<dyn ContentFilter> {
    Box::new(WordListFilter::from_options(options))
}
