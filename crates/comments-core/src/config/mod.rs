//! Configuration for the comments engine
//!
//! Typed settings plus the two-tier [`ConfigResolver`]: a remote document
//! kept in the configuration store wins over the local static tree.

mod resolver;

pub use resolver::{lookup_path, ConfigResolver, LocalConfig, CONFIG_NAMESPACE, REMOTE_CONFIG_KEY};

use serde::{Deserialize, Serialize};

/// Dotted config paths read by the engine
pub mod keys {
    pub const ENABLED_COLLECTIONS: &str = "enabledCollections";
    pub const BAD_WORDS: &str = "badWords";
    pub const APPROVAL_FLOW: &str = "approvalFlow";
    pub const BLOCKED_AUTHOR_PROPS: &str = "blockedAuthorProps";
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommentsConfig {
    /// Collections comments may be attached to
    pub enabled_collections: Vec<String>,
    /// Profanity filter switch or custom filter options
    pub bad_words: BadWordsSetting,
    /// Collections whose new comments wait for approval
    pub approval_flow: Vec<String>,
    /// Extra fields stripped from externally visible comments
    pub blocked_author_props: Vec<String>,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enabled_collections: Vec::new(),
            bad_words: BadWordsSetting::default(),
            approval_flow: Vec::new(),
            blocked_author_props: Vec::new(),
        }
    }
}

impl CommentsConfig {
    /// Check if new comments for a collection require approval
    pub fn requires_approval(&self, collection: &str) -> bool {
        self.approval_flow.iter().any(|c| c == collection)
    }
}

/// `badWords` accepts either a switch or a custom filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BadWordsSetting {
    Enabled(bool),
    Custom(FilterOptions),
}

impl Default for BadWordsSetting {
    fn default() -> Self {
        BadWordsSetting::Enabled(true)
    }
}

impl BadWordsSetting {
    /// Whether the filter runs at all
    pub fn is_enabled(&self) -> bool {
        !matches!(self, BadWordsSetting::Enabled(false))
    }

    /// Custom options, if any
    pub fn options(&self) -> Option<&FilterOptions> {
        match self {
            BadWordsSetting::Custom(options) => Some(options),
            BadWordsSetting::Enabled(_) => None,
        }
    }
}

/// Word-list filter options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterOptions {
    /// Extra words added to the list
    pub list: Vec<String>,
    /// Words removed from the list
    pub exclude: Vec<String>,
    /// Start from an empty list instead of the built-in one
    pub empty_list: bool,
    /// Mask character used when cleaning
    pub placeholder: char,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            exclude: Vec::new(),
            empty_list: false,
            placeholder: '*',
        }
    }
}
