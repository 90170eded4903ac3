//! Word-list content filter

use crate::config::FilterOptions;
use std::collections::HashSet;

/// Built-in word list
const DEFAULT_WORDS: &[&str] = &[
    "arse", "arsehole", "ass", "asshole", "bastard", "bitch", "bollocks", "bullshit", "cock",
    "crap", "cunt", "damn", "dick", "dickhead", "fuck", "fucker", "fucking", "goddamn", "hell",
    "motherfucker", "piss", "prick", "shit", "shitty", "slut", "twat", "wanker", "whore",
];

/// Profanity check capability
pub trait ContentFilter: Send + Sync {
    /// Whether `text` contains a listed word
    fn is_profane(&self, text: &str) -> bool;

    /// `text` with every listed word masked
    fn clean(&self, text: &str) -> String;
}

/// Case-insensitive whole-word filter over a configurable list
#[derive(Debug, Clone)]
pub struct WordListFilter {
    words: HashSet<String>,
    placeholder: char,
}

impl WordListFilter {
    /// Filter using the built-in list
    pub fn new() -> Self {
        Self::from_options(None)
    }

    /// Filter built from optional custom options
    pub fn from_options(options: Option<&FilterOptions>) -> Self {
        let defaults = FilterOptions::default();
        let options = options.unwrap_or(&defaults);

        let mut words: HashSet<String> = if options.empty_list {
            HashSet::new()
        } else {
            DEFAULT_WORDS.iter().map(|w| w.to_string()).collect()
        };
        words.extend(options.list.iter().map(|w| w.to_lowercase()));
        for excluded in &options.exclude {
            words.remove(&excluded.to_lowercase());
        }

        Self {
            words,
            placeholder: options.placeholder,
        }
    }

    /// Number of listed words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn is_listed(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }
}

impl Default for WordListFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentFilter for WordListFilter {
    fn is_profane(&self, text: &str) -> bool {
        words(text).any(|(_, word)| self.is_listed(word))
    }

    fn clean(&self, text: &str) -> String {
        let mut cleaned = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, word) in words(text) {
            if self.is_listed(word) {
                cleaned.push_str(&text[cursor..start]);
                cleaned.extend(std::iter::repeat(self.placeholder).take(word.chars().count()));
                cursor = start + word.len();
            }
        }
        cleaned.push_str(&text[cursor..]);
        cleaned
    }
}

/// Alphanumeric runs of `text` with their byte offsets
fn words(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        let is_word = c.is_alphanumeric() || c == '\'';
        match (is_word, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                spans.push((s, &text[s..i]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, &text[s..]));
    }
    spans.into_iter()
}
