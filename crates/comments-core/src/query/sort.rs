//! Sort parameter parsing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse `asc`/`desc`, case-insensitively
    pub fn from_str_opt(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Asc
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering on a (possibly nested) field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub path: Vec<String>,
    pub direction: SortDirection,
}

impl SortField {
    /// Parse `field`, `field:asc`, `field:desc` or `nested.field:desc`.
    ///
    /// Anything without a recognised direction suffix is a plain field name
    /// sorted ascending.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (field, direction) = match raw.rsplit_once(':') {
            Some((field, dir)) if is_field_path(field) => match SortDirection::from_str_opt(dir) {
                Some(direction) => (field, direction),
                None => (raw, SortDirection::Asc),
            },
            _ => (raw, SortDirection::Asc),
        };

        let path = field
            .split(|c| c == '.' || c == ':')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        Self { path, direction }
    }

    /// Field path joined with dots
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

fn is_field_path(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// User-facing sort parameter: one string or an ordered list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortInput {
    One(String),
    Many(Vec<String>),
}

impl SortInput {
    /// Compile into ordered sort fields, skipping blank entries
    pub fn compile(&self) -> Vec<SortField> {
        let raw: Vec<&str> = match self {
            SortInput::One(s) => vec![s.as_str()],
            SortInput::Many(items) => items.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(SortField::parse)
            .filter(|field| !field.path.is_empty())
            .collect()
    }
}

impl From<&str> for SortInput {
    fn from(s: &str) -> Self {
        SortInput::One(s.to_string())
    }
}
