//! Store query criteria
//!
//! `Criteria` is both the wire shape handed to a [`RecordStore`] and an
//! in-process evaluator, so every store implementation agrees on matching,
//! ordering and paging semantics.
//!
//! [`RecordStore`]: crate::store::RecordStore

use super::sort::{SortDirection, SortField};
use crate::config::lookup_path;
use crate::types::RecordId;
use serde_json::Value;
use std::cmp::Ordering;

/// A single filter on a dotted field path
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals value
    Eq(String, Value),
    /// Field is one of the values
    In(String, Vec<Value>),
    /// Field is absent or null
    IsNull(String),
}

impl Filter {
    /// Check a record against this filter
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Filter::Eq(field, expected) => field_value(record, field)
                .map(|actual| loosely_equal(actual, expected))
                .unwrap_or(false),
            Filter::In(field, values) => field_value(record, field)
                .map(|actual| values.iter().any(|v| loosely_equal(actual, v)))
                .unwrap_or(false),
            Filter::IsNull(field) => field_value(record, field).is_none(),
        }
    }
}

/// Filters, ordering and paging for a store query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub filters: Vec<Filter>,
    pub sort: Vec<SortField>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl Criteria {
    /// Create criteria matching everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.into(), value.into()));
        self
    }

    /// Add an "in set" filter
    pub fn is_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(field.into(), values));
        self
    }

    /// Add a null filter
    pub fn is_null(mut self, field: impl Into<String>) -> Self {
        self.filters.push(Filter::IsNull(field.into()));
        self
    }

    /// Add a filter
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append ordering
    pub fn order_by(mut self, fields: impl IntoIterator<Item = SortField>) -> Self {
        self.sort.extend(fields);
        self
    }

    /// Skip the first `offset` matches
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Return at most `limit` matches
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Same filters without ordering or paging, as used by count queries
    pub fn without_paging(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            ..Self::default()
        }
    }

    /// Check a record against every filter
    pub fn matches(&self, record: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Number of matching records, ignoring paging
    pub fn count(&self, records: &[Value]) -> u64 {
        records.iter().filter(|r| self.matches(r)).count() as u64
    }

    /// Filter, order and page a record set
    pub fn apply(&self, records: Vec<Value>) -> Vec<Value> {
        let mut matched: Vec<Value> = records.into_iter().filter(|r| self.matches(r)).collect();

        if !self.sort.is_empty() {
            matched.sort_by(|a, b| self.compare(a, b));
        }

        matched
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for field in &self.sort {
            let path = field.dotted();
            let ordering = compare_values(field_value(a, &path), field_value(b, &path));
            let ordering = match field.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Non-null value at `path`
fn field_value<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    lookup_path(record, path).filter(|v| !v.is_null())
}

/// Equality that treats `1`, `"1"` and a populated `{ "id": 1 }` relation alike
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    if let Value::Object(map) = actual {
        if let Some(id) = map.get("id") {
            return loosely_equal(id, expected);
        }
    }
    match (RecordId::from_value(actual), RecordId::from_value(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over optional values; missing sorts first
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}
