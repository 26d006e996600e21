//! Tabular result model shared by every endpoint.
//!
//! A [`RecordSet`] is an ordered list of [`Record`]s that all carry exactly
//! the same column names. Records are explicit name -> [`Scalar`] mappings,
//! never positional tuples, so rows from pages with different fields can be
//! aligned by [`RecordSet::reconcile`].

mod reconcile;
mod scalar;

pub use scalar::Scalar;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Errors raised when a record does not match its set's schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The record's key set differs from the set's columns.
    #[error("record columns {found:?} do not match schema {expected:?}")]
    SchemaMismatch {
        /// Columns of the record set.
        expected: Vec<String>,
        /// Columns of the rejected record.
        found: Vec<String>,
    },
}

/// One normalized row: column name -> value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Scalar)>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, column: &str, value: Scalar) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets `column`, replacing any previous value in place.
    pub fn insert(&mut self, column: &str, value: Scalar) {
        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| name == column) {
            slot.1 = value;
        } else {
            self.fields.push((column.to_string(), value));
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn has_key_set(&self, columns: &[String]) -> bool {
        self.fields.len() == columns.len() && columns.iter().all(|c| self.contains(c))
    }

    /// Reorders fields to match `columns`. Caller guarantees equal key sets.
    fn align_to(&mut self, columns: &[String]) {
        let mut aligned = Vec::with_capacity(columns.len());
        for column in columns {
            if let Some(pos) = self.fields.iter().position(|(name, _)| name == column) {
                aligned.push(self.fields.swap_remove(pos));
            }
        }
        self.fields = aligned;
    }
}

/// Serializes as a JSON object; `Missing` cells are omitted.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.fields.iter().filter(|(_, v)| !v.is_missing());
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in present {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Ordered records sharing one column schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    /// Creates an empty set with a fixed schema.
    #[must_use]
    pub fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(ToString::to_string).collect(),
            records: Vec::new(),
        }
    }

    /// Appends a record whose key set must equal the schema.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::SchemaMismatch`] if the key sets differ.
    pub fn push(&mut self, mut record: Record) -> Result<(), RecordError> {
        if !record.has_key_set(&self.columns) {
            return Err(RecordError::SchemaMismatch {
                expected: self.columns.clone(),
                found: record.columns().map(ToString::to_string).collect(),
            });
        }
        record.align_to(&self.columns);
        self.records.push(record);
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// All values of one column, in record order.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Scalar> + 'a {
        self.records.iter().filter_map(move |r| r.get(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keeps the first `n` records.
    pub fn truncate(&mut self, n: usize) {
        self.records.truncate(n);
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
