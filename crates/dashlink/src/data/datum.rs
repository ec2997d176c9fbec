//! Datum and dataset containers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::mapping::ColumnRef;

use super::value::Value;

/// One value of a multi-valued role, tagged with its column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: Value,
}

/// The value(s) a datum holds for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    /// One value per column bound to a multi-valued role, in binding order.
    Multi(Vec<NamedValue>),
    /// The value of a single-valued role.
    Scalar(Value),
}

/// One row of rendered data, keyed by column-map role.
///
/// Datums are produced fresh for each render and never mutated by the
/// engine; styles derived from them are transient.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Datum {
    fields: IndexMap<String, Field>,
}

impl Datum {
    /// Create an empty datum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single-valued role.
    pub fn with(mut self, role: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .insert(role.into(), Field::Scalar(value.into()));
        self
    }

    /// Set a multi-valued role from `(column name, value)` pairs.
    pub fn with_multi<N, V>(mut self, role: impl Into<String>, values: Vec<(N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
    {
        let values = values
            .into_iter()
            .map(|(name, value)| NamedValue {
                name: name.into(),
                value: value.into(),
            })
            .collect();
        self.fields.insert(role.into(), Field::Multi(values));
        self
    }

    /// Raw field for a role.
    pub fn field(&self, role: &str) -> Option<&Field> {
        self.fields.get(role)
    }

    /// Resolve a column reference to a value.
    ///
    /// An un-indexed reference only reads scalar fields and an indexed one only
    /// reads multi fields. Anything that does not line up yields `None`.
    pub fn get(&self, column: &ColumnRef) -> Option<&Value> {
        match (self.fields.get(column.role())?, column.index()) {
            (Field::Scalar(value), None) => Some(value),
            (Field::Multi(values), Some(idx)) => values.get(idx).map(|v| &v.value),
            _ => None,
        }
    }

    /// Roles present in this datum, in insertion order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The rows handed to a render call.
///
/// Plugins with multiple datasets receive one row list per dataset key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Data {
    Single(Vec<Datum>),
    Datasets(IndexMap<String, Vec<Datum>>),
}

impl Data {
    /// Rows for a dataset key, failing closed on any mismatch.
    pub fn rows(&self, dataset: Option<&str>) -> Option<&[Datum]> {
        match (self, dataset) {
            (Data::Single(rows), None) => Some(rows),
            (Data::Datasets(sets), Some(key)) => sets.get(key).map(|rows| rows.as_slice()),
            _ => None,
        }
    }

    /// Dataset keys, or a single `None` for single-dataset data.
    pub fn dataset_keys(&self) -> Vec<Option<&str>> {
        match self {
            Data::Single(_) => vec![None],
            Data::Datasets(sets) => sets.keys().map(|k| Some(k.as_str())).collect(),
        }
    }

    /// Total number of rows across datasets.
    pub fn len(&self) -> usize {
        match self {
            Data::Single(rows) => rows.len(),
            Data::Datasets(sets) => sets.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
