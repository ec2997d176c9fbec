//! Column definition.

use serde::{Deserialize, Serialize};

use crate::data::Value;

use super::format::ColumnFormat;
use super::types::{Aggregation, DataType};

/// A reference to one field of a query result.
///
/// Columns are immutable once bound into a column map for a visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Logical SQL expression, typically `"Table"."Column"`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Data type reported by the BI server.
    #[serde(default)]
    pub data_type: DataType,
    /// Presentation table the column belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Aggregation rule; anything other than `none` makes this a measure.
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Subject area the column is drawn from.
    #[serde(default)]
    pub subject_area: String,
    /// Display pattern overriding the type default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_format: Option<String>,
}

impl Column {
    /// Create a varchar attribute column.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            data_type: DataType::Varchar,
            table: None,
            aggregation: Aggregation::None,
            subject_area: String::new(),
            data_format: None,
        }
    }

    /// Set the data type.
    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Set the aggregation rule.
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Set the subject area.
    pub fn with_subject_area(mut self, subject_area: impl Into<String>) -> Self {
        self.subject_area = subject_area.into();
        self
    }

    /// Set the presentation table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set an explicit display pattern.
    pub fn with_format(mut self, pattern: impl Into<String>) -> Self {
        self.data_format = Some(pattern.into());
        self
    }

    /// Check if this column is a measure.
    pub fn is_measure(&self) -> bool {
        self.aggregation.is_aggregated()
    }

    /// The effective display pattern.
    pub fn pattern(&self) -> &str {
        self.data_format
            .as_deref()
            .unwrap_or_else(|| self.data_type.default_format())
    }

    /// Parsed display format for this column.
    pub fn column_format(&self) -> ColumnFormat {
        ColumnFormat::parse(self.pattern(), self.data_type)
    }

    /// Format a value for display.
    pub fn format(&self, value: &Value) -> String {
        self.column_format().apply(value)
    }
}
