//! Core type definitions for query result columns.

use serde::{Deserialize, Serialize};

/// Data type of a BI column as reported by the semantic layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Variable-length text.
    Varchar,
    /// Fixed-length text.
    Char,
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Double,
    /// Decimal numbers.
    Numeric,
    /// Date only (no time component).
    Date,
    /// Date and time.
    Timestamp,
}

impl DataType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Integer | DataType::Double | DataType::Numeric
        )
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Timestamp)
    }

    /// Default display pattern for values of this type.
    pub fn default_format(&self) -> &'static str {
        match self {
            DataType::Double | DataType::Numeric => ".3s",
            DataType::Integer => ".0f",
            DataType::Date => "%d/%m/%Y",
            DataType::Timestamp => "%d/%m/%Y %H:%M",
            DataType::Varchar | DataType::Char => "%s",
        }
    }
}

impl Default for DataType {
    fn default() -> Self {
        DataType::Varchar
    }
}

/// Aggregation rule applied to a column by the BI server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Not aggregated (an attribute).
    None,
    Sum,
    Avg,
    Count,
    CountDistinct,
    Min,
    Max,
    /// Aggregated by a rule the server does not expose.
    ServerDefault,
}

impl Aggregation {
    /// Returns true if values of the column are aggregated.
    pub fn is_aggregated(&self) -> bool {
        !matches!(self, Aggregation::None)
    }
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_temporal() {
        assert!(DataType::Integer.is_numeric());
        assert!(DataType::Numeric.is_numeric());
        assert!(!DataType::Varchar.is_numeric());
        assert!(DataType::Timestamp.is_temporal());
        assert!(!DataType::Double.is_temporal());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Aggregation::CountDistinct).unwrap();
        assert_eq!(json, "\"count_distinct\"");
        let ty: DataType = serde_json::from_str("\"timestamp\"").unwrap();
        assert_eq!(ty, DataType::Timestamp);
    }
}
