//! Declared links from one visualization's action to another's reaction.

use serde::{Deserialize, Serialize};

use crate::mapping::ColumnRef;

/// Routes a trigger fired on `source` to a reaction on `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionMapping {
    pub source: String,
    pub trigger: String,
    pub target: String,
    pub reaction: String,
    /// Source columns passed on; empty passes every output column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnRef>,
}

impl InteractionMapping {
    pub fn new(
        source: impl Into<String>,
        trigger: impl Into<String>,
        target: impl Into<String>,
        reaction: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            trigger: trigger.into(),
            target: target.into(),
            reaction: reaction.into(),
            columns: Vec::new(),
        }
    }

    /// Restrict the columns passed to the target.
    pub fn with_columns(mut self, columns: Vec<ColumnRef>) -> Self {
        self.columns = columns;
        self
    }

    /// Whether output from this source column reaches the target.
    pub fn passes(&self, column: &ColumnRef) -> bool {
        self.columns.is_empty() || self.columns.contains(column)
    }

    pub fn matches(&self, source: &str, trigger: &str) -> bool {
        self.source == source && self.trigger == trigger
    }

    /// Whether the mapping mentions a visualization at either end.
    pub fn involves(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_all_when_unrestricted() {
        let mapping = InteractionMapping::new("A", "clickSlice", "B", "filter");
        assert!(mapping.passes(&ColumnRef::new("category")));

        let mapping = mapping.with_columns(vec![ColumnRef::new("category")]);
        assert!(mapping.passes(&ColumnRef::new("category")));
        assert!(!mapping.passes(&ColumnRef::indexed("measure", 0)));
    }

    #[test]
    fn test_json_columns_optional() {
        let json = r#"{"source":"A","trigger":"clickSlice","target":"B","reaction":"filter"}"#;
        let mapping: InteractionMapping = serde_json::from_str(json).unwrap();
        assert!(mapping.columns.is_empty());
        assert!(mapping.matches("A", "clickSlice"));
        assert!(mapping.involves("B"));
    }
}
