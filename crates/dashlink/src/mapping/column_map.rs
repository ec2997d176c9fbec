//! Role-named binding of a visualization's inputs to result columns.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::Value;
use crate::schema::Column;

use super::reference::ColumnRef;

/// The column(s) bound to one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binding {
    /// Ordered columns of a role that accepts multiples.
    Multiple(Vec<Column>),
    Single(Column),
}

impl Binding {
    /// Columns in binding order.
    pub fn columns(&self) -> &[Column] {
        match self {
            Binding::Multiple(cols) => cols,
            Binding::Single(col) => std::slice::from_ref(col),
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, Binding::Multiple(_))
    }
}

/// Mapping from role name to bound column(s), in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMap {
    roles: IndexMap<String, Binding>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a single column to a role.
    pub fn with_single(mut self, role: impl Into<String>, column: Column) -> Self {
        self.roles.insert(role.into(), Binding::Single(column));
        self
    }

    /// Bind an ordered list of columns to a role.
    pub fn with_multiple(mut self, role: impl Into<String>, columns: Vec<Column>) -> Self {
        self.roles.insert(role.into(), Binding::Multiple(columns));
        self
    }

    /// Insert or replace a binding.
    pub fn insert(&mut self, role: impl Into<String>, binding: Binding) {
        self.roles.insert(role.into(), binding);
    }

    /// Binding for a role.
    pub fn binding(&self, role: &str) -> Option<&Binding> {
        self.roles.get(role)
    }

    /// Resolve a reference to a single column.
    ///
    /// Indexed references only address multi-valued roles, and un-indexed
    /// references only single-valued ones.
    pub fn resolve(&self, column: &ColumnRef) -> Option<&Column> {
        match (self.roles.get(column.role())?, column.index()) {
            (Binding::Single(col), None) => Some(col),
            (Binding::Multiple(cols), Some(idx)) => cols.get(idx),
            _ => None,
        }
    }

    /// Every bound column with its reference, in map order.
    pub fn columns(&self) -> Vec<(ColumnRef, &Column)> {
        let mut out = Vec::new();
        for (role, binding) in &self.roles {
            match binding {
                Binding::Single(col) => out.push((ColumnRef::new(role.clone()), col)),
                Binding::Multiple(cols) => {
                    for (idx, col) in cols.iter().enumerate() {
                        out.push((ColumnRef::indexed(role.clone(), idx), col));
                    }
                }
            }
        }
        out
    }

    /// Reference of the first column with this code.
    pub fn find_by_code(&self, code: &str) -> Option<ColumnRef> {
        self.columns()
            .into_iter()
            .find(|(_, col)| col.code == code)
            .map(|(r, _)| r)
    }

    /// Reference of the last column with this display name.
    pub fn find_by_name(&self, name: &str) -> Option<ColumnRef> {
        self.columns()
            .into_iter()
            .filter(|(_, col)| col.name == name)
            .map(|(r, _)| r)
            .last()
    }

    /// Display name of the referenced column.
    pub fn column_name(&self, column: &ColumnRef) -> Option<&str> {
        self.resolve(column).map(|col| col.name.as_str())
    }

    /// Format a value with the referenced column's formatter.
    pub fn format(&self, column: &ColumnRef, value: &Value) -> Option<String> {
        self.resolve(column).map(|col| col.format(value))
    }

    /// Distinct subject areas of the bound columns, in first-seen order.
    pub fn subject_areas(&self) -> Vec<&str> {
        let mut areas: Vec<&str> = Vec::new();
        for (_, col) in self.columns() {
            let area = col.subject_area.as_str();
            if !area.is_empty() && !areas.contains(&area) {
                areas.push(area);
            }
        }
        areas
    }

    /// Role names in declaration order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(|k| k.as_str())
    }

    /// Role/binding pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.roles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Aggregation, DataType};

    fn sales_map() -> ColumnMap {
        ColumnMap::new()
            .with_single(
                "category",
                Column::new("\"Geo\".\"Region\"", "Region").with_subject_area("Sales"),
            )
            .with_multiple(
                "measure",
                vec![
                    Column::new("\"Facts\".\"Revenue\"", "Revenue")
                        .with_type(DataType::Double)
                        .with_aggregation(Aggregation::Sum)
                        .with_format(",.0f")
                        .with_subject_area("Sales"),
                    Column::new("\"Facts\".\"Cost\"", "Cost")
                        .with_type(DataType::Double)
                        .with_aggregation(Aggregation::Sum)
                        .with_subject_area("Sales"),
                ],
            )
    }

    #[test]
    fn test_resolve() {
        let map = sales_map();
        assert_eq!(map.column_name(&ColumnRef::new("category")), Some("Region"));
        assert_eq!(map.column_name(&ColumnRef::indexed("measure", 1)), Some("Cost"));
        assert!(map.resolve(&ColumnRef::new("measure")).is_none());
        assert!(map.resolve(&ColumnRef::indexed("measure", 2)).is_none());
        assert!(map.resolve(&ColumnRef::indexed("category", 0)).is_none());
        assert!(map.resolve(&ColumnRef::new("lat")).is_none());
    }

    #[test]
    fn test_columns_flatten_in_order() {
        let refs: Vec<String> = sales_map()
            .columns()
            .into_iter()
            .map(|(r, _)| r.to_string())
            .collect();
        assert_eq!(refs, vec!["category", "measure0", "measure1"]);
    }

    #[test]
    fn test_find_by_code_and_name() {
        let map = sales_map();
        assert_eq!(
            map.find_by_code("\"Facts\".\"Cost\""),
            Some(ColumnRef::indexed("measure", 1))
        );
        assert_eq!(map.find_by_name("Region"), Some(ColumnRef::new("category")));
        assert_eq!(map.find_by_code("nope"), None);
    }

    #[test]
    fn test_format_delegates_to_column() {
        let map = sales_map();
        let out = map.format(&ColumnRef::indexed("measure", 0), &Value::from(1234567.0));
        assert_eq!(out.as_deref(), Some("1,234,567"));
        assert_eq!(map.format(&ColumnRef::new("missing"), &Value::from(1.0)), None);
    }

    #[test]
    fn test_subject_areas_are_distinct() {
        assert_eq!(sales_map().subject_areas(), vec!["Sales"]);
    }

    #[test]
    fn test_json_bindings() {
        let json = r#"{
            "category": {"code": "c", "name": "Region"},
            "measure": [{"code": "m", "name": "Revenue", "data_type": "double"}]
        }"#;
        let map: ColumnMap = serde_json::from_str(json).unwrap();
        assert!(!map.binding("category").unwrap().is_multiple());
        assert!(map.binding("measure").unwrap().is_multiple());
    }
}
