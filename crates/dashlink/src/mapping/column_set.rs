//! Column maps namespaced by dataset.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::Value;
use crate::schema::Column;

use super::column_map::ColumnMap;
use super::reference::ColumnRef;

/// The column bindings of one visualization.
///
/// Plugins that draw from several queries at once key one map per dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSet {
    Single(ColumnMap),
    Datasets(IndexMap<String, ColumnMap>),
}

impl Default for ColumnSet {
    fn default() -> Self {
        ColumnSet::Single(ColumnMap::default())
    }
}

impl ColumnSet {
    /// The map for a dataset key.
    ///
    /// A single set answers only `None`; a dataset set answers only a key it
    /// holds.
    pub fn map(&self, dataset: Option<&str>) -> Option<&ColumnMap> {
        match (self, dataset) {
            (ColumnSet::Single(map), None) => Some(map),
            (ColumnSet::Datasets(maps), Some(key)) => maps.get(key),
            _ => None,
        }
    }

    pub fn resolve(&self, dataset: Option<&str>, column: &ColumnRef) -> Option<&Column> {
        self.map(dataset)?.resolve(column)
    }

    /// Format a value with the referenced column's formatter.
    pub fn format(&self, dataset: Option<&str>, column: &ColumnRef, value: &Value) -> Option<String> {
        self.map(dataset)?.format(column, value)
    }

    /// Every map with its dataset key.
    pub fn maps(&self) -> Vec<(Option<&str>, &ColumnMap)> {
        match self {
            ColumnSet::Single(map) => vec![(None, map)],
            ColumnSet::Datasets(maps) => maps.iter().map(|(k, m)| (Some(k.as_str()), m)).collect(),
        }
    }

    /// First column with this code across all maps.
    pub fn find_by_code(&self, code: &str) -> Option<(Option<&str>, ColumnRef)> {
        self.maps()
            .into_iter()
            .find_map(|(dataset, map)| map.find_by_code(code).map(|r| (dataset, r)))
    }

    /// Distinct subject areas across all maps.
    pub fn subject_areas(&self) -> Vec<&str> {
        let mut areas: Vec<&str> = Vec::new();
        for (_, map) in self.maps() {
            for area in map.subject_areas() {
                if !areas.contains(&area) {
                    areas.push(area);
                }
            }
        }
        areas
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, ColumnSet::Datasets(_))
    }
}

impl From<ColumnMap> for ColumnSet {
    fn from(map: ColumnMap) -> Self {
        ColumnSet::Single(map)
    }
}
