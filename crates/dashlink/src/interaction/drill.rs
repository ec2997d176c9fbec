//! Drilldowns: navigation from a visualization's action to another page,
//! carrying the clicked values and the source page's interaction filters.

use serde::{Deserialize, Serialize};

use crate::data::Value;
use crate::mapping::ColumnRef;
use crate::schema::Column;

use super::filter::{Filter, FilterNode, FilterOperator, Query};
use super::output::InteractionOutput;

/// Routes a trigger fired on `source` to the page at `drill_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drilldown {
    pub source: String,
    pub trigger: String,
    pub drill_path: String,
    /// Path of the page the source lives on, recorded in the breadcrumb.
    #[serde(default)]
    pub source_path: String,
    /// Source columns passed on; empty passes every output column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnRef>,
}

impl Drilldown {
    pub fn new(source: impl Into<String>, trigger: impl Into<String>, drill_path: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            trigger: trigger.into(),
            drill_path: drill_path.into(),
            source_path: String::new(),
            columns: Vec::new(),
        }
    }

    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnRef>) -> Self {
        self.columns = columns;
        self
    }

    pub fn passes(&self, column: &ColumnRef) -> bool {
        self.columns.is_empty() || self.columns.contains(column)
    }

    pub fn matches(&self, source: &str, trigger: &str) -> bool {
        self.source == source && self.trigger == trigger
    }

    pub fn involves(&self, id: &str) -> bool {
        self.source == id
    }
}

/// One filter handed to the drill target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillFilter {
    pub column: Column,
    #[serde(default)]
    pub operator: FilterOperator,
    pub values: Vec<Value>,
    /// Inherited from the source page rather than taken from the click.
    #[serde(default)]
    pub global: bool,
}

impl DrillFilter {
    /// As a query filter on the target page.
    pub fn to_filter(&self) -> Filter {
        Filter::new(self.column.code.clone(), self.column.subject_area.clone(), self.values.clone())
            .with_name(self.column.name.clone())
            .with_operator(self.operator)
            .global()
    }
}

/// One step of the navigation trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub source_path: String,
    pub target_path: String,
    #[serde(default)]
    pub drill_filter: Vec<DrillFilter>,
}

impl Breadcrumb {
    pub fn filters(&self) -> Vec<Filter> {
        self.drill_filter.iter().map(DrillFilter::to_filter).collect()
    }
}

/// A navigation requested by a fired trigger. The host performs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillRequest {
    pub source: String,
    pub trigger: String,
    pub path: String,
    pub filters: Vec<DrillFilter>,
    /// The trail that led to the source page, ending with this step.
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// Collect the filters for a drill.
///
/// Clicked values come first, one `in` filter per output column with values.
/// Top-level global filters on the source query follow, unless the click
/// already filters the same column.
pub fn drill_filters(outputs: &[InteractionOutput], source_query: Option<&Query>) -> Vec<DrillFilter> {
    let mut filters: Vec<DrillFilter> = outputs
        .iter()
        .filter(|o| !o.values.is_empty())
        .map(|o| DrillFilter {
            column: o.column.clone(),
            operator: FilterOperator::In,
            values: o.values.clone(),
            global: false,
        })
        .collect();

    let Some(query) = source_query else {
        return filters;
    };
    for node in &query.filters {
        let FilterNode::Filter(f) = node else {
            continue;
        };
        if !f.global || filters.iter().any(|d| d.column.code == f.code) {
            continue;
        }
        filters.push(DrillFilter {
            column: Column::new(f.code.clone(), f.name.clone()).with_subject_area(f.subject_area.clone()),
            operator: f.operator,
            values: f.values.clone(),
            global: true,
        });
    }
    filters
}
