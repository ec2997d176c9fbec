//! Query filters and the filter tree the `filter` reaction edits.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::Value;

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    #[default]
    In,
    NotIn,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Between,
    Contains,
}

/// A single column filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Logical SQL code of the filtered column.
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub operator: FilterOperator,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub subject_area: String,
    /// Set by interactions rather than authored with the dashboard.
    #[serde(default)]
    pub global: bool,
    /// Protected filters are never replaced by interactions.
    #[serde(default)]
    pub protected: bool,
}

impl Filter {
    /// An `in` filter on a column.
    pub fn new(code: impl Into<String>, subject_area: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            operator: FilterOperator::In,
            values,
            subject_area: subject_area.into(),
            global: false,
            protected: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_operator(mut self, operator: FilterOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }
}

/// Boolean combinator of a filter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOperator {
    #[default]
    And,
    Or,
}

/// A nested group of filters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub operator: GroupOperator,
    #[serde(default)]
    pub filters: Vec<FilterNode>,
}

/// A node in a query's filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterNode {
    Filter(Filter),
    Group(FilterGroup),
}

/// Outcome of [`replace_filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// A filter on the same column was overwritten.
    Replaced,
    /// A filter on the same column already matched exactly.
    Unchanged,
    /// A filter on the same column exists but is protected.
    Protected,
    NotFound,
}

/// Replace the first filter on the same column, searching groups depth-first.
pub fn replace_filter(nodes: &mut [FilterNode], new: &Filter) -> Replacement {
    for node in nodes.iter_mut() {
        match node {
            FilterNode::Filter(existing) if existing.code == new.code => {
                if existing.protected {
                    return Replacement::Protected;
                }
                if existing == new {
                    return Replacement::Unchanged;
                }
                *existing = new.clone();
                return Replacement::Replaced;
            }
            FilterNode::Filter(_) => {}
            FilterNode::Group(group) => match replace_filter(&mut group.filters, new) {
                Replacement::NotFound => {}
                found => return found,
            },
        }
    }
    Replacement::NotFound
}

/// A query against one subject area.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    pub subject_area: String,
    #[serde(default)]
    pub filters: Vec<FilterNode>,
}

impl Query {
    pub fn new(subject_area: impl Into<String>) -> Self {
        Self {
            subject_area: subject_area.into(),
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(FilterNode::Filter(filter));
        self
    }

    /// Apply an interaction filter: replace a same-column filter or append.
    ///
    /// Returns whether the filter tree changed. Filters for another subject
    /// area are ignored.
    pub fn apply_filter(&mut self, filter: &Filter) -> bool {
        if filter.subject_area != self.subject_area {
            return false;
        }
        match replace_filter(&mut self.filters, filter) {
            Replacement::Replaced => true,
            Replacement::Unchanged | Replacement::Protected => false,
            Replacement::NotFound => {
                self.filters.push(FilterNode::Filter(filter.clone()));
                true
            }
        }
    }

    /// First filter on a column, searching groups depth-first.
    pub fn find_filter(&self, code: &str) -> Option<&Filter> {
        fn walk<'a>(nodes: &'a [FilterNode], code: &str) -> Option<&'a Filter> {
            nodes.iter().find_map(|node| match node {
                FilterNode::Filter(f) if f.code == code => Some(f),
                FilterNode::Filter(_) => None,
                FilterNode::Group(group) => walk(&group.filters, code),
            })
        }
        walk(&self.filters, code)
    }
}

/// The queries behind one visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySet {
    Single(Query),
    Datasets(IndexMap<String, Query>),
}

impl Default for QuerySet {
    fn default() -> Self {
        QuerySet::Single(Query::default())
    }
}

impl QuerySet {
    pub fn query(&self, dataset: Option<&str>) -> Option<&Query> {
        match (self, dataset) {
            (QuerySet::Single(query), None) => Some(query),
            (QuerySet::Datasets(queries), Some(key)) => queries.get(key),
            _ => None,
        }
    }

    pub fn queries(&self) -> Vec<&Query> {
        match self {
            QuerySet::Single(query) => vec![query],
            QuerySet::Datasets(queries) => queries.values().collect(),
        }
    }

    /// Distinct non-empty subject areas.
    pub fn subject_areas(&self) -> Vec<&str> {
        let mut areas: Vec<&str> = Vec::new();
        for query in self.queries() {
            let area = query.subject_area.as_str();
            if !area.is_empty() && !areas.contains(&area) {
                areas.push(area);
            }
        }
        areas
    }

    pub fn has_subject_area(&self, subject_area: &str) -> bool {
        self.queries().iter().any(|q| q.subject_area == subject_area)
    }

    /// Apply a filter to every query of its subject area.
    pub fn apply_filter(&mut self, filter: &Filter) -> bool {
        match self {
            QuerySet::Single(query) => query.apply_filter(filter),
            QuerySet::Datasets(queries) => queries
                .values_mut()
                .fold(false, |changed, query| query.apply_filter(filter) || changed),
        }
    }
}

impl From<Query> for QuerySet {
    fn from(query: Query) -> Self {
        QuerySet::Single(query)
    }
}
