//! Visualizations as stored in a document and as live on a page.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::formatting::ConditionalFormat;
use crate::interaction::QuerySet;
use crate::mapping::ColumnSet;
use crate::plugin::VisConfig;

/// A visualization as persisted in a dashboard document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    /// Plugin id.
    pub plugin: String,
    /// Raw configuration, coerced against the plugin schema at load.
    #[serde(default)]
    pub config: IndexMap<String, Json>,
    #[serde(default)]
    pub columns: ColumnSet,
    #[serde(default)]
    pub query: QuerySet,
    #[serde(default)]
    pub conditional_formats: Vec<ConditionalFormat>,
}

impl VisualizationSpec {
    pub fn new(id: impl Into<String>, plugin: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            display_name: id.clone(),
            id,
            plugin: plugin.into(),
            config: IndexMap::new(),
            columns: ColumnSet::default(),
            query: QuerySet::default(),
            conditional_formats: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: impl Into<ColumnSet>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<QuerySet>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: Json) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn with_format(mut self, format: impl Into<ConditionalFormat>) -> Self {
        self.conditional_formats.push(format.into());
        self
    }
}

/// A loaded visualization: validated configuration and live query state.
#[derive(Debug, Clone, PartialEq)]
pub struct Visualization {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub plugin: String,
    pub config: VisConfig,
    pub columns: ColumnSet,
    pub query: QuerySet,
    pub formats: Vec<ConditionalFormat>,
}

impl Visualization {
    pub fn new(id: impl Into<String>, plugin: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            display_name: id.clone(),
            id,
            plugin: plugin.into(),
            config: VisConfig::default(),
            columns: ColumnSet::default(),
            query: QuerySet::default(),
            formats: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: impl Into<ColumnSet>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<QuerySet>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_config(mut self, config: VisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_formats(mut self, formats: Vec<ConditionalFormat>) -> Self {
        self.formats = formats;
        self
    }

    /// Subject area an action on a dataset draws from.
    ///
    /// Falls back to the first query's subject area. Bound columns are not
    /// consulted, so a source broadcasts only to the areas targets query.
    pub fn subject_area(&self, dataset: Option<&str>) -> Option<&str> {
        self.query
            .query(dataset)
            .map(|q| q.subject_area.as_str())
            .filter(|area| !area.is_empty())
            .or_else(|| self.query.subject_areas().into_iter().next())
    }

    /// Whether the visualization queries a subject area.
    pub fn uses_subject_area(&self, subject_area: &str) -> bool {
        self.query.has_subject_area(subject_area)
    }

    /// Snapshot back into document form. Configuration is written typed.
    pub fn to_spec(&self) -> VisualizationSpec {
        let config = serde_json::to_value(&self.config)
            .ok()
            .and_then(|json| serde_json::from_value(json).ok())
            .unwrap_or_default();
        VisualizationSpec {
            id: self.id.clone(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            plugin: self.plugin.clone(),
            config,
            columns: self.columns.clone(),
            query: self.query.clone(),
            conditional_formats: self.formats.clone(),
        }
    }
}
