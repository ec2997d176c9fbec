//! The persisted dashboard document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interaction::{Drilldown, InteractionMapping};

use super::visualization::VisualizationSpec;

/// Current document format version.
pub const DOCUMENT_VERSION: &str = "1.0";

/// A dashboard page as stored: its visualizations and the interactions
/// between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardDocument {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub visualizations: Vec<VisualizationSpec>,
    #[serde(default)]
    pub interactions: Vec<InteractionMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drilldowns: Vec<Drilldown>,
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

impl DashboardDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            updated_at: Utc::now(),
            visualizations: Vec::new(),
            interactions: Vec::new(),
            drilldowns: Vec::new(),
        }
    }

    pub fn with_visualization(mut self, vis: VisualizationSpec) -> Self {
        self.visualizations.push(vis);
        self
    }

    pub fn with_interaction(mut self, mapping: InteractionMapping) -> Self {
        self.interactions.push(mapping);
        self
    }

    pub fn with_drilldown(mut self, drill: Drilldown) -> Self {
        self.drilldowns.push(drill);
        self
    }

    pub fn visualization(&self, id: &str) -> Option<&VisualizationSpec> {
        self.visualizations.iter().find(|v| v.id == id)
    }

    /// Mark the document as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
