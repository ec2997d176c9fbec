//! Engine entry point and configuration.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dashboard::{DashboardDocument, DashboardPage};
use crate::error::{DashlinkError, Result};
use crate::formatting::Style;
use crate::interaction::DEFAULT_MAX_CASCADE_DEPTH;
use crate::plugin::PluginRegistry;

/// Default heatmap tint: the low end of a scale is the base colour
/// lightened this far toward white.
pub const DEFAULT_HEATMAP_TINT: f64 = 0.85;

/// Configuration for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deliver `filter` to every visualization sharing the source's subject
    /// area when a trigger has no explicit mapping. Mappings for a trigger
    /// replace the broadcast.
    pub broadcast_filter: bool,
    /// Maximum length of a reaction cascade.
    pub max_cascade_depth: usize,
    /// Heatmap tint in `[0, 1)`.
    pub heatmap_tint: f64,
    /// Style returned when no conditional format matches.
    pub base_style: Style,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            broadcast_filter: true,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
            heatmap_tint: DEFAULT_HEATMAP_TINT,
            base_style: Style::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DashlinkError::Config(format!("invalid engine configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| DashlinkError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.heatmap_tint) {
            return Err(DashlinkError::Config(format!(
                "heatmap_tint must be in [0, 1), got {}",
                self.heatmap_tint
            )));
        }
        if self.max_cascade_depth == 0 {
            return Err(DashlinkError::Config(
                "max_cascade_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Opens dashboard pages against a shared plugin registry.
pub struct Engine {
    config: EngineConfig,
    registry: Arc<PluginRegistry>,
}

impl Engine {
    /// Create an engine with default configuration.
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            config: EngineConfig::default(),
            registry: Arc::new(registry),
        }
    }

    /// Create an engine with custom configuration.
    pub fn with_config(registry: PluginRegistry, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: Arc::new(registry),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Open a page. Load problems are on [`DashboardPage::report`].
    pub fn open(&self, doc: &DashboardDocument) -> DashboardPage {
        DashboardPage::open(doc, Arc::clone(&self.registry), &self.config)
    }

    /// Load a document from disk and open it.
    pub fn open_file(&self, path: impl AsRef<Path>) -> Result<DashboardPage> {
        let path = path.as_ref();
        let doc = DashboardDocument::load(path)?;
        info!("Loaded dashboard {} from {}", doc.name, path.display());
        Ok(self.open(&doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.broadcast_filter);
        assert_eq!(config.max_cascade_depth, 8);
        assert_eq!(config.base_style.colour, "#000000");
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = EngineConfig::from_json_str(r#"{"broadcast_filter": false}"#).unwrap();
        assert!(!config.broadcast_filter);
        assert_eq!(config.heatmap_tint, DEFAULT_HEATMAP_TINT);
    }

    #[test]
    fn test_invalid_tint_rejected() {
        let err = EngineConfig::from_json_str(r#"{"heatmap_tint": 1.0}"#).unwrap_err();
        assert!(matches!(err, DashlinkError::Config(_)));
        assert!(EngineConfig::from_json_str(r#"{"max_cascade_depth": 0}"#).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(dir.path().join("engine.json")).unwrap_err();
        assert!(matches!(err, DashlinkError::Io { .. }));
    }
}
