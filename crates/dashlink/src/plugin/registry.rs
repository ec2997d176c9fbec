//! Registry of available plugins.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::error::{DashlinkError, Result};

use super::descriptor::PluginDescriptor;

/// Plugins available to dashboards, keyed by id.
///
/// Registration validates the descriptor; a registry only ever holds plugins
/// whose actions and reactions are internally consistent.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, Arc<PluginDescriptor>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a plugin. The `filter` reaction is added if absent.
    pub fn register(&mut self, mut descriptor: PluginDescriptor) -> Result<()> {
        let id = descriptor.id().to_string();
        if self.plugins.contains_key(&id) {
            warn!("Rejected duplicate plugin registration: {}", id);
            return Err(DashlinkError::DuplicatePlugin(id));
        }
        if let Err(e) = descriptor.schema.check() {
            warn!("Rejected plugin descriptor: {}", e);
            return Err(e);
        }

        descriptor.schema.ensure_filter_reaction();
        info!(
            "Registered plugin: {} ({} actions, {} reactions)",
            id,
            descriptor.schema.actions.len(),
            descriptor.schema.reactions.len()
        );
        self.plugins.insert(id, Arc::new(descriptor));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<PluginDescriptor>> {
        self.plugins.get(id).cloned()
    }

    /// Like [`get`](Self::get), for callers that cannot continue without it.
    pub fn require(&self, id: &str) -> Result<Arc<PluginDescriptor>> {
        self.get(id)
            .ok_or_else(|| DashlinkError::UnknownPlugin(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{Action, ActionType, Reaction, FILTER_REACTION};
    use crate::plugin::{MappingParameter, MappingSchema, ParameterType, PluginSchema, RecordingPlugin};

    fn schema(id: &str) -> PluginSchema {
        PluginSchema::new(id, id)
            .with_mapping(MappingSchema::Single(vec![MappingParameter::new(
                "category",
                "Category",
                ParameterType::Dim,
            )]))
            .with_action(Action::new("click", "Click", ActionType::Click, &["category"]))
    }

    fn descriptor(schema: PluginSchema) -> PluginDescriptor {
        PluginDescriptor::new(schema, Arc::new(RecordingPlugin::new()))
    }

    #[test]
    fn test_register_inserts_filter() {
        let mut registry = PluginRegistry::new();
        registry.register(descriptor(schema("pie"))).unwrap();
        let pie = registry.get("pie").unwrap();
        assert!(pie.schema.reaction(FILTER_REACTION).is_some());
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["pie"]);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = PluginRegistry::new();
        registry.register(descriptor(schema("pie"))).unwrap();
        assert!(matches!(
            registry.register(descriptor(schema("pie"))),
            Err(DashlinkError::DuplicatePlugin(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejects_malformed() {
        let cases = vec![
            schema(""),
            PluginSchema::new("empty", "Empty"),
            schema("undeclared").with_action(Action::new("hover", "Hover", ActionType::Hover, &["x"])),
            schema("twice").with_action(Action::new("click", "Again", ActionType::Click, &[])),
            schema("reactions")
                .with_reaction(Reaction::private("zoom", "Zoom"))
                .with_reaction(Reaction::private("zoom", "Zoom")),
        ];
        let mut registry = PluginRegistry::new();
        for case in cases {
            assert!(matches!(
                registry.register(descriptor(case)),
                Err(DashlinkError::InvalidDescriptor { .. })
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_require_unknown_plugin() {
        let mut registry = PluginRegistry::new();
        registry.register(descriptor(schema("pie"))).unwrap();
        assert!(registry.require("pie").is_ok());
        assert!(matches!(
            registry.require("sankey"),
            Err(DashlinkError::UnknownPlugin(id)) if id == "sankey"
        ));
    }

    #[test]
    fn test_multi_dataset_actions_need_dataset() {
        let mut sets = IndexMap::new();
        sets.insert(
            "Points".to_string(),
            vec![MappingParameter::new("lat", "Latitude", ParameterType::Fact)],
        );
        let base = PluginSchema::new("map", "Map").with_mapping(MappingSchema::Datasets(sets));

        let mut registry = PluginRegistry::new();
        let unnamed = base
            .clone()
            .with_action(Action::new("click", "Click", ActionType::Click, &["lat"]));
        assert!(registry.register(descriptor(unnamed)).is_err());

        let named = base.with_action(
            Action::new("click", "Click", ActionType::Click, &["lat"]).with_dataset("Points"),
        );
        registry.register(descriptor(named)).unwrap();
        assert!(registry.contains("map"));
    }
}
