//! Plugin descriptors: the declared contract of a visualization type.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DashlinkError, Result};
use crate::interaction::{Action, Reaction, FILTER_REACTION};
use crate::schema::Column;

use super::config::{ConfigParameter, ConfigSchema};
use super::renderer::VisualizationPlugin;

/// Id of the heatmap special conditional format.
pub const HEATMAP_FORMAT: &str = "heatmap";

/// Kind of column a mapping parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Attribute column.
    Dim,
    /// Numeric fact column.
    Fact,
    /// Numeric measure column.
    Measure,
    /// Carried through the query but not drawn.
    Hidden,
    #[default]
    Any,
}

impl ParameterType {
    /// Whether a column may be bound to a parameter of this type.
    pub fn accepts(&self, column: &Column) -> bool {
        match self {
            ParameterType::Fact | ParameterType::Measure => column.data_type.is_numeric(),
            ParameterType::Dim | ParameterType::Hidden | ParameterType::Any => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ParameterType::Dim => "dim",
            ParameterType::Fact => "fact",
            ParameterType::Measure => "measure",
            ParameterType::Hidden => "hidden",
            ParameterType::Any => "any",
        }
    }
}

/// A role a plugin accepts in its column map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingParameter {
    pub target_property: String,
    pub label: String,
    #[serde(default, rename = "type")]
    pub kind: ParameterType,
    #[serde(default)]
    pub required: bool,
    /// Accepts an ordered list of columns.
    #[serde(default)]
    pub multiple: bool,
    /// Offered as a conditional-format source.
    #[serde(default)]
    pub conditional_format: bool,
    #[serde(default)]
    pub description: String,
}

impl MappingParameter {
    pub fn new(target_property: &str, label: &str, kind: ParameterType) -> Self {
        Self {
            target_property: target_property.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            multiple: false,
            conditional_format: false,
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn conditional_format(mut self) -> Self {
        self.conditional_format = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Column-mapping parameters, optionally per dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSchema {
    Single(Vec<MappingParameter>),
    Datasets(IndexMap<String, Vec<MappingParameter>>),
}

impl Default for MappingSchema {
    fn default() -> Self {
        MappingSchema::Single(Vec::new())
    }
}

impl MappingSchema {
    /// Parameters of a dataset; fails closed like column sets do.
    pub fn parameters(&self, dataset: Option<&str>) -> Option<&[MappingParameter]> {
        match (self, dataset) {
            (MappingSchema::Single(params), None) => Some(params),
            (MappingSchema::Datasets(sets), Some(key)) => sets.get(key).map(Vec::as_slice),
            _ => None,
        }
    }

    pub fn parameter(&self, dataset: Option<&str>, role: &str) -> Option<&MappingParameter> {
        self.parameters(dataset)?
            .iter()
            .find(|p| p.target_property == role)
    }

    /// Dataset keys, or a single `None` for single-dataset schemas.
    pub fn datasets(&self) -> Vec<Option<&str>> {
        match self {
            MappingSchema::Single(_) => vec![None],
            MappingSchema::Datasets(sets) => sets.keys().map(|k| Some(k.as_str())).collect(),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, MappingSchema::Datasets(_))
    }

    /// True when no dataset declares any parameter.
    pub fn is_empty(&self) -> bool {
        match self {
            MappingSchema::Single(params) => params.is_empty(),
            MappingSchema::Datasets(sets) => sets.values().all(Vec::is_empty),
        }
    }
}

/// A special conditional-format strategy a plugin supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialFormat {
    pub id: String,
    pub name: String,
    /// The strategy takes no comparison value.
    #[serde(default)]
    pub no_value: bool,
    #[serde(default)]
    pub description: String,
}

impl SpecialFormat {
    pub fn heatmap() -> Self {
        Self {
            id: HEATMAP_FORMAT.to_string(),
            name: "Heatmap".to_string(),
            no_value: true,
            description: "Colour cells on a scale between the minimum and maximum values."
                .to_string(),
        }
    }
}

/// The declared contract of a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSchema {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub multiple_datasets: bool,
    pub column_mapping: MappingSchema,
    #[serde(default)]
    pub configuration: Vec<ConfigParameter>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub special_formats: Vec<SpecialFormat>,
}

impl PluginSchema {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: String::new(),
            multiple_datasets: false,
            column_mapping: MappingSchema::default(),
            configuration: Vec::new(),
            actions: Vec::new(),
            reactions: Vec::new(),
            special_formats: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the column mapping; a per-dataset mapping marks the plugin as
    /// multi-dataset.
    pub fn with_mapping(mut self, mapping: MappingSchema) -> Self {
        self.multiple_datasets = mapping.is_multi();
        self.column_mapping = mapping;
        self
    }

    pub fn with_config(mut self, parameter: ConfigParameter) -> Self {
        self.configuration.push(parameter);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_reaction(mut self, reaction: Reaction) -> Self {
        self.reactions.push(reaction);
        self
    }

    pub fn with_special_format(mut self, format: SpecialFormat) -> Self {
        self.special_formats.push(format);
        self
    }

    pub fn action(&self, trigger: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.trigger == trigger)
    }

    pub fn reaction(&self, id: &str) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.id == id)
    }

    pub fn supports_special_format(&self, id: &str) -> bool {
        self.special_formats.iter().any(|f| f.id == id)
    }

    pub fn supports_heatmap(&self) -> bool {
        self.supports_special_format(HEATMAP_FORMAT)
    }

    pub fn config_schema(&self) -> ConfigSchema<'_> {
        ConfigSchema::new(&self.configuration)
    }

    /// Check the schema is internally consistent.
    ///
    /// Rejects an empty id or mapping, duplicate reactions or triggers, and
    /// actions whose outputs name roles the mapping lacks. Multi-dataset
    /// actions must name one of the declared datasets.
    pub fn check(&self) -> Result<()> {
        self.consistency().map_err(|reason| DashlinkError::InvalidDescriptor {
            plugin: self.id.clone(),
            reason,
        })
    }

    fn consistency(&self) -> std::result::Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("plugin id is empty".to_string());
        }
        if self.column_mapping.is_empty() {
            return Err("column mapping declares no parameters".to_string());
        }
        if self.multiple_datasets != self.column_mapping.is_multi() {
            return Err("multiple_datasets does not match the column mapping shape".to_string());
        }

        let mut reaction_ids = HashSet::new();
        for reaction in &self.reactions {
            if !reaction_ids.insert(reaction.id.as_str()) {
                return Err(format!("reaction '{}' is declared twice", reaction.id));
            }
        }

        let mut triggers = HashSet::new();
        for action in &self.actions {
            if !triggers.insert(action.trigger.as_str()) {
                return Err(format!("trigger '{}' is declared twice", action.trigger));
            }
            if self.multiple_datasets && action.dataset.is_none() {
                return Err(format!("action '{}' must name a dataset", action.trigger));
            }
            let dataset = if self.multiple_datasets {
                action.dataset.as_deref()
            } else {
                None
            };
            let Some(params) = self.column_mapping.parameters(dataset) else {
                return Err(format!(
                    "action '{}' names unknown dataset '{}'",
                    action.trigger,
                    action.dataset.as_deref().unwrap_or_default()
                ));
            };
            for role in &action.output {
                if !params.iter().any(|p| &p.target_property == role) {
                    return Err(format!(
                        "action '{}' outputs undeclared role '{}'",
                        action.trigger, role
                    ));
                }
            }
        }
        Ok(())
    }

    /// Ensure the general filter reaction is declared.
    pub(crate) fn ensure_filter_reaction(&mut self) {
        if self.reaction(FILTER_REACTION).is_none() {
            self.reactions.insert(0, Reaction::filter());
        }
    }
}

/// A registered plugin: its schema and implementation.
#[derive(Clone)]
pub struct PluginDescriptor {
    pub schema: PluginSchema,
    pub plugin: Arc<dyn VisualizationPlugin>,
}

impl PluginDescriptor {
    pub fn new(schema: PluginSchema, plugin: Arc<dyn VisualizationPlugin>) -> Self {
        Self { schema, plugin }
    }

    pub fn id(&self) -> &str {
        &self.schema.id
    }

    /// Check a shared descriptor and make sure it declares `filter`.
    ///
    /// The descriptor is returned as is when it already does; otherwise a
    /// copy with `filter` added is returned.
    pub(crate) fn admit(descriptor: Arc<Self>) -> Result<Arc<Self>> {
        descriptor.schema.check()?;
        if descriptor.schema.reaction(FILTER_REACTION).is_some() {
            return Ok(descriptor);
        }
        let mut schema = descriptor.schema.clone();
        schema.ensure_filter_reaction();
        Ok(Arc::new(Self::new(schema, Arc::clone(&descriptor.plugin))))
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
