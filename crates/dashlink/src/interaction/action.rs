//! Actions a visualization can emit and reactions it can receive.

use serde::{Deserialize, Serialize};

/// Id of the general reaction that turns outputs into query filters.
pub const FILTER_REACTION: &str = "filter";

/// Id of the general reaction that logs the outputs it receives.
pub const LOG_REACTION: &str = "log";

/// User gesture behind an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    #[default]
    Click,
    Hover,
    Mouseover,
    #[serde(alias = "selection")]
    Select,
    Brush,
}

impl ActionType {
    pub fn label(&self) -> &'static str {
        match self {
            ActionType::Click => "click",
            ActionType::Hover => "hover",
            ActionType::Mouseover => "mouseover",
            ActionType::Select => "select",
            ActionType::Brush => "brush",
        }
    }
}

/// A named trigger a plugin can fire, with the column-map roles it outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Identifier interaction mappings refer to, e.g. `clickSlice`.
    pub trigger: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub action_type: ActionType,
    /// Column-map roles whose values the action emits.
    pub output: Vec<String>,
    /// Dataset the output roles belong to, for multi-dataset plugins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl Action {
    pub fn new(
        trigger: impl Into<String>,
        name: impl Into<String>,
        action_type: ActionType,
        output: &[&str],
    ) -> Self {
        Self {
            trigger: trigger.into(),
            name: name.into(),
            action_type,
            output: output.iter().map(|s| s.to_string()).collect(),
            dataset: None,
            description: String::new(),
        }
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Whether a reaction is handled by the engine or by the plugin itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    /// Available on every plugin and handled by the engine.
    General,
    /// Implemented by the plugin's `react`.
    #[default]
    Private,
}

/// A named handler a plugin exposes to incoming actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: ReactionKind,
    #[serde(default)]
    pub description: String,
}

impl Reaction {
    /// A plugin-implemented reaction.
    pub fn private(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ReactionKind::Private,
            description: String::new(),
        }
    }

    /// The general filter reaction.
    pub fn filter() -> Self {
        Self {
            id: FILTER_REACTION.to_string(),
            name: "Filter".to_string(),
            kind: ReactionKind::General,
            description: "Filter the query based on the data passed from the action.".to_string(),
        }
    }

    /// The general log reaction.
    pub fn log() -> Self {
        Self {
            id: LOG_REACTION.to_string(),
            name: "Log".to_string(),
            kind: ReactionKind::General,
            description: "Write the data passed from the action to the log.".to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_general(&self) -> bool {
        self.kind == ReactionKind::General
    }
}
