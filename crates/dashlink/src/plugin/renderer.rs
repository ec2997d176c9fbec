//! The seam between the engine and visualization implementations.

use crate::dashboard::Visualization;
use crate::data::{Data, Datum, Value};
use crate::error::Result;
use crate::formatting::{ConditionalFormatEvaluator, Evaluation};
use crate::interaction::InteractionOutput;

/// A visualization implementation.
///
/// The engine never draws: it hands the plugin its shaped data with
/// ready-built format evaluators, and routes reactions to it. Plugins must
/// not call back into the bus; follow-up triggers are returned in the
/// [`ReactionOutcome`].
pub trait VisualizationPlugin: Send + Sync {
    /// Draw one visualization.
    fn render(&self, ctx: &RenderContext<'_>) -> Result<()>;

    /// Handle a private reaction declared in the plugin's schema.
    fn react(&self, reaction: &str, ctx: &ReactionContext<'_>) -> Result<ReactionOutcome> {
        let _ = ctx;
        Err(crate::error::DashlinkError::Reaction {
            reaction: reaction.to_string(),
            message: "plugin does not implement private reactions".to_string(),
        })
    }
}

/// Everything a plugin needs to draw one visualization.
pub struct RenderContext<'a> {
    pub visualization: &'a Visualization,
    pub data: &'a Data,
    evaluators: Vec<(Option<String>, ConditionalFormatEvaluator)>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        visualization: &'a Visualization,
        data: &'a Data,
        evaluators: Vec<(Option<String>, ConditionalFormatEvaluator)>,
    ) -> Self {
        Self {
            visualization,
            data,
            evaluators,
        }
    }

    /// Rows of a dataset (`None` for single-dataset plugins).
    pub fn rows(&self, dataset: Option<&str>) -> &'a [Datum] {
        self.data.rows(dataset).unwrap_or(&[])
    }

    /// Format evaluator for a dataset.
    pub fn evaluator(&self, dataset: Option<&str>) -> Option<&ConditionalFormatEvaluator> {
        self.evaluators
            .iter()
            .find(|(key, _)| key.as_deref() == dataset)
            .map(|(_, eval)| eval)
    }

    /// Style a datum of a dataset, if an evaluator exists for it.
    pub fn style(&self, dataset: Option<&str>, datum: &Datum) -> Option<Evaluation> {
        self.evaluator(dataset).map(|eval| eval.evaluate(datum))
    }
}

/// Input of a reaction invocation.
pub struct ReactionContext<'a> {
    /// Visualization the action fired on.
    pub source: &'a str,
    pub trigger: &'a str,
    pub reaction: &'a str,
    /// Outputs shaped for the target.
    pub outputs: &'a [InteractionOutput],
    /// The visualization receiving the reaction.
    pub target: &'a Visualization,
}

impl ReactionContext<'_> {
    /// Values delivered for a target role, across all matching outputs.
    pub fn role_values(&self, role: &str) -> Vec<&Value> {
        self.outputs
            .iter()
            .filter(|o| o.target_id.as_ref().is_some_and(|t| t.role() == role))
            .flat_map(|o| o.values.iter())
            .collect()
    }

    /// True when no values were delivered.
    pub fn is_empty(&self) -> bool {
        self.outputs.iter().all(|o| o.values.is_empty())
    }
}

/// A trigger a reaction asks the bus to fire from the target.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeTrigger {
    pub trigger: String,
    pub payload: Vec<Datum>,
}

/// What a reaction did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReactionOutcome {
    /// The target needs to re-query and re-render.
    pub refresh: bool,
    pub cascade: Vec<CascadeTrigger>,
}

impl ReactionOutcome {
    pub fn refresh() -> Self {
        Self {
            refresh: true,
            cascade: Vec::new(),
        }
    }

    /// Fire `trigger` from the target once this reaction completes.
    pub fn with_cascade(mut self, trigger: impl Into<String>, payload: Vec<Datum>) -> Self {
        self.cascade.push(CascadeTrigger {
            trigger: trigger.into(),
            payload,
        });
        self
    }
}
