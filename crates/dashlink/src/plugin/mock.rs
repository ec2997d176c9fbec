//! Recording plugin for testing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::data::{Datum, Value};
use crate::error::{DashlinkError, Result};

use super::renderer::{ReactionContext, ReactionOutcome, RenderContext, VisualizationPlugin};

/// A render call as seen by [`RecordingPlugin`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRender {
    pub visualization: String,
    pub rows: usize,
    /// Evaluated colour of every row, dataset by dataset.
    pub colours: Vec<String>,
}

/// A reaction call as seen by [`RecordingPlugin`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedReaction {
    pub target: String,
    pub source: String,
    pub trigger: String,
    pub reaction: String,
    /// `(source column, values)` pairs delivered.
    pub outputs: Vec<(String, Vec<Value>)>,
    /// `(target role, values)` pairs, for outputs the target binds.
    pub roles: Vec<(String, Vec<Value>)>,
}

#[derive(Debug, Clone)]
enum Behaviour {
    Fail(String),
    Panic(String),
    Refresh,
    Cascade(String, Vec<Datum>),
}

/// Plugin that records every call and can be scripted to misbehave.
///
/// Reactions are recorded before the scripted behaviour runs, so a failing or
/// panicking reaction still shows up in [`reactions`](Self::reactions).
#[derive(Debug, Default)]
pub struct RecordingPlugin {
    renders: Mutex<Vec<RecordedRender>>,
    reactions: Mutex<Vec<RecordedReaction>>,
    behaviours: HashMap<String, Behaviour>,
    fail_render: bool,
}

impl RecordingPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return an error from this reaction.
    pub fn failing_on(mut self, reaction: &str, message: &str) -> Self {
        self.behaviours
            .insert(reaction.to_string(), Behaviour::Fail(message.to_string()));
        self
    }

    /// Panic inside this reaction.
    pub fn panicking_on(mut self, reaction: &str, message: &str) -> Self {
        self.behaviours
            .insert(reaction.to_string(), Behaviour::Panic(message.to_string()));
        self
    }

    /// Ask for a refresh from this reaction.
    pub fn refreshing_on(mut self, reaction: &str) -> Self {
        self.behaviours
            .insert(reaction.to_string(), Behaviour::Refresh);
        self
    }

    /// Fire `trigger` from the target after this reaction.
    pub fn cascading_on(mut self, reaction: &str, trigger: &str, payload: Vec<Datum>) -> Self {
        self.behaviours.insert(
            reaction.to_string(),
            Behaviour::Cascade(trigger.to_string(), payload),
        );
        self
    }

    /// Fail every render call.
    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }

    pub fn renders(&self) -> Vec<RecordedRender> {
        lock(&self.renders).clone()
    }

    pub fn reactions(&self) -> Vec<RecordedReaction> {
        lock(&self.reactions).clone()
    }

    /// Targets that received a reaction, in call order.
    pub fn reacted_targets(&self) -> Vec<String> {
        lock(&self.reactions)
            .iter()
            .map(|r| r.target.clone())
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.renders).clear();
        lock(&self.reactions).clear();
    }
}

fn target_roles(ctx: &ReactionContext<'_>) -> Vec<(String, Vec<Value>)> {
    let mut roles: Vec<&str> = Vec::new();
    for output in ctx.outputs {
        if let Some(role) = output.target_id.as_ref().map(|t| t.role()) {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
    }
    roles
        .into_iter()
        .map(|role| (role.to_string(), ctx.role_values(role).into_iter().cloned().collect()))
        .collect()
}

impl VisualizationPlugin for RecordingPlugin {
    fn render(&self, ctx: &RenderContext<'_>) -> Result<()> {
        let id = ctx.visualization.id.clone();
        if self.fail_render {
            return Err(DashlinkError::Render {
                visualization: id,
                message: "scripted render failure".to_string(),
            });
        }

        let mut colours = Vec::new();
        for dataset in ctx.data.dataset_keys() {
            for datum in ctx.rows(dataset) {
                if let Some(evaluation) = ctx.style(dataset, datum) {
                    colours.push(evaluation.style.colour);
                }
            }
        }
        lock(&self.renders).push(RecordedRender {
            visualization: id,
            rows: ctx.data.len(),
            colours,
        });
        Ok(())
    }

    fn react(&self, reaction: &str, ctx: &ReactionContext<'_>) -> Result<ReactionOutcome> {
        lock(&self.reactions).push(RecordedReaction {
            target: ctx.target.id.clone(),
            source: ctx.source.to_string(),
            trigger: ctx.trigger.to_string(),
            reaction: reaction.to_string(),
            outputs: ctx
                .outputs
                .iter()
                .map(|o| (o.source_id.to_string(), o.values.clone()))
                .collect(),
            roles: target_roles(ctx),
        });

        match self.behaviours.get(reaction) {
            None => Ok(ReactionOutcome::default()),
            Some(Behaviour::Refresh) => Ok(ReactionOutcome::refresh()),
            Some(Behaviour::Cascade(trigger, payload)) => {
                Ok(ReactionOutcome::default().with_cascade(trigger.clone(), payload.clone()))
            }
            Some(Behaviour::Fail(message)) => Err(DashlinkError::Reaction {
                reaction: reaction.to_string(),
                message: message.clone(),
            }),
            Some(Behaviour::Panic(message)) => panic!("{}", message),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
