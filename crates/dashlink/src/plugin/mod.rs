//! Plugin contracts: descriptors, typed configuration, the registry and the
//! renderer seam.

pub mod builtin;
mod config;
mod descriptor;
mod mock;
mod registry;
mod renderer;

pub use config::{ConfigIssue, ConfigParameter, ConfigSchema, ConfigValue, IssueKind, ParameterKind, VisConfig};
pub use descriptor::{
    MappingParameter, MappingSchema, ParameterType, PluginDescriptor, PluginSchema, SpecialFormat,
    HEATMAP_FORMAT,
};
pub use mock::{RecordedReaction, RecordedRender, RecordingPlugin};
pub use registry::PluginRegistry;
pub use renderer::{CascadeTrigger, ReactionContext, ReactionOutcome, RenderContext, VisualizationPlugin};
