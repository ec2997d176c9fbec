//! Dashlink: cross-visualization interaction and conditional formatting for
//! BI dashboards.
//!
//! A dashboard page holds visualizations, each rendered by a plugin that
//! declares what columns it accepts, what actions it can fire and what
//! reactions it can receive. Dashlink owns the wiring between them:
//!
//! - **Interaction**: actions fired on one visualization are routed through
//!   an action/reaction bus to every mapped or subject-area-sharing target,
//!   with per-target fault isolation.
//! - **Conditional formatting**: rule and heatmap formats are evaluated per
//!   datum into a style, with later matching rules taking precedence.
//! - **Column mapping**: visualizations bind plugin roles to schema columns,
//!   validated against the plugin's mapping schema.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dashlink::plugin::{builtin, PluginRegistry, RecordingPlugin};
//! use dashlink::{Datum, Engine};
//!
//! let mut registry = PluginRegistry::new();
//! builtin::register_all(&mut registry, Arc::new(RecordingPlugin::new())).unwrap();
//!
//! let engine = Engine::new(registry);
//! let mut page = engine.open_file("sales.json").unwrap();
//!
//! let report = page
//!     .fire("regionPie", "clickSlice", &[Datum::new().with("category", "East")])
//!     .unwrap();
//! println!("Delivered to: {:?}", report.targets());
//! ```

pub mod dashboard;
pub mod data;
pub mod error;
pub mod formatting;
pub mod interaction;
pub mod mapping;
pub mod plugin;
pub mod schema;

mod engine;

pub use crate::engine::{Engine, EngineConfig, DEFAULT_HEATMAP_TINT};
pub use dashboard::{DashboardDocument, DashboardPage, LoadReport, Visualization, VisualizationSpec};
pub use data::{Data, Datum, Value};
pub use error::{DashlinkError, Result};
pub use formatting::{ConditionalFormat, ConditionalFormatEvaluator, Evaluation, Style};
pub use interaction::{ActionReactionBus, DispatchReport, InteractionMapping};
pub use mapping::{ColumnMap, ColumnRef, ColumnSet};
pub use plugin::{PluginDescriptor, PluginRegistry, PluginSchema, VisualizationPlugin};
pub use schema::Column;
