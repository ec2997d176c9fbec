//! Page lifecycle: loading a document onto a bus, rendering, teardown.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::data::{Data, Datum};
use crate::engine::EngineConfig;
use crate::error::{DashlinkError, Result};
use crate::formatting::{ConditionalFormat, ConditionalFormatEvaluator, Style};
use crate::interaction::{ActionReactionBus, DispatchReport, DrillRequest, Drilldown, InteractionMapping};
use crate::mapping::{validate, SchemaIssue};
use crate::plugin::{ConfigIssue, PluginRegistry, RenderContext};

use super::document::DashboardDocument;
use super::visualization::{Visualization, VisualizationSpec};

/// Something in a document the page could not honour.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadIssue {
    /// The visualization was skipped.
    UnknownPlugin { visualization: String, plugin: String },
    /// The visualization was skipped.
    DuplicateVisualization { visualization: String },
    Schema { visualization: String, issue: SchemaIssue },
    Config { visualization: String, issue: ConfigIssue },
    /// A conditional format was dropped.
    UnsupportedFormat {
        visualization: String,
        index: usize,
        strategy: String,
    },
    /// The interaction was skipped.
    Interaction { mapping: InteractionMapping, reason: String },
    /// The drilldown was skipped.
    Drilldown { drill: Drilldown, reason: String },
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadIssue::UnknownPlugin { visualization, plugin } => {
                write!(f, "{}: unknown plugin '{}'", visualization, plugin)
            }
            LoadIssue::DuplicateVisualization { visualization } => {
                write!(f, "{}: duplicate visualization id", visualization)
            }
            LoadIssue::Schema { visualization, issue } => write!(f, "{}: {}", visualization, issue),
            LoadIssue::Config { visualization, issue } => write!(f, "{}: {}", visualization, issue),
            LoadIssue::UnsupportedFormat {
                visualization,
                index,
                strategy,
            } => write!(
                f,
                "{}: conditional format {} uses unsupported strategy '{}'",
                visualization, index, strategy
            ),
            LoadIssue::Interaction { mapping, reason } => write!(
                f,
                "{}.{} -> {}.{}: {}",
                mapping.source, mapping.trigger, mapping.target, mapping.reaction, reason
            ),
            LoadIssue::Drilldown { drill, reason } => write!(
                f,
                "{}.{} -> {}: {}",
                drill.source, drill.trigger, drill.drill_path, reason
            ),
        }
    }
}

/// Outcome of opening a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Visualizations registered on the bus, in document order.
    pub loaded: Vec<String>,
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    /// Ids of visualizations that were not loaded.
    pub fn skipped_visualizations(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                LoadIssue::UnknownPlugin { visualization, .. }
                | LoadIssue::DuplicateVisualization { visualization } => Some(visualization.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn skipped_interactions(&self) -> Vec<&InteractionMapping> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                LoadIssue::Interaction { mapping, .. } => Some(mapping),
                _ => None,
            })
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A live dashboard page.
///
/// Owns its bus. Closing the page (or dropping it) unregisters every
/// visualization and mapping.
pub struct DashboardPage {
    name: String,
    bus: ActionReactionBus,
    base_style: Style,
    heatmap_tint: f64,
    report: LoadReport,
    closed: bool,
}

impl DashboardPage {
    /// Load a document. Problems are recorded in the [`LoadReport`] and the
    /// rest of the page loads regardless.
    pub fn open(doc: &DashboardDocument, registry: Arc<PluginRegistry>, config: &EngineConfig) -> Self {
        let mut bus = ActionReactionBus::new()
            .with_broadcast_filter(config.broadcast_filter)
            .with_max_cascade_depth(config.max_cascade_depth);
        let mut report = LoadReport::default();

        for spec in &doc.visualizations {
            load_visualization(spec, &registry, &mut bus, &mut report);
        }

        for mapping in &doc.interactions {
            if let Err(e) = bus.map_interaction(mapping.clone()) {
                warn!("Skipping interaction on {}: {}", doc.name, e);
                report.issues.push(LoadIssue::Interaction {
                    mapping: mapping.clone(),
                    reason: e.to_string(),
                });
            }
        }

        for drill in &doc.drilldowns {
            if let Err(e) = bus.map_drilldown(drill.clone()) {
                warn!("Skipping drilldown on {}: {}", doc.name, e);
                report.issues.push(LoadIssue::Drilldown {
                    drill: drill.clone(),
                    reason: e.to_string(),
                });
            }
        }

        info!(
            "Opened dashboard {} ({} visualizations, {} issues)",
            doc.name,
            report.loaded.len(),
            report.issues.len()
        );

        Self {
            name: doc.name.clone(),
            bus,
            base_style: config.base_style.clone(),
            heatmap_tint: config.heatmap_tint,
            report,
            closed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn visualization(&self, id: &str) -> Option<&Visualization> {
        self.bus.visualization(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.bus.ids().collect()
    }

    pub fn bus(&self) -> &ActionReactionBus {
        &self.bus
    }

    /// Format evaluator for one dataset of a visualization, measured over the
    /// rows about to be drawn.
    pub fn evaluator(&self, id: &str, dataset: Option<&str>, rows: &[Datum]) -> Option<ConditionalFormatEvaluator> {
        let vis = self.bus.visualization(id)?;
        Some(
            ConditionalFormatEvaluator::new(vis.formats.clone())
                .with_dataset(dataset)
                .with_data(rows)
                .with_base(self.base_style.clone())
                .with_tint(self.heatmap_tint),
        )
    }

    /// Render one visualization. A panicking renderer is reported as a
    /// render error.
    pub fn render(&self, id: &str, data: &Data) -> Result<()> {
        let vis = self
            .bus
            .visualization(id)
            .ok_or_else(|| DashlinkError::UnknownVisualization(id.to_string()))?;
        let descriptor = self
            .bus
            .descriptor(id)
            .ok_or_else(|| DashlinkError::UnknownVisualization(id.to_string()))?;

        let evaluators = vis
            .columns
            .maps()
            .into_iter()
            .map(|(dataset, _)| {
                let rows = data.rows(dataset).unwrap_or(&[]);
                let eval = self.evaluator(id, dataset, rows).unwrap_or_else(|| {
                    ConditionalFormatEvaluator::new(Vec::new()).with_base(self.base_style.clone())
                });
                (dataset.map(str::to_string), eval)
            })
            .collect();

        let ctx = RenderContext::new(vis, data, evaluators);
        debug!("Rendering {} ({} rows)", id, data.len());
        match panic::catch_unwind(AssertUnwindSafe(|| descriptor.plugin.render(&ctx))) {
            Ok(result) => result,
            Err(_) => {
                error!("Renderer for {} panicked", id);
                Err(DashlinkError::Render {
                    visualization: id.to_string(),
                    message: "renderer panicked".to_string(),
                })
            }
        }
    }

    /// Render every visualization with data; failures are logged and
    /// returned, and never stop the others.
    pub fn render_all(&self, data: &IndexMap<String, Data>) -> Vec<DashlinkError> {
        let mut failures = Vec::new();
        for (id, rows) in data {
            if let Err(e) = self.render(id, rows) {
                warn!("Render failed on {}: {}", self.name, e);
                failures.push(e);
            }
        }
        failures
    }

    /// Fire a trigger on a visualization.
    pub fn fire(&mut self, source: &str, trigger: &str, payload: &[Datum]) -> Result<DispatchReport> {
        self.bus.fire(source, trigger, payload)
    }

    /// Arrive on this page from a drill on another. Returns the
    /// visualizations whose filters changed and need to re-query.
    pub fn enter_drill(&mut self, request: &DrillRequest) -> Vec<String> {
        self.bus.enter_drill(request)
    }

    /// Snapshot the page, including interaction-applied filters.
    pub fn to_document(&self) -> DashboardDocument {
        let mut doc = DashboardDocument::new(self.name.clone());
        doc.visualizations = self
            .bus
            .ids()
            .filter_map(|id| self.bus.visualization(id))
            .map(Visualization::to_spec)
            .collect();
        doc.interactions = self.bus.mappings().to_vec();
        doc.drilldowns = self.bus.drilldowns().to_vec();
        doc
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Unregister everything. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.bus.clear();
        self.closed = true;
        info!("Closed dashboard {}", self.name);
    }
}

impl Drop for DashboardPage {
    fn drop(&mut self) {
        self.close();
    }
}

fn load_visualization(
    spec: &VisualizationSpec,
    registry: &PluginRegistry,
    bus: &mut ActionReactionBus,
    report: &mut LoadReport,
) {
    let descriptor = match registry.require(&spec.plugin) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            warn!("Skipping visualization {}: {}", spec.id, e);
            report.issues.push(LoadIssue::UnknownPlugin {
                visualization: spec.id.clone(),
                plugin: spec.plugin.clone(),
            });
            return;
        }
    };
    let schema = &descriptor.schema;

    for issue in validate(&spec.columns, &schema.column_mapping) {
        warn!("Column mapping issue on {}: {}", spec.id, issue);
        report.issues.push(LoadIssue::Schema {
            visualization: spec.id.clone(),
            issue,
        });
    }

    let (config, config_issues) = schema.config_schema().load(&spec.config);
    for issue in config_issues {
        warn!("Configuration issue on {}: {}", spec.id, issue);
        report.issues.push(LoadIssue::Config {
            visualization: spec.id.clone(),
            issue,
        });
    }

    let mut formats = Vec::with_capacity(spec.conditional_formats.len());
    for (index, format) in spec.conditional_formats.iter().enumerate() {
        let supported = match format {
            ConditionalFormat::Rule(_) => true,
            ConditionalFormat::Heatmap(_) => schema.supports_heatmap(),
        };
        if supported {
            formats.push(format.clone());
        } else {
            warn!(
                "Dropping {} format {} on {}: not supported by {}",
                format.strategy(),
                index,
                spec.id,
                schema.id
            );
            report.issues.push(LoadIssue::UnsupportedFormat {
                visualization: spec.id.clone(),
                index,
                strategy: format.strategy().to_string(),
            });
        }
    }

    let vis = Visualization {
        id: spec.id.clone(),
        name: spec.name.clone(),
        display_name: spec.display_name.clone(),
        plugin: spec.plugin.clone(),
        config,
        columns: spec.columns.clone(),
        query: spec.query.clone(),
        formats,
    };

    match bus.register(vis, descriptor) {
        Ok(()) => report.loaded.push(spec.id.clone()),
        Err(e) => {
            warn!("Skipping visualization {}: {}", spec.id, e);
            report.issues.push(LoadIssue::DuplicateVisualization {
                visualization: spec.id.clone(),
            });
        }
    }
}
