//! Action/reaction bus for one dashboard page.
//!
//! Visualizations register with their plugin descriptor. Firing a trigger on
//! a source extracts the action's outputs from the payload, plans deliveries
//! (explicit interaction mappings, or a broadcast `filter` to visualizations
//! on the same subject area), shapes the outputs for each target and invokes
//! the reaction. Dispatch is synchronous and complete when `fire` returns.
//!
//! A failing or panicking reaction never stops delivery to the other targets
//! and never reaches the caller; it is logged and recorded in the
//! [`DispatchReport`]. Reactions may ask for follow-up triggers, which run in
//! the same call under a per-chain guard against cycles.
//!
//! Drilldowns are independent of reactions: a fired trigger with a drilldown
//! yields a [`DrillRequest`] in the report for the host to navigate.

use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::dashboard::Visualization;
use crate::data::Datum;
use crate::error::{DashlinkError, Result};
use crate::mapping::ColumnSet;
use crate::plugin::{PluginDescriptor, ReactionContext, ReactionOutcome};

use super::action::{FILTER_REACTION, LOG_REACTION};
use super::drill::{drill_filters, Breadcrumb, DrillRequest, Drilldown};
use super::filter::Filter;
use super::mapping::InteractionMapping;
use super::output::{extract_outputs, format_outputs, InteractionOutput};

/// Default bound on cascaded fires within one dispatch chain.
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 8;

/// A reaction invocation made during a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub source: String,
    pub trigger: String,
    pub target: String,
    pub reaction: String,
    pub outputs: Vec<InteractionOutput>,
    /// 0 for the fire requested by the caller, +1 per cascade step.
    pub depth: usize,
}

/// A reaction that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub source: String,
    pub trigger: String,
    pub target: String,
    pub reaction: String,
    pub message: String,
    pub panicked: bool,
}

/// Why a cascaded fire was not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// The (visualization, trigger) pair already fired in this chain.
    Reentrant,
    DepthExceeded,
    /// The cascading visualization does not declare the trigger.
    UndeclaredTrigger,
}

/// A cascaded fire that was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressedFire {
    pub visualization: String,
    pub trigger: String,
    pub reason: SuppressReason,
}

/// What a call to [`ActionReactionBus::fire`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Every reaction invoked, including the ones that failed.
    pub deliveries: Vec<Delivery>,
    pub failures: Vec<DeliveryFailure>,
    pub suppressed: Vec<SuppressedFire>,
    /// Visualizations that need to re-query, without duplicates.
    pub refresh: Vec<String>,
    pub drills: Vec<DrillRequest>,
}

impl DispatchReport {
    /// Targets in invocation order.
    pub fn targets(&self) -> Vec<&str> {
        self.deliveries.iter().map(|d| d.target.as_str()).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.suppressed.is_empty()
    }

    fn mark_refresh(&mut self, id: &str) {
        if !self.refresh.iter().any(|r| r == id) {
            self.refresh.push(id.to_string());
        }
    }
}

/// Running counters across all dispatches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusStats {
    pub fired: u64,
    pub delivered: u64,
    pub failed: u64,
    pub suppressed: u64,
}

struct BusEntry {
    vis: Visualization,
    descriptor: Arc<PluginDescriptor>,
}

struct PendingFire {
    source: String,
    trigger: String,
    payload: Vec<Datum>,
    depth: usize,
}

struct PlannedDelivery {
    target: String,
    reaction: String,
    /// `None` for a broadcast, which passes every column.
    mapping: Option<InteractionMapping>,
}

struct Failure {
    message: String,
    panicked: bool,
}

/// Routes actions fired on one visualization to reactions on others.
pub struct ActionReactionBus {
    entries: IndexMap<String, BusEntry>,
    mappings: Vec<InteractionMapping>,
    drilldowns: Vec<Drilldown>,
    /// The trail that led to this page.
    breadcrumbs: Vec<Breadcrumb>,
    broadcast_filter: bool,
    max_cascade_depth: usize,
    stats: BusStats,
}

impl Default for ActionReactionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionReactionBus {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            mappings: Vec::new(),
            drilldowns: Vec::new(),
            breadcrumbs: Vec::new(),
            broadcast_filter: true,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
            stats: BusStats::default(),
        }
    }

    /// Broadcast `filter` to same-subject-area visualizations when a trigger
    /// has no explicit mapping.
    pub fn with_broadcast_filter(mut self, enabled: bool) -> Self {
        self.broadcast_filter = enabled;
        self
    }

    pub fn with_max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth;
        self
    }

    pub fn with_breadcrumbs(mut self, trail: Vec<Breadcrumb>) -> Self {
        self.breadcrumbs = trail;
        self
    }

    /// Add a visualization.
    ///
    /// The descriptor is checked as the registry checks it, and gains the
    /// general `filter` reaction if it lacks one.
    pub fn register(&mut self, vis: Visualization, descriptor: Arc<PluginDescriptor>) -> Result<()> {
        if self.entries.contains_key(&vis.id) {
            return Err(DashlinkError::DuplicateVisualization(vis.id));
        }
        let descriptor = PluginDescriptor::admit(descriptor).inspect_err(|e| {
            warn!("Rejected visualization {}: {}", vis.id, e);
        })?;
        info!(
            "Registered visualization {} ({})",
            vis.id,
            descriptor.id()
        );
        self.entries
            .insert(vis.id.clone(), BusEntry { vis, descriptor });
        Ok(())
    }

    /// Remove a visualization and every mapping that involves it.
    pub fn unregister(&mut self, id: &str) -> Result<Visualization> {
        let entry = self
            .entries
            .shift_remove(id)
            .ok_or_else(|| DashlinkError::UnknownVisualization(id.to_string()))?;
        self.mappings.retain(|m| !m.involves(id));
        self.drilldowns.retain(|d| !d.involves(id));
        info!("Unregistered visualization {}", id);
        Ok(entry.vis)
    }

    /// Declare an interaction. Mapping the same interaction twice is a no-op.
    pub fn map_interaction(&mut self, mapping: InteractionMapping) -> Result<()> {
        let source = self
            .entries
            .get(&mapping.source)
            .ok_or_else(|| DashlinkError::UnknownVisualization(mapping.source.clone()))?;
        let target = self
            .entries
            .get(&mapping.target)
            .ok_or_else(|| DashlinkError::UnknownVisualization(mapping.target.clone()))?;

        let action = source
            .descriptor
            .schema
            .action(&mapping.trigger)
            .ok_or_else(|| DashlinkError::UnknownTrigger {
                visualization: mapping.source.clone(),
                trigger: mapping.trigger.clone(),
            })?;
        if target.descriptor.schema.reaction(&mapping.reaction).is_none() {
            return Err(DashlinkError::UnknownReaction {
                visualization: mapping.target.clone(),
                reaction: mapping.reaction.clone(),
            });
        }

        let dataset = action.dataset.as_deref();
        for column in &mapping.columns {
            let emitted = action.output.iter().any(|role| role == column.role());
            if !emitted || source.vis.columns.resolve(dataset, column).is_none() {
                return Err(DashlinkError::InvalidInteraction(format!(
                    "{} -> {}: column '{}' is not an output of '{}'",
                    mapping.source, mapping.target, column, mapping.trigger
                )));
            }
        }

        if !self.mappings.contains(&mapping) {
            debug!(
                "Mapped {}.{} -> {}.{}",
                mapping.source, mapping.trigger, mapping.target, mapping.reaction
            );
            self.mappings.push(mapping);
        }
        Ok(())
    }

    /// Declare a drilldown. Declaring the same drilldown twice is a no-op.
    pub fn map_drilldown(&mut self, drill: Drilldown) -> Result<()> {
        self.check_trigger(&drill.source, &drill.trigger)?;
        if drill.drill_path.trim().is_empty() {
            return Err(DashlinkError::InvalidInteraction(format!(
                "{}.{}: drill path is empty",
                drill.source, drill.trigger
            )));
        }
        if !self.drilldowns.contains(&drill) {
            debug!("Mapped {}.{} -> {}", drill.source, drill.trigger, drill.drill_path);
            self.drilldowns.push(drill);
        }
        Ok(())
    }

    /// Fire a trigger on a visualization.
    ///
    /// Returns `Err` only when the source is unknown or does not declare the
    /// trigger. Reaction failures are reported, never returned.
    pub fn fire(&mut self, source: &str, trigger: &str, payload: &[Datum]) -> Result<DispatchReport> {
        self.check_trigger(source, trigger)?;
        debug!("Firing {} on {} ({} rows)", trigger, source, payload.len());

        let mut report = DispatchReport::default();
        let mut chain: HashSet<(String, String)> = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(PendingFire {
            source: source.to_string(),
            trigger: trigger.to_string(),
            payload: payload.to_vec(),
            depth: 0,
        });

        while let Some(pending) = queue.pop_front() {
            let reason = if pending.depth > self.max_cascade_depth {
                Some(SuppressReason::DepthExceeded)
            } else if self.check_trigger(&pending.source, &pending.trigger).is_err() {
                Some(SuppressReason::UndeclaredTrigger)
            } else if !chain.insert((pending.source.clone(), pending.trigger.clone())) {
                Some(SuppressReason::Reentrant)
            } else {
                None
            };
            if let Some(reason) = reason {
                warn!(
                    "Suppressed cascaded fire of {} on {}: {:?}",
                    pending.trigger, pending.source, reason
                );
                self.stats.suppressed += 1;
                report.suppressed.push(SuppressedFire {
                    visualization: pending.source,
                    trigger: pending.trigger,
                    reason,
                });
                continue;
            }

            self.stats.fired += 1;
            self.dispatch(&pending, &mut report, &mut queue);
        }

        Ok(report)
    }

    fn check_trigger(&self, source: &str, trigger: &str) -> Result<()> {
        let entry = self
            .entries
            .get(source)
            .ok_or_else(|| DashlinkError::UnknownVisualization(source.to_string()))?;
        if entry.descriptor.schema.action(trigger).is_none() {
            return Err(DashlinkError::UnknownTrigger {
                visualization: source.to_string(),
                trigger: trigger.to_string(),
            });
        }
        Ok(())
    }

    fn dispatch(&mut self, pending: &PendingFire, report: &mut DispatchReport, queue: &mut VecDeque<PendingFire>) {
        let Some(source) = self.entries.get(&pending.source) else {
            return;
        };
        let Some(action) = source.descriptor.schema.action(&pending.trigger) else {
            return;
        };
        let dataset = action.dataset.as_deref();
        let raw = source
            .vis
            .columns
            .map(dataset)
            .map(|map| extract_outputs(action, map, &pending.payload))
            .unwrap_or_default();
        let subject_area = source.vis.subject_area(dataset).unwrap_or_default().to_string();

        for drill in self.drilldowns.iter().filter(|d| d.matches(&pending.source, &pending.trigger)) {
            let outputs = format_outputs(&raw, |column| drill.passes(column), &ColumnSet::default());
            let filters = drill_filters(&outputs, source.vis.query.query(dataset));
            let mut breadcrumbs = self.breadcrumbs.clone();
            breadcrumbs.push(Breadcrumb {
                source_path: drill.source_path.clone(),
                target_path: drill.drill_path.clone(),
                drill_filter: filters.clone(),
            });
            info!(
                "Drill from {}.{} to {} ({} filters)",
                pending.source,
                pending.trigger,
                drill.drill_path,
                filters.len()
            );
            report.drills.push(DrillRequest {
                source: pending.source.clone(),
                trigger: pending.trigger.clone(),
                path: drill.drill_path.clone(),
                filters,
                breadcrumbs,
            });
        }

        for planned in self.plan(&pending.source, &pending.trigger, &subject_area) {
            let Some(target) = self.entries.get(&planned.target) else {
                continue;
            };
            let outputs = format_outputs(
                &raw,
                |column| planned.mapping.as_ref().is_none_or(|m| m.passes(column)),
                &target.vis.columns,
            );

            match self.invoke(pending, &planned, &outputs, &subject_area) {
                Ok(outcome) => {
                    if outcome.refresh {
                        report.mark_refresh(&planned.target);
                    }
                    for cascade in outcome.cascade {
                        queue.push_back(PendingFire {
                            source: planned.target.clone(),
                            trigger: cascade.trigger,
                            payload: cascade.payload,
                            depth: pending.depth + 1,
                        });
                    }
                }
                Err(failure) => {
                    if failure.panicked {
                        error!(
                            "Reaction {} on {} panicked: {}",
                            planned.reaction, planned.target, failure.message
                        );
                    } else {
                        warn!(
                            "Reaction {} on {} failed: {}",
                            planned.reaction, planned.target, failure.message
                        );
                    }
                    self.stats.failed += 1;
                    report.failures.push(DeliveryFailure {
                        source: pending.source.clone(),
                        trigger: pending.trigger.clone(),
                        target: planned.target.clone(),
                        reaction: planned.reaction.clone(),
                        message: failure.message,
                        panicked: failure.panicked,
                    });
                }
            }

            self.stats.delivered += 1;
            report.deliveries.push(Delivery {
                source: pending.source.clone(),
                trigger: pending.trigger.clone(),
                target: planned.target,
                reaction: planned.reaction,
                outputs,
                depth: pending.depth,
            });
        }
    }

    /// Explicit mappings for the pair win; otherwise broadcast `filter`.
    fn plan(&self, source: &str, trigger: &str, subject_area: &str) -> Vec<PlannedDelivery> {
        let mapped: Vec<PlannedDelivery> = self
            .mappings
            .iter()
            .filter(|m| m.matches(source, trigger))
            .map(|m| PlannedDelivery {
                target: m.target.clone(),
                reaction: m.reaction.clone(),
                mapping: Some(m.clone()),
            })
            .collect();
        if !mapped.is_empty() || !self.broadcast_filter || subject_area.is_empty() {
            return mapped;
        }

        self.entries
            .iter()
            .filter(|(id, entry)| {
                id.as_str() != source
                    && entry.vis.uses_subject_area(subject_area)
                    && entry.descriptor.schema.reaction(FILTER_REACTION).is_some()
            })
            .map(|(id, _)| PlannedDelivery {
                target: id.clone(),
                reaction: FILTER_REACTION.to_string(),
                mapping: None,
            })
            .collect()
    }

    fn invoke(
        &mut self,
        pending: &PendingFire,
        planned: &PlannedDelivery,
        outputs: &[InteractionOutput],
        subject_area: &str,
    ) -> std::result::Result<ReactionOutcome, Failure> {
        match planned.reaction.as_str() {
            FILTER_REACTION => Ok(self.apply_filter(&planned.target, outputs, subject_area)),
            LOG_REACTION => {
                for output in outputs {
                    info!(
                        "{}.{} -> {}: {} = {:?}",
                        pending.source, pending.trigger, planned.target, output.column.name, output.values
                    );
                }
                Ok(ReactionOutcome::default())
            }
            reaction => {
                let entry = self.entries.get(&planned.target).ok_or_else(|| Failure {
                    message: format!("visualization '{}' is gone", planned.target),
                    panicked: false,
                })?;
                let ctx = ReactionContext {
                    source: &pending.source,
                    trigger: &pending.trigger,
                    reaction,
                    outputs,
                    target: &entry.vis,
                };
                let plugin = Arc::clone(&entry.descriptor.plugin);
                match panic::catch_unwind(AssertUnwindSafe(|| plugin.react(reaction, &ctx))) {
                    Ok(Ok(outcome)) => Ok(outcome),
                    Ok(Err(e)) => Err(Failure {
                        message: e.to_string(),
                        panicked: false,
                    }),
                    Err(payload) => Err(Failure {
                        message: panic_message(payload.as_ref()),
                        panicked: true,
                    }),
                }
            }
        }
    }

    /// The general filter reaction: one `in` filter per output column.
    fn apply_filter(&mut self, target: &str, outputs: &[InteractionOutput], subject_area: &str) -> ReactionOutcome {
        let Some(entry) = self.entries.get_mut(target) else {
            return ReactionOutcome::default();
        };
        let mut changed = false;
        for output in outputs.iter().filter(|o| !o.values.is_empty()) {
            let area = if output.column.subject_area.is_empty() {
                subject_area
            } else {
                output.column.subject_area.as_str()
            };
            let filter = Filter::new(output.column.code.clone(), area, output.values.clone())
                .with_name(output.column.name.clone())
                .global();
            changed |= entry.vis.query.apply_filter(&filter);
        }
        if changed {
            debug!("Filters updated on {}", target);
        }
        ReactionOutcome {
            refresh: changed,
            cascade: Vec::new(),
        }
    }

    pub fn visualization(&self, id: &str) -> Option<&Visualization> {
        self.entries.get(id).map(|e| &e.vis)
    }

    pub fn visualization_mut(&mut self, id: &str) -> Option<&mut Visualization> {
        self.entries.get_mut(id).map(|e| &mut e.vis)
    }

    pub fn descriptor(&self, id: &str) -> Option<&Arc<PluginDescriptor>> {
        self.entries.get(id).map(|e| &e.descriptor)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn mappings(&self) -> &[InteractionMapping] {
        &self.mappings
    }

    pub fn drilldowns(&self) -> &[Drilldown] {
        &self.drilldowns
    }

    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    /// Arrive from a drill: take over its trail and apply its filters to
    /// every visualization querying the filtered subject area.
    ///
    /// Returns the visualizations whose filters changed.
    pub fn enter_drill(&mut self, request: &DrillRequest) -> Vec<String> {
        self.breadcrumbs = request.breadcrumbs.clone();
        let filters: Vec<_> = request.filters.iter().map(|f| f.to_filter()).collect();
        let mut changed = Vec::new();
        for (id, entry) in self.entries.iter_mut() {
            let mut touched = false;
            for filter in &filters {
                touched |= entry.vis.query.apply_filter(filter);
            }
            if touched {
                changed.push(id.clone());
            }
        }
        debug!("Entered drill from {} ({} updated)", request.source, changed.len());
        changed
    }

    pub fn stats(&self) -> &BusStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every visualization and mapping.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            info!("Clearing bus ({} visualizations)", self.entries.len());
        }
        self.entries.clear();
        self.mappings.clear();
        self.drilldowns.clear();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "plugin panicked".to_string()
    }
}
