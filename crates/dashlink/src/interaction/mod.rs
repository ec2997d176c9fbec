//! Cross-visualization interaction: actions, reactions, the mappings between
//! them, drilldowns to other pages, the queries reactions edit and the bus
//! that dispatches it all.

mod action;
mod bus;
mod drill;
mod filter;
mod mapping;
mod output;

pub use action::{Action, ActionType, Reaction, ReactionKind, FILTER_REACTION, LOG_REACTION};
pub use bus::{
    ActionReactionBus, BusStats, Delivery, DeliveryFailure, DispatchReport, SuppressReason, SuppressedFire,
    DEFAULT_MAX_CASCADE_DEPTH,
};
pub use drill::{drill_filters, Breadcrumb, DrillFilter, DrillRequest, Drilldown};
pub use filter::{
    replace_filter, Filter, FilterGroup, FilterNode, FilterOperator, GroupOperator, Query, QuerySet, Replacement,
};
pub use mapping::InteractionMapping;
pub use output::{extract_outputs, format_outputs, InteractionOutput, TriggerOutput};
