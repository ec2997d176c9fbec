//! Integration tests for action/reaction dispatch across a page.

use std::sync::Arc;

use dashlink::data::{Datum, Value};
use dashlink::interaction::{ActionReactionBus, Drilldown, Filter, InteractionMapping, Query, SuppressReason};
use dashlink::mapping::{ColumnMap, ColumnRef};
use dashlink::plugin::{builtin, PluginDescriptor, PluginRegistry, RecordingPlugin};
use dashlink::schema::{Column, DataType};
use dashlink::{DashlinkError, Visualization};

const REGION: &str = "\"Geo\".\"Region\"";
const REVENUE: &str = "\"Facts\".\"Revenue\"";

fn region() -> Column {
    Column::new(REGION, "Region")
}

fn revenue() -> Column {
    Column::new(REVENUE, "Revenue").with_type(DataType::Double)
}

fn registry(plugin: Arc<RecordingPlugin>) -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    builtin::register_all(&mut registry, plugin).unwrap();
    registry
}

fn pie(id: &str, subject_area: &str) -> Visualization {
    Visualization::new(id, "pie")
        .with_columns(
            ColumnMap::new()
                .with_single("category", region())
                .with_single("measure", revenue()),
        )
        .with_query(Query::new(subject_area))
}

fn table(id: &str, plugin: &str, subject_area: &str) -> Visualization {
    Visualization::new(id, plugin)
        .with_columns(ColumnMap::new().with_multiple("columns", vec![region(), revenue()]))
        .with_query(Query::new(subject_area))
}

fn add(bus: &mut ActionReactionBus, registry: &PluginRegistry, vis: Visualization) {
    let descriptor = registry.get(&vis.plugin).unwrap();
    bus.register(vis, descriptor).unwrap();
}

fn east() -> Vec<Datum> {
    vec![Datum::new().with("category", "East").with("measure", 120.0)]
}

fn filter_values(bus: &ActionReactionBus, id: &str) -> Option<Vec<Value>> {
    bus.visualization(id)?
        .query
        .query(None)?
        .find_filter(REGION)
        .map(|f| f.values.clone())
}

#[test]
fn test_click_slice_filters_mapped_target() {
    let registry = registry(Arc::new(RecordingPlugin::new()));
    let mut bus = ActionReactionBus::new();
    add(&mut bus, &registry, pie("A", "Sales"));
    add(&mut bus, &registry, pie("B", "Sales"));
    bus.map_interaction(InteractionMapping::new("A", "clickSlice", "B", "filter"))
        .unwrap();

    let report = bus.fire("A", "clickSlice", &east()).unwrap();

    assert_eq!(report.targets(), vec!["B"]);
    assert_eq!(report.refresh, vec!["B"]);
    assert!(report.is_clean());
    assert_eq!(filter_values(&bus, "B"), Some(vec![Value::from("East")]));
    assert_eq!(filter_values(&bus, "A"), None);
}

#[test]
fn test_broadcast_reaches_same_subject_area_only() {
    let registry = registry(Arc::new(RecordingPlugin::new()));
    let mut bus = ActionReactionBus::new();
    add(&mut bus, &registry, pie("A", "Sales"));
    add(&mut bus, &registry, pie("B", "Sales"));
    add(&mut bus, &registry, table("C", "table", "Sales"));
    add(&mut bus, &registry, pie("D", "HR"));

    let report = bus.fire("A", "clickSlice", &east()).unwrap();

    assert_eq!(report.targets(), vec!["B", "C"]);
    assert!(filter_values(&bus, "C").is_some());
    assert_eq!(filter_values(&bus, "D"), None);
}

#[test]
fn test_broadcast_disabled_delivers_nothing_unmapped() {
    let registry = registry(Arc::new(RecordingPlugin::new()));
    let mut bus = ActionReactionBus::new().with_broadcast_filter(false);
    add(&mut bus, &registry, pie("A", "Sales"));
    add(&mut bus, &registry, pie("B", "Sales"));

    let report = bus.fire("A", "clickSlice", &east()).unwrap();
    assert!(report.deliveries.is_empty());
    assert_eq!(filter_values(&bus, "B"), None);
}

#[test]
fn test_failing_target_does_not_stop_others() {
    let healthy = Arc::new(RecordingPlugin::new());
    let broken = Arc::new(RecordingPlugin::new().panicking_on("search", "index out of bounds"));

    let mut registry = registry(Arc::clone(&healthy));
    let mut schema = builtin::table();
    schema.id = "broken-table".to_string();
    registry.register(PluginDescriptor::new(schema, broken.clone())).unwrap();

    let mut bus = ActionReactionBus::new();
    add(&mut bus, &registry, pie("A", "Sales"));
    add(&mut bus, &registry, table("B", "table", "Sales"));
    add(&mut bus, &registry, table("C", "broken-table", "Sales"));
    add(&mut bus, &registry, table("D", "table", "Sales"));
    for target in ["B", "C", "D"] {
        bus.map_interaction(InteractionMapping::new("A", "clickSlice", target, "search"))
            .unwrap();
    }

    let report = bus.fire("A", "clickSlice", &east()).unwrap();

    assert_eq!(report.targets(), vec!["B", "C", "D"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].target, "C");
    assert!(report.failures[0].panicked);
    assert_eq!(healthy.reacted_targets(), vec!["B", "D"]);
    assert_eq!(broken.reacted_targets(), vec!["C"]);
    assert_eq!(bus.stats().failed, 1);
}

#[test]
fn test_private_reaction_receives_shaped_outputs() {
    let plugin = Arc::new(RecordingPlugin::new());
    let registry = registry(Arc::clone(&plugin));
    let mut bus = ActionReactionBus::new();
    add(&mut bus, &registry, pie("A", "Sales"));
    add(&mut bus, &registry, table("B", "table", "Sales"));
    bus.map_interaction(InteractionMapping::new("A", "clickSlice", "B", "search"))
        .unwrap();

    let payload = vec![
        Datum::new().with("category", "East"),
        Datum::new().with("category", Value::Null),
        Datum::new().with("category", "East"),
        Datum::new().with("category", "West"),
    ];
    let report = bus.fire("A", "clickSlice", &payload).unwrap();

    let outputs = &report.deliveries[0].outputs;
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].values, vec![Value::from("East"), Value::from("West")]);
    assert_eq!(outputs[0].target_id, Some(ColumnRef::indexed("columns", 0)));

    let recorded = plugin.reactions();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].source, "A");
    assert_eq!(recorded[0].outputs[0].0, "category");
    assert_eq!(
        recorded[0].roles,
        vec![("columns".to_string(), vec![Value::from("East"), Value::from("West")])]
    );
}

#[test]
fn test_empty_payload_still_invokes() {
    let plugin = Arc::new(RecordingPlugin::new());
    let registry = registry(Arc::clone(&plugin));
    let mut bus = ActionReactionBus::new();
    add(&mut bus, &registry, pie("A", "Sales"));
    add(&mut bus, &registry, table("B", "table", "Sales"));
    bus.map_interaction(InteractionMapping::new("A", "clickSlice", "B", "search"))
        .unwrap();

    let report = bus.fire("A", "clickSlice", &[]).unwrap();
    assert_eq!(report.targets(), vec!["B"]);
    assert!(report.deliveries[0].outputs.is_empty());
    assert_eq!(plugin.reacted_targets(), vec!["B"]);
}

#[test]
fn test_cascade_cycle_is_suppressed() {
    let plugin = Arc::new(RecordingPlugin::new().cascading_on("search", "rowClick", vec![]));
    let registry = registry(Arc::clone(&plugin));
    let mut bus = ActionReactionBus::new();
    add(&mut bus, &registry, table("T1", "table", "Sales"));
    add(&mut bus, &registry, table("T2", "table", "Sales"));
    bus.map_interaction(InteractionMapping::new("T1", "rowClick", "T2", "search"))
        .unwrap();
    bus.map_interaction(InteractionMapping::new("T2", "rowClick", "T1", "search"))
        .unwrap();

    let report = bus.fire("T1", "rowClick", &[]).unwrap();

    assert_eq!(report.targets(), vec!["T2", "T1"]);
    assert_eq!(report.deliveries[1].depth, 1);
    assert_eq!(report.suppressed.len(), 1);
    assert_eq!(report.suppressed[0].visualization, "T1");
    assert_eq!(report.suppressed[0].reason, SuppressReason::Reentrant);
}

#[test]
fn test_cascade_depth_bound() {
    let plugin = Arc::new(RecordingPlugin::new().cascading_on("search", "rowClick", vec![]));
    let registry = registry(Arc::clone(&plugin));
    let mut bus = ActionReactionBus::new().with_max_cascade_depth(1);
    for id in ["T1", "T2", "T3", "T4"] {
        add(&mut bus, &registry, table(id, "table", "Sales"));
    }
    for (source, target) in [("T1", "T2"), ("T2", "T3"), ("T3", "T4")] {
        bus.map_interaction(InteractionMapping::new(source, "rowClick", target, "search"))
            .unwrap();
    }

    let report = bus.fire("T1", "rowClick", &[]).unwrap();

    assert_eq!(report.targets(), vec!["T2", "T3"]);
    assert_eq!(report.suppressed.len(), 1);
    assert_eq!(report.suppressed[0].reason, SuppressReason::DepthExceeded);
}

#[test]
fn test_multi_dataset_source_resolves_action_dataset() {
    let registry = registry(Arc::new(RecordingPlugin::new()));
    let mut bus = ActionReactionBus::new();
    let map = Visualization::new("M", "map-choro-points")
        .with_columns(dashlink::ColumnSet::Datasets(
            [
                (
                    "Choropleth".to_string(),
                    ColumnMap::new()
                        .with_single("code", region())
                        .with_single("desc", Column::new("\"Geo\".\"Name\"", "Name"))
                        .with_multiple("measure", vec![revenue()]),
                ),
                (
                    "Points".to_string(),
                    ColumnMap::new().with_single("desc", Column::new("\"Store\".\"Name\"", "Store")),
                ),
            ]
            .into_iter()
            .collect(),
        ))
        .with_query(Query::new("Sales"));
    add(&mut bus, &registry, map);
    add(&mut bus, &registry, pie("B", "Sales"));

    let report = bus
        .fire("M", "clickFeature", &[Datum::new().with("code", "East")])
        .unwrap();

    assert_eq!(report.targets(), vec!["B"]);
    let output = &report.deliveries[0].outputs[0];
    assert_eq!(output.target_id, Some(ColumnRef::new("category")));
    assert_eq!(filter_values(&bus, "B"), Some(vec![Value::from("East")]));
}

#[test]
fn test_fire_errors_are_caller_errors_only() {
    let registry = registry(Arc::new(RecordingPlugin::new()));
    let mut bus = ActionReactionBus::new();
    add(&mut bus, &registry, pie("A", "Sales"));

    assert!(matches!(
        bus.fire("Z", "clickSlice", &[]),
        Err(DashlinkError::UnknownVisualization(_))
    ));
    assert!(matches!(
        bus.fire("A", "doubleClick", &[]),
        Err(DashlinkError::UnknownTrigger { .. })
    ));
}

#[test]
fn test_unregister_drops_mappings() {
    let registry = registry(Arc::new(RecordingPlugin::new()));
    let mut bus = ActionReactionBus::new().with_broadcast_filter(false);
    add(&mut bus, &registry, pie("A", "Sales"));
    add(&mut bus, &registry, pie("B", "Sales"));
    bus.map_interaction(InteractionMapping::new("A", "clickSlice", "B", "filter"))
        .unwrap();

    bus.unregister("B").unwrap();
    assert!(bus.mappings().is_empty());
    let report = bus.fire("A", "clickSlice", &east()).unwrap();
    assert!(report.deliveries.is_empty());
}

#[test]
fn test_self_targeted_mapping_filters_source() {
    let registry = registry(Arc::new(RecordingPlugin::new()));
    let mut bus = ActionReactionBus::new();
    add(&mut bus, &registry, pie("A", "Sales"));
    add(&mut bus, &registry, pie("B", "Sales"));
    bus.map_interaction(InteractionMapping::new("A", "clickSlice", "A", "filter"))
        .unwrap();

    let report = bus.fire("A", "clickSlice", &east()).unwrap();
    assert_eq!(report.targets(), vec!["A"]);
    assert_eq!(filter_values(&bus, "A"), Some(vec![Value::from("East")]));
    assert_eq!(filter_values(&bus, "B"), None);
}

#[test]
fn test_drill_moves_filters_to_target_page() {
    let registry = registry(Arc::new(RecordingPlugin::new()));
    let mut sales = ActionReactionBus::new();
    add(
        &mut sales,
        &registry,
        pie("A", "Sales").with_query(
            Query::new("Sales")
                .with_filter(Filter::new("\"Time\".\"Year\"", "Sales", vec![Value::from(2024.0)]).global()),
        ),
    );
    add(&mut sales, &registry, pie("B", "Sales"));
    sales
        .map_drilldown(Drilldown::new("A", "clickSlice", "/sales/region").with_source_path("/sales"))
        .unwrap();

    let mut report = sales.fire("A", "clickSlice", &east()).unwrap();
    // The drill does not replace the broadcast.
    assert_eq!(report.targets(), vec!["B"]);
    let request = report.drills.remove(0);
    assert_eq!(request.filters.len(), 2);

    let mut region = ActionReactionBus::new();
    add(&mut region, &registry, table("T", "table", "Sales"));
    assert_eq!(region.enter_drill(&request), vec!["T"]);
    assert_eq!(filter_values(&region, "T"), Some(vec![Value::from("East")]));
    assert_eq!(region.breadcrumbs()[0].source_path, "/sales");
}
