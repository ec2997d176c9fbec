//! Integration tests for documents, persistence and page lifecycle.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use dashlink::data::{Datum, Value};
use dashlink::formatting::{FormatRule, Operator, Style};
use dashlink::interaction::{Filter, Query};
use dashlink::mapping::{ColumnMap, ColumnRef};
use dashlink::plugin::{builtin, PluginRegistry, RecordingPlugin};
use dashlink::schema::{Column, DataType};
use dashlink::{DashboardDocument, DashlinkError, Engine, EngineConfig, InteractionMapping, VisualizationSpec};

const REGION: &str = "\"Geo\".\"Region\"";

fn engine(plugin: Arc<RecordingPlugin>, config: EngineConfig) -> Engine {
    let mut registry = PluginRegistry::new();
    builtin::register_all(&mut registry, plugin).unwrap();
    Engine::with_config(registry, config).unwrap()
}

fn pie(id: &str) -> VisualizationSpec {
    VisualizationSpec::new(id, "pie")
        .with_columns(
            ColumnMap::new()
                .with_single("category", Column::new(REGION, "Region"))
                .with_single(
                    "measure",
                    Column::new("\"Facts\".\"Revenue\"", "Revenue").with_type(DataType::Double),
                ),
        )
        .with_query(Query::new("Sales"))
        .with_config("legend", json!(false))
}

fn sales_document() -> DashboardDocument {
    DashboardDocument::new("Sales Overview")
        .with_visualization(pie("regionPie").with_format(FormatRule::new(
            ColumnRef::new("measure"),
            Operator::Greater,
            1000,
            Style::new("#2ecc71").with_icon("arrow-up"),
        )))
        .with_visualization(pie("detailPie"))
        .with_interaction(InteractionMapping::new("regionPie", "clickSlice", "detailPie", "filter"))
}

#[test]
fn test_document_survives_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pages").join("sales.json");
    let doc = sales_document();

    doc.save(&path).unwrap();
    let loaded = DashboardDocument::load(&path).unwrap();

    assert_eq!(loaded, doc);
}

#[test]
fn test_open_file_builds_live_page() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sales.json");
    sales_document().save(&path).unwrap();

    let page = engine(Arc::new(RecordingPlugin::new()), EngineConfig::default())
        .open_file(&path)
        .unwrap();

    assert_eq!(page.name(), "Sales Overview");
    assert_eq!(page.ids(), vec!["regionPie", "detailPie"]);
    assert_eq!(page.bus().mappings().len(), 1);
    assert!(page.report().is_clean());
    let vis = page.visualization("regionPie").unwrap();
    assert_eq!(vis.config.flag("legend"), Some(false));
    assert_eq!(vis.config.number("size"), Some(400.0));
}

#[test]
fn test_open_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = engine(Arc::new(RecordingPlugin::new()), EngineConfig::default())
        .open_file(dir.path().join("nope.json"));
    assert!(matches!(result, Err(DashlinkError::Io { .. })));
}

#[test]
fn test_load_corrupt_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"name\": ").unwrap();
    assert!(matches!(
        DashboardDocument::load(&path),
        Err(DashlinkError::Persistence(_))
    ));
}

#[test]
fn test_bad_config_is_reported_not_fatal() {
    let doc = DashboardDocument::new("Sales")
        .with_visualization(pie("A").with_config("size", json!("huge")));
    let page = engine(Arc::new(RecordingPlugin::new()), EngineConfig::default()).open(&doc);

    assert_eq!(page.report().issues.len(), 1);
    assert_eq!(page.visualization("A").unwrap().config.number("size"), Some(400.0));
}

#[test]
fn test_interaction_filter_is_kept_in_snapshot() {
    let mut page = engine(Arc::new(RecordingPlugin::new()), EngineConfig::default()).open(&sales_document());

    page.fire("regionPie", "clickSlice", &[Datum::new().with("category", "East")])
        .unwrap();
    let snapshot = page.to_document();

    let detail = snapshot.visualization("detailPie").unwrap();
    let filter = detail.query.query(None).unwrap().find_filter(REGION).unwrap();
    assert_eq!(filter.values, vec![Value::from("East")]);
    assert!(filter.global);
    assert_eq!(snapshot.interactions.len(), 1);
}

#[test]
fn test_protected_filter_is_not_replaced() {
    let doc = DashboardDocument::new("Sales")
        .with_visualization(pie("A"))
        .with_visualization(pie("B").with_query(
            Query::new("Sales").with_filter(Filter::new(REGION, "Sales", vec!["West".into()]).protected()),
        ));
    let mut page = engine(Arc::new(RecordingPlugin::new()), EngineConfig::default()).open(&doc);

    let report = page
        .fire("A", "clickSlice", &[Datum::new().with("category", "East")])
        .unwrap();

    assert_eq!(report.targets(), vec!["B"]);
    assert!(report.refresh.is_empty());
    let query = page.visualization("B").unwrap().query.query(None).unwrap();
    assert_eq!(query.find_filter(REGION).unwrap().values, vec![Value::from("West")]);
}

#[test]
fn test_engine_config_from_file_disables_broadcast() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.json");
    std::fs::write(&path, r#"{ "broadcast_filter": false }"#).unwrap();
    let config = EngineConfig::load(&path).unwrap();

    let doc = DashboardDocument::new("Sales")
        .with_visualization(pie("A"))
        .with_visualization(pie("B"));
    let mut page = engine(Arc::new(RecordingPlugin::new()), config).open(&doc);

    let report = page
        .fire("A", "clickSlice", &[Datum::new().with("category", "East")])
        .unwrap();
    assert!(report.deliveries.is_empty());
}

#[test]
fn test_closed_page_releases_bus() {
    let mut page = engine(Arc::new(RecordingPlugin::new()), EngineConfig::default()).open(&sales_document());
    page.close();

    assert!(page.bus().is_empty());
    assert!(page.bus().mappings().is_empty());
    assert!(matches!(
        page.fire("regionPie", "clickSlice", &[]),
        Err(DashlinkError::UnknownVisualization(_))
    ));
}
