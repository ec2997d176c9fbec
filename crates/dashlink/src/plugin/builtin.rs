//! Schemas of the stock visualization types.
//!
//! These carry the interaction and formatting contract only. Hosts pair each
//! schema with a renderer when registering.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::Result;
use crate::interaction::{Action, ActionType, Reaction};

use super::config::ConfigParameter;
use super::descriptor::{
    MappingParameter, MappingSchema, ParameterType, PluginDescriptor, PluginSchema, SpecialFormat,
};
use super::registry::PluginRegistry;
use super::renderer::VisualizationPlugin;

const FLAT_UI: &[&str] = &[
    "#1abc9c", "#3498db", "#9b59b6", "#f1c40f", "#e67e22", "#e74c3c", "#2ecc71", "#34495e",
];

fn size(width: f64, height: f64) -> [ConfigParameter; 2] {
    [
        ConfigParameter::number("width", "Width", width).with_range(0.0, 4000.0),
        ConfigParameter::number("height", "Height", height).with_range(0.0, 4000.0),
    ]
}

pub fn pie() -> PluginSchema {
    PluginSchema::new("pie", "Pie Chart")
        .with_description("Pie or donut chart of one measure split by one attribute.")
        .with_mapping(MappingSchema::Single(vec![
            MappingParameter::new("category", "Category", ParameterType::Dim)
                .required()
                .conditional_format(),
            MappingParameter::new("measure", "Measure", ParameterType::Fact).required(),
        ]))
        .with_config(ConfigParameter::number("size", "Size", 400.0).with_range(0.0, 4000.0))
        .with_config(ConfigParameter::number("innerRadius", "Inner Radius", 0.0).with_range(0.0, 2000.0))
        .with_config(ConfigParameter::boolean("legend", "Show Legend", true))
        .with_config(ConfigParameter::palette("colours", "Colours", FLAT_UI))
        .with_action(
            Action::new("clickSlice", "Click - Slice", ActionType::Click, &["category"])
                .with_description("Click on a slice to pass its category."),
        )
        .with_action(Action::new("hoverSlice", "Hover - Slice", ActionType::Hover, &["category"]))
        .with_reaction(Reaction::filter())
}

pub fn bar() -> PluginSchema {
    let [width, height] = size(400.0, 300.0);
    PluginSchema::new("bar", "Bar Chart")
        .with_mapping(MappingSchema::Single(vec![
            MappingParameter::new("category", "Category", ParameterType::Dim).required(),
            MappingParameter::new("measure", "Measure", ParameterType::Fact)
                .required()
                .multiple()
                .conditional_format(),
            MappingParameter::new("vary", "Vary By Colour", ParameterType::Dim),
            MappingParameter::new("hidden", "Hidden", ParameterType::Hidden).multiple(),
        ]))
        .with_config(width)
        .with_config(height)
        .with_config(ConfigParameter::boolean("legend", "Show Legend", true))
        .with_config(ConfigParameter::boolean("stacked", "Stacked", false))
        .with_config(ConfigParameter::boolean("horizontal", "Horizontal", false))
        .with_config(ConfigParameter::choice(
            "sortDirDefault",
            "Default Sort Direction",
            &["Ascending", "Descending"],
            "Descending",
        ))
        .with_config(ConfigParameter::palette("colours", "Colours", FLAT_UI))
        .with_action(Action::new("barClick", "Click - Bar", ActionType::Click, &["category", "vary"]))
        .with_action(Action::new(
            "barHover",
            "Hover - Bar",
            ActionType::Mouseover,
            &["category", "vary"],
        ))
        .with_action(Action::new("sectionClick", "Click - Section", ActionType::Click, &["category"]))
        .with_reaction(Reaction::filter())
}

pub fn table() -> PluginSchema {
    let [width, height] = size(400.0, 400.0);
    PluginSchema::new("table", "Table")
        .with_mapping(MappingSchema::Single(vec![
            MappingParameter::new("columns", "Column", ParameterType::Any)
                .required()
                .multiple()
                .conditional_format(),
            MappingParameter::new("hidden", "Hidden", ParameterType::Hidden).multiple(),
        ]))
        .with_config(width)
        .with_config(height)
        .with_config(ConfigParameter::colour("themeColour", "Theme Colour", "#5DA5DA"))
        .with_config(ConfigParameter::text("font", "Font", "Open Sans"))
        .with_config(ConfigParameter::number("fontSize", "Font Size", 11.0).with_range(6.0, 72.0))
        .with_config(ConfigParameter::boolean("wrapHeader", "Wrap Header", false))
        .with_action(Action::new("rowClick", "Click - Row", ActionType::Click, &["columns"]))
        .with_action(Action::new("rowHover", "Hover - Row", ActionType::Mouseover, &["columns"]))
        .with_reaction(Reaction::filter())
        .with_reaction(
            Reaction::private("search", "Search")
                .with_description("Search the table for the values passed from the action."),
        )
}

pub fn pivot_table() -> PluginSchema {
    let [width, height] = size(300.0, 300.0);
    PluginSchema::new("pivot-table", "Pivot Table")
        .with_mapping(MappingSchema::Single(vec![
            MappingParameter::new("rows", "Rows", ParameterType::Any).multiple(),
            MappingParameter::new("columns", "Columns", ParameterType::Any).multiple(),
            MappingParameter::new("measures", "Measures", ParameterType::Fact)
                .required()
                .multiple()
                .conditional_format(),
            MappingParameter::new("hidden", "Hidden Measures", ParameterType::Hidden).multiple(),
        ]))
        .with_config(width)
        .with_config(height)
        .with_config(ConfigParameter::number("columnWidth", "Column Width", 100.0).with_range(0.0, 2000.0))
        .with_config(ConfigParameter::boolean("valuesAsCols", "Values As Columns", true))
        .with_config(ConfigParameter::colour("themeColour", "Theme Colour", "#5DA5DA"))
        .with_reaction(Reaction::filter())
        .with_special_format(SpecialFormat::heatmap())
}

pub fn scatter() -> PluginSchema {
    let [width, height] = size(400.0, 400.0);
    PluginSchema::new("scatter", "Scatter Chart")
        .with_mapping(MappingSchema::Single(vec![
            MappingParameter::new("measureX", "Measure (X)", ParameterType::Fact).required(),
            MappingParameter::new("measureY", "Measure (Y)", ParameterType::Fact).required(),
            MappingParameter::new("group", "Group By", ParameterType::Dim)
                .required()
                .conditional_format(),
            MappingParameter::new("varyColour", "Vary By Colour", ParameterType::Dim),
            MappingParameter::new("varySize", "Vary By Size", ParameterType::Fact),
        ]))
        .with_config(width)
        .with_config(height)
        .with_config(ConfigParameter::number("minPointSize", "Min Point Size", 2.0).with_range(0.0, 100.0))
        .with_config(ConfigParameter::number("maxPointSize", "Max Point Size", 6.0).with_range(0.0, 100.0))
        .with_config(ConfigParameter::boolean("selectBox", "Selection Box", true))
        .with_config(ConfigParameter::palette("colours", "Colours", FLAT_UI))
        .with_action(Action::new("selection", "Selection Box", ActionType::Select, &["group"]))
        .with_action(Action::new(
            "pointHover",
            "Hover - Point",
            ActionType::Mouseover,
            &["group", "varyColour"],
        ))
        .with_action(Action::new(
            "pointClick",
            "Click - Point",
            ActionType::Click,
            &["group", "varyColour"],
        ))
        .with_reaction(Reaction::filter())
        .with_reaction(Reaction::private("highlight", "Highlight Points"))
}

pub fn map_choro_points() -> PluginSchema {
    let mut datasets = IndexMap::new();
    datasets.insert(
        "Choropleth".to_string(),
        vec![
            MappingParameter::new("code", "Code", ParameterType::Dim).required(),
            MappingParameter::new("desc", "Description", ParameterType::Dim)
                .required()
                .conditional_format(),
            MappingParameter::new("measure", "Measure", ParameterType::Fact)
                .required()
                .multiple(),
        ],
    );
    datasets.insert(
        "Points".to_string(),
        vec![
            MappingParameter::new("desc", "Description", ParameterType::Dim).required(),
            MappingParameter::new("lng", "Longitude", ParameterType::Dim).required(),
            MappingParameter::new("lat", "Latitude", ParameterType::Dim).required(),
            MappingParameter::new("vary", "Vary By Colour", ParameterType::Dim),
        ],
    );

    let [width, height] = size(400.0, 400.0);
    PluginSchema::new("map-choro-points", "Map (Choropleth & Points)")
        .with_mapping(MappingSchema::Datasets(datasets))
        .with_config(width)
        .with_config(height)
        .with_config(ConfigParameter::choice(
            "scaleType",
            "Scale Type",
            &["Linear", "Quantile"],
            "Linear",
        ))
        .with_config(ConfigParameter::number("choroOpacity", "Choropleth Opacity", 0.75).with_range(0.0, 1.0))
        .with_config(ConfigParameter::colour("nullColour", "Null Colour", "#CCCCCC"))
        .with_action(
            Action::new("clickFeature", "Click Feature", ActionType::Click, &["code"])
                .with_dataset("Choropleth")
                .with_description("Click on a map feature to trigger this action."),
        )
        .with_action(
            Action::new("clickPoint", "Click Point", ActionType::Click, &["desc"])
                .with_dataset("Points"),
        )
        .with_reaction(Reaction::filter())
}

/// Every stock schema.
pub fn schemas() -> Vec<PluginSchema> {
    vec![pie(), bar(), table(), pivot_table(), scatter(), map_choro_points()]
}

/// Register every stock schema backed by one implementation.
pub fn register_all(registry: &mut PluginRegistry, plugin: Arc<dyn VisualizationPlugin>) -> Result<()> {
    for schema in schemas() {
        registry.register(PluginDescriptor::new(schema, Arc::clone(&plugin)))?;
    }
    Ok(())
}
