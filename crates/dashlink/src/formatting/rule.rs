//! Conditional format definitions and rule comparison.

use serde::{Deserialize, Serialize};

use crate::data::{Datum, Value};
use crate::mapping::ColumnRef;

/// Comparison operator of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[serde(alias = "=", alias = "equals")]
    Equal,
    #[serde(alias = "!=", alias = "notEqual")]
    NotEqual,
    #[serde(alias = "<")]
    Less,
    #[serde(alias = "<=", alias = "lessOrEqual")]
    LessOrEqual,
    #[serde(alias = ">")]
    Greater,
    #[serde(alias = ">=", alias = "greaterOrEqual")]
    GreaterOrEqual,
    Contains,
    Between,
}

impl Operator {
    /// Symbol used when describing a rule.
    pub fn label(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Contains => "contains",
            Operator::Between => "between",
        }
    }
}

/// Comparison operand: a scalar, or a `[low, high]` pair for `between`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Range(Vec<Value>),
    Scalar(Value),
}

impl Default for RuleValue {
    fn default() -> Self {
        RuleValue::Scalar(Value::Null)
    }
}

impl From<Value> for RuleValue {
    fn from(value: Value) -> Self {
        RuleValue::Scalar(value)
    }
}

/// The visual treatment produced by a conditional format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub colour: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Style {
    pub fn new(colour: impl Into<String>) -> Self {
        Self {
            colour: colour.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

impl Default for Style {
    fn default() -> Self {
        Style::new("#000000")
    }
}

/// A declarative comparison that styles a datum when it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatRule {
    /// Column whose value is compared.
    pub source_id: ColumnRef,
    /// Column the style is painted on; `None` paints the whole datum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ColumnRef>,
    /// Dataset the references resolve against, for multi-dataset plugins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    pub operator: Operator,
    #[serde(default)]
    pub value: RuleValue,
    #[serde(default)]
    pub style: Style,
}

impl FormatRule {
    pub fn new(source_id: ColumnRef, operator: Operator, value: impl Into<Value>, style: Style) -> Self {
        Self {
            source_id,
            target_id: None,
            dataset: None,
            operator,
            value: RuleValue::Scalar(value.into()),
            style,
        }
    }

    /// An inclusive range rule.
    pub fn between(
        source_id: ColumnRef,
        low: impl Into<Value>,
        high: impl Into<Value>,
        style: Style,
    ) -> Self {
        Self {
            source_id,
            target_id: None,
            dataset: None,
            operator: Operator::Between,
            value: RuleValue::Range(vec![low.into(), high.into()]),
            style,
        }
    }

    pub fn with_target(mut self, target: ColumnRef) -> Self {
        self.target_id = Some(target);
        self
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Whether the rule holds for a datum.
    ///
    /// An unresolvable source column is a non-match.
    pub fn compare(&self, datum: &Datum) -> bool {
        datum
            .get(&self.source_id)
            .is_some_and(|value| self.compare_value(value))
    }

    /// Whether the rule holds for a single value.
    pub fn compare_value(&self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        match (&self.operator, &self.value) {
            (Operator::Between, RuleValue::Range(bounds)) => between(value, bounds),
            (Operator::Between, RuleValue::Scalar(_)) => false,
            (_, RuleValue::Range(_)) => false,
            (op, RuleValue::Scalar(operand)) => scalar_compare(*op, value, operand),
        }
    }
}

fn scalar_compare(op: Operator, value: &Value, operand: &Value) -> bool {
    if operand.is_null() {
        return false;
    }
    let numeric = value.as_f64().zip(operand.as_f64());
    match op {
        Operator::Equal => equal(value, operand, numeric),
        Operator::NotEqual => !equal(value, operand, numeric),
        Operator::Less => numeric.is_some_and(|(a, b)| a < b),
        Operator::LessOrEqual => numeric.is_some_and(|(a, b)| a <= b),
        Operator::Greater => numeric.is_some_and(|(a, b)| a > b),
        Operator::GreaterOrEqual => numeric.is_some_and(|(a, b)| a >= b),
        Operator::Contains => value.as_text().contains(operand.as_text().as_ref()),
        Operator::Between => false,
    }
}

fn equal(value: &Value, operand: &Value, numeric: Option<(f64, f64)>) -> bool {
    match numeric {
        Some((a, b)) => a == b,
        None => value.as_text() == operand.as_text(),
    }
}

fn between(value: &Value, bounds: &[Value]) -> bool {
    let [low, high] = bounds else {
        return false;
    };
    match (value.as_f64(), low.as_f64(), high.as_f64()) {
        (Some(v), Some(a), Some(b)) => v >= a.min(b) && v <= a.max(b),
        _ => false,
    }
}

/// Continuous colour scale keyed on a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapFormat {
    pub source_id: ColumnRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ColumnRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Colour at the top of the scale.
    pub colour: String,
    /// Fixed `[min, max]`; computed from the rendered data when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
}

impl HeatmapFormat {
    pub fn new(source_id: ColumnRef, colour: impl Into<String>) -> Self {
        Self {
            source_id,
            target_id: None,
            dataset: None,
            colour: colour.into(),
            domain: None,
        }
    }

    pub fn with_domain(mut self, min: f64, max: f64) -> Self {
        self.domain = Some([min, max]);
        self
    }

    pub fn with_target(mut self, target: ColumnRef) -> Self {
        self.target_id = Some(target);
        self
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }
}

/// One entry of a visualization's conditional format list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ConditionalFormat {
    Rule(FormatRule),
    /// Value-less special format, only honoured by plugins that declare it.
    Heatmap(HeatmapFormat),
}

impl ConditionalFormat {
    pub fn source_id(&self) -> &ColumnRef {
        match self {
            ConditionalFormat::Rule(rule) => &rule.source_id,
            ConditionalFormat::Heatmap(heat) => &heat.source_id,
        }
    }

    pub fn target_id(&self) -> Option<&ColumnRef> {
        match self {
            ConditionalFormat::Rule(rule) => rule.target_id.as_ref(),
            ConditionalFormat::Heatmap(heat) => heat.target_id.as_ref(),
        }
    }

    pub fn dataset(&self) -> Option<&str> {
        match self {
            ConditionalFormat::Rule(rule) => rule.dataset.as_deref(),
            ConditionalFormat::Heatmap(heat) => heat.dataset.as_deref(),
        }
    }

    /// Strategy id as stored in documents.
    pub fn strategy(&self) -> &'static str {
        match self {
            ConditionalFormat::Rule(_) => "rule",
            ConditionalFormat::Heatmap(_) => "heatmap",
        }
    }

    pub fn is_heatmap(&self) -> bool {
        matches!(self, ConditionalFormat::Heatmap(_))
    }
}

impl From<FormatRule> for ConditionalFormat {
    fn from(rule: FormatRule) -> Self {
        ConditionalFormat::Rule(rule)
    }
}

impl From<HeatmapFormat> for ConditionalFormat {
    fn from(heat: HeatmapFormat) -> Self {
        ConditionalFormat::Heatmap(heat)
    }
}
