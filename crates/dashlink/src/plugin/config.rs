//! Typed visualization configuration.
//!
//! Each plugin declares its configuration parameters with a kind and a
//! default. Raw JSON from a dashboard document is coerced once, at load, into
//! a [`VisConfig`]; renderers read typed values from it and never coerce
//! themselves. Anything that does not fit is reported as a [`ConfigIssue`] and
//! replaced by the parameter default.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::formatting::Colour;

/// A coerced configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

/// Kind of a configuration parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterKind {
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Boolean,
    Colour,
    Choice { choices: Vec<String> },
    Text,
    /// Ordered list of colours.
    Palette,
}

/// One configurable property of a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigParameter {
    pub target_property: String,
    pub label: String,
    pub kind: ParameterKind,
    pub default: ConfigValue,
    #[serde(default)]
    pub description: String,
}

impl ConfigParameter {
    fn build(target: &str, label: &str, kind: ParameterKind, default: ConfigValue) -> Self {
        Self {
            target_property: target.to_string(),
            label: label.to_string(),
            kind,
            default,
            description: String::new(),
        }
    }

    pub fn number(target: &str, label: &str, default: f64) -> Self {
        Self::build(
            target,
            label,
            ParameterKind::Number { min: None, max: None },
            ConfigValue::Number(default),
        )
    }

    pub fn boolean(target: &str, label: &str, default: bool) -> Self {
        Self::build(target, label, ParameterKind::Boolean, ConfigValue::Bool(default))
    }

    pub fn colour(target: &str, label: &str, default: &str) -> Self {
        Self::build(target, label, ParameterKind::Colour, ConfigValue::Text(default.to_string()))
    }

    pub fn text(target: &str, label: &str, default: &str) -> Self {
        Self::build(target, label, ParameterKind::Text, ConfigValue::Text(default.to_string()))
    }

    pub fn choice(target: &str, label: &str, choices: &[&str], default: &str) -> Self {
        Self::build(
            target,
            label,
            ParameterKind::Choice {
                choices: choices.iter().map(|c| c.to_string()).collect(),
            },
            ConfigValue::Text(default.to_string()),
        )
    }

    pub fn palette(target: &str, label: &str, default: &[&str]) -> Self {
        Self::build(
            target,
            label,
            ParameterKind::Palette,
            ConfigValue::List(default.iter().map(|c| c.to_string()).collect()),
        )
    }

    /// Bound a number parameter. Has no effect on other kinds.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        if let ParameterKind::Number { min: lo, max: hi } = &mut self.kind {
            *lo = Some(min);
            *hi = Some(max);
        }
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Coerce a raw value to this parameter's kind.
    pub fn coerce(&self, raw: &Json) -> Result<ConfigValue, IssueKind> {
        match &self.kind {
            ParameterKind::Number { min, max } => {
                let n = match raw {
                    Json::Number(n) => n.as_f64(),
                    Json::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|n| n.is_finite())
                .ok_or(IssueKind::WrongType)?;
                if min.is_some_and(|lo| n < lo) || max.is_some_and(|hi| n > hi) {
                    return Err(IssueKind::OutOfRange);
                }
                Ok(ConfigValue::Number(n))
            }
            ParameterKind::Boolean => match raw {
                Json::Bool(b) => Ok(ConfigValue::Bool(*b)),
                Json::String(s) if s == "true" => Ok(ConfigValue::Bool(true)),
                Json::String(s) if s == "false" => Ok(ConfigValue::Bool(false)),
                _ => Err(IssueKind::WrongType),
            },
            ParameterKind::Colour => match raw {
                Json::String(s) if Colour::parse(s).is_some() => Ok(ConfigValue::Text(s.clone())),
                Json::String(_) => Err(IssueKind::InvalidColour),
                _ => Err(IssueKind::WrongType),
            },
            ParameterKind::Choice { choices } => match raw {
                Json::String(s) if choices.contains(s) => Ok(ConfigValue::Text(s.clone())),
                Json::String(_) => Err(IssueKind::NotAChoice),
                _ => Err(IssueKind::WrongType),
            },
            ParameterKind::Text => match raw {
                Json::String(s) => Ok(ConfigValue::Text(s.clone())),
                Json::Number(n) => Ok(ConfigValue::Text(n.to_string())),
                _ => Err(IssueKind::WrongType),
            },
            ParameterKind::Palette => {
                let Json::Array(items) = raw else {
                    return Err(IssueKind::WrongType);
                };
                items
                    .iter()
                    .map(|item| match item {
                        Json::String(s) if Colour::parse(s).is_some() => Ok(s.clone()),
                        _ => Err(IssueKind::InvalidColour),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(ConfigValue::List)
            }
        }
    }
}

/// Why a raw configuration value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The plugin declares no such property.
    Unknown,
    WrongType,
    OutOfRange,
    NotAChoice,
    InvalidColour,
}

impl IssueKind {
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::Unknown => "unknown property",
            IssueKind::WrongType => "wrong type",
            IssueKind::OutOfRange => "out of range",
            IssueKind::NotAChoice => "not one of the allowed choices",
            IssueKind::InvalidColour => "invalid colour",
        }
    }
}

/// A raw configuration value that was dropped at load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    pub property: String,
    pub kind: IssueKind,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.kind.label())
    }
}

/// The declared parameters of a plugin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigSchema<'a> {
    parameters: &'a [ConfigParameter],
}

impl<'a> ConfigSchema<'a> {
    pub fn new(parameters: &'a [ConfigParameter]) -> Self {
        Self { parameters }
    }

    /// Coerce raw values against the schema.
    ///
    /// Every declared parameter ends up with a value: the coerced raw value
    /// when it fits, otherwise the default.
    pub fn load(&self, raw: &IndexMap<String, Json>) -> (VisConfig, Vec<ConfigIssue>) {
        let mut values = IndexMap::new();
        let mut issues = Vec::new();

        for param in self.parameters {
            let value = match raw.get(&param.target_property) {
                None | Some(Json::Null) => param.default.clone(),
                Some(raw_value) => param.coerce(raw_value).unwrap_or_else(|kind| {
                    issues.push(ConfigIssue {
                        property: param.target_property.clone(),
                        kind,
                    });
                    param.default.clone()
                }),
            };
            values.insert(param.target_property.clone(), value);
        }

        for key in raw.keys() {
            if !self.parameters.iter().any(|p| &p.target_property == key) {
                issues.push(ConfigIssue {
                    property: key.clone(),
                    kind: IssueKind::Unknown,
                });
            }
        }

        (VisConfig { values }, issues)
    }
}

/// Validated configuration of one visualization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisConfig {
    values: IndexMap<String, ConfigValue>,
}

impl VisConfig {
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.values.get(key)? {
            ConfigValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn colour(&self, key: &str) -> Option<Colour> {
        self.text(key).and_then(Colour::parse)
    }

    pub fn palette(&self, key: &str) -> Option<&[String]> {
        match self.values.get(key)? {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> Vec<ConfigParameter> {
        vec![
            ConfigParameter::number("size", "Size", 10.0).with_range(1.0, 50.0),
            ConfigParameter::boolean("legend", "Show legend", true),
            ConfigParameter::colour("colour", "Colour", "#5DA5DA"),
            ConfigParameter::choice("orient", "Orientation", &["vertical", "horizontal"], "vertical"),
            ConfigParameter::palette("colours", "Palette", &["#ff0000", "#00ff00"]),
        ]
    }

    fn raw(value: Json) -> IndexMap<String, Json> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults_fill_missing() {
        let params = params();
        let (config, issues) = ConfigSchema::new(&params).load(&IndexMap::new());
        assert!(issues.is_empty());
        assert_eq!(config.number("size"), Some(10.0));
        assert_eq!(config.flag("legend"), Some(true));
        assert_eq!(config.colour("colour"), Colour::parse("#5da5da"));
        assert_eq!(config.palette("colours").map(|p| p.len()), Some(2));
    }

    #[test]
    fn test_numeric_strings_coerce_once() {
        let params = params();
        let (config, issues) =
            ConfigSchema::new(&params).load(&raw(json!({"size": "25", "legend": "false"})));
        assert!(issues.is_empty());
        assert_eq!(config.number("size"), Some(25.0));
        assert_eq!(config.flag("legend"), Some(false));
    }

    #[test]
    fn test_invalid_values_fall_back_with_issue() {
        let params = params();
        let (config, issues) = ConfigSchema::new(&params).load(&raw(json!({
            "size": 500,
            "colour": "blueish",
            "orient": "diagonal",
            "colours": ["#ff0000", 3],
            "extra": 1
        })));
        assert_eq!(config.number("size"), Some(10.0));
        assert_eq!(config.text("orient"), Some("vertical"));
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::OutOfRange,
                IssueKind::InvalidColour,
                IssueKind::NotAChoice,
                IssueKind::InvalidColour,
                IssueKind::Unknown
            ]
        );
        assert!(config.get("extra").is_none());
        assert_eq!(issues[4].to_string(), "extra: unknown property");
    }

    #[test]
    fn test_parameter_json_shape() {
        let json = r#"{"target_property":"size","label":"Size",
            "kind":{"type":"number","min":1,"max":5},"default":2}"#;
        let param: ConfigParameter = serde_json::from_str(json).unwrap();
        assert_eq!(param.kind, ParameterKind::Number { min: Some(1.0), max: Some(5.0) });
        assert_eq!(param.default, ConfigValue::Number(2.0));
    }
}
