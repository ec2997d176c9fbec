//! Display formatting for column values.
//!
//! Number patterns follow the d3 subset the dashboards persist
//! (`[$][,][.precision][type]` with types `f`, `d`, `%`, `s`, `e`); temporal
//! patterns are strftime strings. Formatting is pure: a value or pattern that
//! cannot be honoured falls back to the raw display string.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::Value;

use super::types::DataType;

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<currency>\$)?(?P<grouping>,)?(?:\.(?P<precision>\d+))?(?P<kind>[fd%se])?$")
        .expect("number pattern regex is valid")
});

const DATETIME_INPUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const SI_PREFIXES: &[&str] = &[
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Kind of numeric rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// Fixed-point (`f`).
    Fixed,
    /// Rounded integer (`d`).
    Integer,
    /// Multiplied by 100 with a percent sign (`%`).
    Percent,
    /// Significant digits with an SI prefix (`s`).
    Si,
    /// Exponent notation (`e`).
    Exponent,
    /// Shortest round-trip representation.
    General,
}

/// A parsed numeric pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    pub currency: bool,
    pub grouping: bool,
    pub precision: Option<usize>,
    pub kind: NumberKind,
}

/// A parsed display format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFormat {
    /// Display the value as-is.
    Raw,
    Number(NumberFormat),
    /// strftime pattern.
    Temporal(String),
}

impl ColumnFormat {
    /// Parse a pattern for a column of the given type.
    pub fn parse(pattern: &str, data_type: DataType) -> Self {
        let pattern = pattern.trim();
        if pattern == "%s" {
            return ColumnFormat::Raw;
        }
        if data_type.is_temporal() && pattern.contains('%') {
            return ColumnFormat::Temporal(pattern.to_string());
        }
        if let Some(caps) = NUMBER_PATTERN.captures(pattern) {
            let kind = match caps.name("kind").map(|m| m.as_str()) {
                Some("f") => NumberKind::Fixed,
                Some("d") => NumberKind::Integer,
                Some("%") => NumberKind::Percent,
                Some("s") => NumberKind::Si,
                Some("e") => NumberKind::Exponent,
                _ => NumberKind::General,
            };
            return ColumnFormat::Number(NumberFormat {
                currency: caps.name("currency").is_some(),
                grouping: caps.name("grouping").is_some(),
                precision: caps.name("precision").and_then(|m| m.as_str().parse().ok()),
                kind,
            });
        }
        if pattern.contains('%') {
            return ColumnFormat::Temporal(pattern.to_string());
        }
        ColumnFormat::Raw
    }

    /// Format a value.
    pub fn apply(&self, value: &Value) -> String {
        match self {
            ColumnFormat::Raw => value.as_text().into_owned(),
            ColumnFormat::Number(fmt) => match value.as_f64() {
                Some(n) if n.is_finite() => fmt.apply(n),
                _ => value.as_text().into_owned(),
            },
            ColumnFormat::Temporal(pattern) => {
                format_temporal(&value.as_text(), pattern).unwrap_or_else(|| value.as_text().into_owned())
            }
        }
    }
}

impl NumberFormat {
    /// Format a finite number.
    pub fn apply(&self, n: f64) -> String {
        let precision = self.precision.unwrap_or(6);
        let negative = n < 0.0;
        let abs = n.abs();

        let (digits, suffix) = match self.kind {
            NumberKind::Fixed => (format!("{:.*}", precision, abs), String::new()),
            NumberKind::Integer => (format!("{:.0}", abs.round()), String::new()),
            NumberKind::Percent => (format!("{:.*}", precision, abs * 100.0), "%".to_string()),
            NumberKind::Si => format_si(abs, precision.max(1)),
            NumberKind::Exponent => (format_exponent(abs, precision), String::new()),
            NumberKind::General => (Value::Number(abs).to_string(), String::new()),
        };

        let digits = if self.grouping { group_thousands(&digits) } else { digits };
        let zero = digits.chars().all(|c| matches!(c, '0' | '.'));

        let mut out = String::with_capacity(digits.len() + 3);
        if negative && !zero {
            out.push('-');
        }
        if self.currency {
            out.push('$');
        }
        out.push_str(&digits);
        out.push_str(&suffix);
        out
    }
}

/// Decimal exponent of a positive number, corrected for `log10` rounding.
fn decimal_exponent(x: f64) -> i32 {
    let mut e = x.log10().floor() as i32;
    if 10f64.powi(e + 1) <= x {
        e += 1;
    } else if 10f64.powi(e) > x {
        e -= 1;
    }
    e
}

/// Round to `sig` significant digits.
fn round_significant(n: f64, sig: usize) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    let magnitude = decimal_exponent(n.abs());
    let factor = 10f64.powi(sig as i32 - 1 - magnitude);
    (n * factor).round() / factor
}

fn format_si(abs: f64, sig: usize) -> (String, String) {
    let rounded = round_significant(abs, sig);
    if rounded == 0.0 {
        return (format!("{:.*}", sig - 1, 0.0), String::new());
    }
    let exponent = (decimal_exponent(rounded).div_euclid(3) * 3).clamp(-24, 24);
    let scaled = rounded / 10f64.powi(exponent);
    let magnitude = decimal_exponent(scaled);
    let decimals = (sig as i32 - 1 - magnitude).max(0) as usize;
    let prefix = SI_PREFIXES[((exponent + 24) / 3) as usize];
    (format!("{:.*}", decimals, scaled), prefix.to_string())
}

fn format_exponent(abs: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, abs);
    match raw.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => raw,
    }
}

fn group_thousands(digits: &str) -> String {
    let (int_part, rest) = match digits.find(|c: char| !c.is_ascii_digit()) {
        Some(pos) => digits.split_at(pos),
        None => (digits, ""),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + rest.len());
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.push_str(rest);
    grouped
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for input in DATETIME_INPUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, input) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn format_temporal(raw: &str, pattern: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let dt = parse_datetime(raw)?;
    Some(dt.format_with_items(items.into_iter()).to_string())
}
