//! Conditional formatting: declarative rules and heatmap scales evaluated
//! per datum at render time.
//!
//! Evaluation is pure and fails closed. A rule whose source column is missing,
//! whose operand does not coerce, or whose range is malformed simply does not
//! match; nothing here returns an error.

mod colour;
mod evaluator;
mod heatmap;
mod rule;

pub use colour::Colour;
pub use evaluator::{ConditionalFormatEvaluator, Evaluation};
pub use heatmap::HeatmapScale;
pub use rule::{ConditionalFormat, FormatRule, HeatmapFormat, Operator, RuleValue, Style};
