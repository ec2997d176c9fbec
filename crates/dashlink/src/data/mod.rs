//! Shaped query-result rows as delivered to a visualization's render step.

mod datum;
mod value;

pub use datum::{Data, Datum, Field, NamedValue};
pub use value::Value;
