//! Column types describing the fields of a BI query result.

mod column;
mod format;
mod types;

pub use column::Column;
pub use format::ColumnFormat;
pub use types::{Aggregation, DataType};
