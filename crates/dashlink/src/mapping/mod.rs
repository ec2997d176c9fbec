//! Column-map addressing: resolving role names (optionally indexed, optionally
//! namespaced by dataset) to the columns bound to a visualization.
//!
//! Every lookup fails closed. A role, index or dataset that is not bound
//! resolves to `None`; required-role validation belongs to [`validate`], which
//! reports issues instead of failing.

mod column_map;
mod column_set;
mod reference;
mod validate;

pub use column_map::{Binding, ColumnMap};
pub use column_set::ColumnSet;
pub use reference::ColumnRef;
pub use validate::{validate, SchemaIssue};
