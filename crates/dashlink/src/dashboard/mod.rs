//! Dashboard documents and live pages.

mod document;
mod page;
mod persistence;
mod visualization;

pub use document::{DashboardDocument, DOCUMENT_VERSION};
pub use page::{DashboardPage, LoadIssue, LoadReport};
pub use visualization::{Visualization, VisualizationSpec};
