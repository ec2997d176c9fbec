//! Persistence for dashboard documents - save/load JSON files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::debug;

use crate::error::{DashlinkError, Result};

use super::document::DashboardDocument;

impl DashboardDocument {
    /// Save the document to a JSON file, creating parent directories.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use dashlink::dashboard::DashboardDocument;
    /// # fn example(doc: &DashboardDocument) -> dashlink::Result<()> {
    /// doc.save("dashboards/sales.json")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| DashlinkError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let file = File::create(path).map_err(|e| DashlinkError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| {
            DashlinkError::Persistence(format!("Failed to serialize dashboard '{}': {}", self.name, e))
        })?;

        debug!("Saved dashboard {} to {}", self.name, path.display());
        Ok(())
    }

    /// Load a document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| DashlinkError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let reader = BufReader::new(file);
        let doc: DashboardDocument = serde_json::from_reader(reader).map_err(|e| {
            DashlinkError::Persistence(format!(
                "Failed to parse dashboard '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(doc)
    }
}
