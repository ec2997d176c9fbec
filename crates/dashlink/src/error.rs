//! Error types for the dashlink library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dashlink operations.
///
/// Render-time problems (a rule naming a role the column map lacks, a
/// non-numeric value under a numeric operator) never show up here: those fail
/// closed. Errors are reserved for misuse at the API boundary and for I/O.
#[derive(Debug, Error)]
pub enum DashlinkError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A column reference string could not be parsed.
    #[error("Invalid column reference: '{0}'")]
    InvalidColumnRef(String),

    /// Engine configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A plugin descriptor failed validation at registration time.
    #[error("Invalid descriptor for plugin '{plugin}': {reason}")]
    InvalidDescriptor { plugin: String, reason: String },

    /// A plugin with the same id is already registered.
    #[error("Plugin '{0}' is already registered")]
    DuplicatePlugin(String),

    /// No plugin registered under this id.
    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    /// A visualization with the same id is already on the bus.
    #[error("Visualization '{0}' is already registered")]
    DuplicateVisualization(String),

    /// No visualization registered under this id.
    #[error("Unknown visualization: {0}")]
    UnknownVisualization(String),

    /// The trigger is not declared in the source plugin's actions.
    #[error("Trigger '{trigger}' is not declared by visualization '{visualization}'")]
    UnknownTrigger {
        visualization: String,
        trigger: String,
    },

    /// The reaction is not declared in the target plugin's reactions.
    #[error("Reaction '{reaction}' is not declared by visualization '{visualization}'")]
    UnknownReaction {
        visualization: String,
        reaction: String,
    },

    /// An interaction mapping could not be wired.
    #[error("Invalid interaction: {0}")]
    InvalidInteraction(String),

    /// A reaction handler reported a failure.
    #[error("Reaction '{reaction}' failed: {message}")]
    Reaction { reaction: String, message: String },

    /// A plugin failed to render.
    #[error("Render failed for '{visualization}': {message}")]
    Render {
        visualization: String,
        message: String,
    },

    /// Dashboard document persistence error.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for dashlink operations.
pub type Result<T> = std::result::Result<T, DashlinkError>;
