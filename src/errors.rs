//! Centralized error handling for npcp-prep
//!
//! Every failure aborts the pipeline, so each variant carries enough context
//! (variable name, unit strings or file path) to diagnose it without re-running.

use thiserror::Error;

/// Main error type for npcp-prep operations
#[derive(Debug, Error)]
pub enum NpcpError {
    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// Malformed conventions overlay
    #[error("Invalid conventions file: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Variable not found in the dataset
    #[error("Variable '{var}' not found in dataset")]
    VariableNotFound { var: String },

    /// Dimension not found in variable
    #[error("Dimension '{dim}' not found in variable '{var}'")]
    DimensionNotFound { var: String, dim: String },

    /// A field that must carry physical units has none
    #[error("Variable '{var}' has no units attribute")]
    MissingUnits { var: String },

    /// Canonical variable has no entry in the target unit table
    #[error("No target units configured for canonical variable '{var}'")]
    UnknownTargetUnit { var: String },

    /// Canonical name has no entry in the attribute catalog
    #[error("No attribute set in catalog for '{name}'")]
    MissingAttributeSet { name: String },

    /// Neither the generic mechanism nor any fallback can convert the units
    #[error("Cannot convert units '{source_units}' to '{target_units}': {reason}")]
    UnsupportedUnitConversion {
        source_units: String,
        target_units: String,
        reason: String,
    },

    /// Unit string could not be parsed
    #[error("Cannot parse unit string '{units}': {message}")]
    UnitParse { units: String, message: String },

    /// Renaming would clobber a distinct existing variable
    #[error("Cannot rename '{from}' to '{to}': a variable named '{to}' already exists")]
    NameConflict { from: String, to: String },

    /// Dimension names and array shapes disagree
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Grid construction or regridding failure
    #[error("Grid error: {0}")]
    GridError(String),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Conventions overlay that parses as JSON but has the wrong shape
    #[error("Invalid conventions file '{path}': {message}")]
    ConfigError { path: String, message: String },
}

/// Coarse classification of [`NpcpError`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A canonical name has no entry where one is required
    NameResolution,
    /// No conversion path between two unit strings
    UnsupportedUnitConversion,
    /// Attribute catalog does not cover a canonical name
    MissingAttributeSet,
    /// Loader/writer failures, passed through unchanged
    Io,
    /// Inconsistent or incomplete input data
    Data,
    /// Bad command-line or conventions configuration
    Config,
}

impl NpcpError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTargetUnit { .. } => ErrorKind::NameResolution,
            Self::MissingAttributeSet { .. } => ErrorKind::MissingAttributeSet,
            Self::UnsupportedUnitConversion { .. } | Self::UnitParse { .. } => {
                ErrorKind::UnsupportedUnitConversion
            }
            Self::NetCDFError(_) | Self::IoError(_) => ErrorKind::Io,
            Self::JsonError(_) | Self::ConfigError { .. } | Self::ThreadPoolError(_) => {
                ErrorKind::Config
            }
            Self::ArrayError(_)
            | Self::VariableNotFound { .. }
            | Self::DimensionNotFound { .. }
            | Self::MissingUnits { .. }
            | Self::NameConflict { .. }
            | Self::ShapeMismatch(_)
            | Self::GridError(_) => ErrorKind::Data,
        }
    }
}

/// Result type alias for npcp-prep operations
pub type Result<T> = std::result::Result<T, NpcpError>;
