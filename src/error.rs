//! Error types for the deck builder
//!
//! This module defines all error types that can occur while importing
//! tetrahedralizer output, assembling the global mesh, tagging contact
//! surfaces and writing the solver deck.

use thiserror::Error;

/// Error types for deck building operations
///
/// Any of these aborts the whole run: node and element ids are assigned
/// sequentially across objects, so a skipped object would shift every id
/// that follows it.
#[derive(Error, Debug)]
pub enum TetDeckError {
    /// Malformed tetrahedralizer output
    ///
    /// A data row had too few fields, a field was not numeric, or the table
    /// was missing its header or trailer line.
    #[error("Parse error in {source_name} line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    /// The external tetrahedralizer failed for an object
    ///
    /// Raised when the tool cannot be spawned, exits with a non-zero status,
    /// exceeds its timeout, or does not produce the expected node and
    /// element tables.
    #[error("Tetrahedralization failed for object '{object}': {reason}")]
    TetrahedralizationFailure { object: String, reason: String },

    /// An object's tetrahedralizer tables could not be read or parsed
    #[error("Failed to import object '{object}': {source}")]
    ObjectImport {
        object: String,
        source: Box<TetDeckError>,
    },

    /// An element references a node id that has no matching record
    #[error("Index resolution error: {0}")]
    IndexResolution(String),

    /// Mesh topology is invalid
    ///
    /// For example an element that references the same node twice.
    #[error("Invalid mesh topology: {0}")]
    InvalidMeshTopology(String),

    /// File I/O error
    ///
    /// Wraps standard I/O errors from file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration error
    ///
    /// Invalid configuration file format or invalid parameter values.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The input scene is inconsistent
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// VTK file writing error
    #[error("VTK error: {0}")]
    VtkError(String),

    /// Geometric computation error
    ///
    /// Errors during geometric computations such as degenerate triangles.
    #[error("Geometry error: {0}")]
    GeometryError(String),

    /// The run was cancelled
    ///
    /// Checked between objects and while waiting on the tetrahedralizer.
    #[error("Run cancelled {0}")]
    Cancelled(String),
}

impl TetDeckError {
    /// Build a parse error for a given source and 1-based line number
    pub fn parse(source_name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        TetDeckError::Parse {
            source_name: source_name.into(),
            line,
            message: message.into(),
        }
    }

    /// Attach the name of the object being imported
    pub fn in_object(self, object: impl Into<String>) -> Self {
        TetDeckError::ObjectImport {
            object: object.into(),
            source: Box::new(self),
        }
    }
}

/// Convenience type alias for Results with [`TetDeckError`]
///
/// # Example
/// ```
/// use tetdeck::Result;
///
/// fn my_function() -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, TetDeckError>;
