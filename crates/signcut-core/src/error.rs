//! Error handling for SignCut
//!
//! Error types for each stage of the CAM pipeline:
//! - Import errors (SVG markup the engine cannot read at all)
//! - Packing errors (invalid sheet parameters)
//! - Emission errors (toolpaths that must not become G-code)
//!
//! Recoverable conditions such as an empty import or a part that fits no
//! sheet are reported through result structs, not through these types.

use thiserror::Error;

/// Import error type
///
/// Raised only when the input violates the caller contract, e.g. text that
/// is not SVG markup at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    /// Input does not contain an `<svg>` root element
    #[error("Input is not an SVG document")]
    NotSvg,

    /// Attribute value could not be interpreted
    #[error("Invalid attribute '{attribute}': {reason}")]
    InvalidAttribute {
        /// The attribute name.
        attribute: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Packing error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PackError {
    /// Sheet dimensions are not usable
    #[error("Invalid sheet size {width}x{height}: dimensions must be positive and finite")]
    InvalidSheet {
        /// Requested sheet width in mm.
        width: f64,
        /// Requested sheet height in mm.
        height: f64,
    },

    /// Gap is negative or not finite
    #[error("Invalid gap {gap}: must be zero or positive")]
    InvalidGap {
        /// Requested gap in mm.
        gap: f64,
    },

    /// A sheet id was requested that the layout does not contain
    #[error("Sheet {sheet_id} not found")]
    SheetNotFound {
        /// The missing sheet id.
        sheet_id: u32,
    },
}

/// Emission error type
///
/// Any of these aborts G-code generation before a single line is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    /// No operations to emit
    #[error("Toolpath is empty, nothing to emit")]
    EmptyToolpath,

    /// An operation carries NaN or infinite coordinates
    #[error("Non-finite coordinate in operation {index}")]
    NonFiniteCoordinate {
        /// Index of the offending operation.
        index: usize,
    },
}

/// Main error type for SignCut
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Import error
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Packing error
    #[error(transparent)]
    Pack(#[from] PackError),

    /// Emission error
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Work stopped at a cancellation checkpoint
    #[error("Operation cancelled: {reason}")]
    Cancelled {
        /// What triggered the cancellation.
        reason: String,
    },

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if work was stopped by a cancellation checkpoint
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// Check if this is an emission error
    pub fn is_emit_error(&self) -> bool {
        matches!(self, Error::Emit(_))
    }

    /// Check if this is an import error
    pub fn is_import_error(&self) -> bool {
        matches!(self, Error::Import(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
