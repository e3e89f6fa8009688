//! Error types for the relayout library.

use std::io;
use thiserror::Error;

/// Result type alias for relayout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout reconstruction.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The source document could not be opened at all.
    ///
    /// This is the only failure that aborts a whole run.
    #[error("Cannot open document: {0}")]
    DocumentOpen(String),

    /// A single page could not be loaded or rendered.
    #[error("Page {page} failed to load: {reason}")]
    PageLoad {
        /// 1-indexed page number
        page: u32,
        /// Collaborator-provided reason
        reason: String,
    },

    /// The OCR engine failed for a page.
    #[error("OCR engine error: {0}")]
    Ocr(String),

    /// A box is degenerate or outside the page.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// The run was cancelled before every page committed.
    #[error("Run cancelled after {completed} of {total} pages")]
    Cancelled {
        /// Pages that committed before cancellation
        completed: usize,
        /// Pages submitted to the run
        total: usize,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
