//! Error types for Word to PowerPoint conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a document into a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The source document is unreadable, malformed, or has no usable paragraphs.
    #[error("Document parsing error: {0}")]
    DocumentParseError(String),

    /// The template is missing, unreadable, or has no usable layouts.
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Preview generation failed. Never fatal for a conversion.
    #[error("Preview rendering error: {0}")]
    RenderError(String),

    /// Failed to serialize a deck or result.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
