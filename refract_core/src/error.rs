//! Error types for refract_core.

use crate::locale::LocaleError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using refract_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or resolving content.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred while reading an export or writing output.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON could not be parsed or produced.
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// An entry names a content type the schema index does not know.
    #[error("Content type not found: {content_type} (referenced by entry {entry})")]
    SchemaNotFound { content_type: String, entry: String },

    /// An entry carries a field its content type does not declare.
    #[error("Unknown field {field} on entry {entry} (content type {content_type})")]
    UnknownField {
        entry: String,
        content_type: String,
        field: String,
    },

    /// The locale selector could not produce a value for a field.
    #[error("Locale resolution failed for field {field} of {record}: {source}")]
    LocaleResolution {
        record: String,
        field: String,
        #[source]
        source: LocaleError,
    },

    /// A record is malformed (missing id, kind or content type).
    #[error("Invalid record: {reason}")]
    InvalidRecord { reason: String },

    /// A rich text node is malformed.
    #[error("Invalid rich text node: {reason}")]
    InvalidNode { reason: String },

    /// A content export could not be loaded.
    #[error("Invalid export at {path}: {reason}")]
    InvalidExport { path: PathBuf, reason: String },

    /// Settings are malformed or incomplete.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Create a SchemaNotFound error.
    pub fn schema_not_found(content_type: impl Into<String>, entry: impl Into<String>) -> Self {
        Error::SchemaNotFound {
            content_type: content_type.into(),
            entry: entry.into(),
        }
    }

    /// Create an UnknownField error.
    pub fn unknown_field(
        entry: impl Into<String>,
        content_type: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Error::UnknownField {
            entry: entry.into(),
            content_type: content_type.into(),
            field: field.into(),
        }
    }

    /// Create a LocaleResolution error.
    pub fn locale_resolution(
        record: impl Into<String>,
        field: impl Into<String>,
        source: LocaleError,
    ) -> Self {
        Error::LocaleResolution {
            record: record.into(),
            field: field.into(),
            source,
        }
    }

    /// Create an InvalidRecord error.
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Error::InvalidRecord {
            reason: reason.into(),
        }
    }

    /// Create an InvalidNode error.
    pub fn invalid_node(reason: impl Into<String>) -> Self {
        Error::InvalidNode {
            reason: reason.into(),
        }
    }

    /// Create an InvalidExport error.
    pub fn invalid_export(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidExport {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // ignore::Error can wrap an io::Error or be a path error
        match err.io_error() {
            Some(io_err) => Error::Io {
                source: std::io::Error::new(io_err.kind(), io_err.to_string()),
            },
            None => Error::Io {
                source: std::io::Error::other(err.to_string()),
            },
        }
    }
}
