//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Text could not be parsed as STF
    #[error("parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    /// JSON value could not be turned into a document
    #[error("invalid JSON at `{path}`: {message}")]
    Json { path: String, message: String },

    /// Transparent wrapper for [`vox_tbf::Error`]
    #[error(transparent)]
    Tag(#[from] vox_tbf::Error),
}

impl Error {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn json(path: &str, message: impl Into<String>) -> Self {
        Error::Json {
            path: path.to_owned(),
            message: message.into(),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
