//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Input ended inside the field being decoded
    #[error("unexpected end of input at byte {0}")]
    Truncated(usize),

    /// Variant id outside 0..=12
    #[error("unknown tag variant {0:#04x}")]
    UnknownVariant(u8),

    /// String payload is not valid UTF-8
    #[error("invalid UTF-8 in string at byte {0}")]
    InvalidString(usize),

    /// Negative length prefix
    #[error("negative length {0}")]
    InvalidLength(i32),

    /// String longer than the unsigned 16-bit prefix allows
    #[error("string of {0} bytes exceeds the 65535-byte wire limit")]
    StringTooLong(usize),

    /// Sequence longer than the signed 32-bit prefix allows
    #[error("sequence of {0} elements exceeds the signed 32-bit wire limit")]
    LengthOverflow(usize),

    /// A path segment addressed a missing parent
    #[error("no tag at path `{0}`")]
    InvalidPath(String),

    /// Numeric segment beyond the end of a list
    #[error("list index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A segment addressed a tag of the wrong variant
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Payload variant differs from the list's declared element id
    #[error("list of {expected} cannot hold {found}")]
    ListTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Value outside the range of the requested variant
    #[error("value {value} does not fit a {variant}")]
    NumericOutOfRange {
        value: i64,
        variant: &'static str,
    },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
