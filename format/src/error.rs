//! Error types for codec operations.
//!
//! Every failure is an [`Error`]: an [`ErrorKind`] describing what went wrong plus the path of
//! record fields (or tags) the failure crossed on its way out. Paths are stored innermost first
//! and rendered outermost first:
//!
//! ```
//! use commonware_format::{Error, ErrorKind};
//!
//! let err = Error::from(ErrorKind::Invalid("Bcd", "non-decimal nibble".into()))
//!     .in_field("inner")
//!     .in_field("outer");
//! assert_eq!(err.to_string(), "field [outer.inner]: invalid Bcd: non-decimal nibble");
//! ```

use crate::charset::Charset;
use std::fmt;
use thiserror::Error;

/// Result type for codec operations.
pub type Result<T> = core::result::Result<T, Error>;

/// What went wrong, independent of where.
#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    EndOfBuffer { needed: usize, remaining: usize },
    #[error("end of stream: read {read} of {requested} {unit}")]
    EndOfStream {
        unit: &'static str,
        read: usize,
        requested: usize,
    },
    #[error("end of stream inside a {0} sequence")]
    Truncated(Charset),
    #[error("malformed {charset} input at byte {offset}")]
    Malformed { charset: Charset, offset: usize },
    #[error("character {ch:?} cannot be encoded as {charset}")]
    Unmappable { charset: Charset, ch: char },
    #[error("invalid {0}: {1}")]
    Invalid(&'static str, String),
    #[error("invalid length: found {found}, expected {expected}")]
    InvalidLength { found: usize, expected: usize },
    #[error("length {0} out of range")]
    LengthOutOfRange(usize),
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
    #[error("no codec registered for {0}")]
    Unregistered(String),
    #[error("{0} yielded no instance")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A codec failure annotated with the fields it propagated through.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    /// Field names, innermost first.
    path: Vec<String>,
}

impl Error {
    /// Wraps an arbitrary failure (e.g. from a caller-supplied function).
    pub fn other(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ErrorKind::Other {
            message: message.into(),
            source: source.into(),
        }
        .into()
    }

    /// Records that this error crossed the boundary of field `name`.
    ///
    /// Each call adds a name outside of those already present.
    pub fn in_field(mut self, name: impl Into<String>) -> Self {
        self.path.push(name.into());
        self
    }

    /// The failure itself.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Field names, innermost first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Consumes the error, returning its kind.
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: Vec::new(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.kind);
        }
        f.write_str("field [")?;
        for (i, name) in self.path.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(name)?;
        }
        write!(f, "]: {}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}
