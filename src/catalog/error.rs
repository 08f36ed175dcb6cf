//! Catalog error types

use std::path::PathBuf;
use thiserror::Error;

use super::entry::Key;

/// What a failed lookup was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Position(usize),
    Key(Key),
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookup::Position(pos) => write!(f, "position {}", pos),
            Lookup::Key(key) => write!(f, "key {}", key),
        }
    }
}

/// Reasons a catalog line can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unknown comment type")]
    UnknownComment,

    #[error("unknown field name")]
    UnknownField,

    #[error("malformed translation index")]
    MalformedPluralIndex,

    #[error("expected string continuation")]
    UnexpectedContinuation,

    #[error("malformed quoted string")]
    MalformedString,

    #[error("translation field cannot carry a previous value")]
    PreviousTranslation,

    #[error("unterminated entry at end of input")]
    UnterminatedEntry,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} at {file}:{line}")]
    Parse {
        file: String,
        line: usize,
        kind: ParseErrorKind,
    },

    #[error("no entry at {0}")]
    NotFound(Lookup),

    #[error("cannot add an entry with empty original text")]
    EmptyOriginal,

    #[error("catalog file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
