/// Error Module
///
/// This module defines the error types used across sqlbridge. Low-level
/// failures are `DriverError`s; they never reach a caller directly but are
/// translated into the caller's own error kind, producing an `AccessError`.
use crate::core::db::types::SqlType;
use thiserror::Error;

/// Low-level failure raised by a driver while preparing, binding, executing,
/// reading or releasing a statement.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Errors reported by SQLite
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An argument could not be converted to its declared type
    #[error("cannot bind argument {position} as {sql_type}: {reason}")]
    Bind {
        position: usize,
        sql_type: SqlType,
        reason: String,
    },

    /// A column value could not be read as the requested type
    #[error("cannot read column {index} as {expected}: {reason}")]
    Decode {
        index: usize,
        expected: &'static str,
        reason: String,
    },

    /// Failures from other drivers
    #[error("{0}")]
    Driver(String),
}

impl DriverError {
    /// Create a generic driver error.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    pub(crate) fn decode(index: usize, expected: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode {
            index,
            expected,
            reason: reason.into(),
        }
    }

    /// An owned copy with the same text. SQLite errors are not clonable, so
    /// they are kept by message.
    pub(crate) fn detach(&self) -> Self {
        match self {
            Self::Sqlite(_) => Self::Driver(self.to_string()),
            Self::Bind {
                position,
                sql_type,
                reason,
            } => Self::Bind {
                position: *position,
                sql_type: *sql_type,
                reason: reason.clone(),
            },
            Self::Decode {
                index,
                expected,
                reason,
            } => Self::decode(*index, *expected, reason.clone()),
            Self::Driver(message) => Self::Driver(message.clone()),
        }
    }
}

/// Result alias for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Raised when an error factory cannot build the caller's error kind.
#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error("error kind `{kind}` cannot be constructed from a message alone")]
    NoMessageConstructor { kind: &'static str },

    #[error("error kind `{kind}` cannot be constructed from a message and a cause")]
    NoCauseConstructor { kind: &'static str },

    #[error("constructing error kind `{kind}` failed: {reason}")]
    Failed { kind: &'static str, reason: String },
}

/// Outcome of a failed data-access operation.
///
/// `Translated` carries the caller's own error. `Untranslated` means the
/// caller's error factory refused to build one; the failure message and the
/// driver error behind it are kept so the failure is never lost.
#[derive(Error, Debug)]
pub enum AccessError<E> {
    #[error(transparent)]
    Translated(E),

    #[error("failed to translate \"{message}\": {source}{}", caused_by(.cause))]
    Untranslated {
        message: String,
        #[source]
        source: ConstructionError,
        cause: Option<DriverError>,
    },
}

fn caused_by(cause: &Option<DriverError>) -> String {
    match cause {
        Some(cause) => format!(" (caused by: {cause})"),
        None => String::new(),
    }
}

impl<E> AccessError<E> {
    /// Returns the caller's error, if one was constructed.
    pub fn translated(&self) -> Option<&E> {
        match self {
            Self::Translated(err) => Some(err),
            Self::Untranslated { .. } => None,
        }
    }

    pub fn into_translated(self) -> Option<E> {
        match self {
            Self::Translated(err) => Some(err),
            Self::Untranslated { .. } => None,
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, Self::Translated(_))
    }

    /// The driver error behind an untranslated failure, if there was one.
    pub fn driver_cause(&self) -> Option<&DriverError> {
        match self {
            Self::Translated(_) => None,
            Self::Untranslated { cause, .. } => cause.as_ref(),
        }
    }
}

/// A query descriptor whose argument list and type-tag list disagree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("The query has {arguments} arguments but {types} argument types.")]
pub struct DescriptorError {
    pub arguments: usize,
    pub types: usize,
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration error: unknown log level '{0}'")]
    InvalidLevel(String),
}
