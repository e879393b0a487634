use crate::{query::QueryError, store::StoreError};
use std::{fmt, time::Duration};
use thiserror::Error as ThisError;

///
/// Error
///
/// Public error surface for repository operations.
/// Storage errors are carried unmodified so callers can match on engine
/// conditions such as unique-key violations.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Config(_) => ErrorClass::Configuration,
            Self::Query(_) => ErrorClass::InvalidInput,
            Self::Store(err) => err.class(),
            Self::Serialize(_) => ErrorClass::Internal,
            Self::Timeout(_) => ErrorClass::Timeout,
        }
    }

    /// Whether the underlying engine rejected a write on a unique index.
    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::Store(StoreError::DuplicateKey { .. }))
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

///
/// ErrorClass
///
/// Coarse classification used for logging and caller-side retry policy.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    Conflict,
    Internal,
    InvalidInput,
    Timeout,
    Unavailable,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
            Self::InvalidInput => "invalid_input",
            Self::Timeout => "timeout",
            Self::Unavailable => "unavailable",
        };

        write!(f, "{label}")
    }
}

///
/// ConfigError
///
/// Raised while resolving entity metadata or validating options.
/// These are programming or deployment mistakes and fail fast.
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("entity '{entity}' declares no identifier field")]
    MissingIdentifier { entity: &'static str },

    #[error("entity '{entity}' declares more than one expiry field ('{first}', '{second}')")]
    MultipleExpiryFields {
        entity: &'static str,
        first: String,
        second: String,
    },

    #[error("index '{index}' on entity '{entity}' has an invalid partial filter: {source}")]
    InvalidPartialFilter {
        entity: &'static str,
        index: String,
        source: QueryError,
    },

    #[error("class-level index '{index}' on entity '{entity}' names an empty field path")]
    EmptyIndexPath { entity: &'static str, index: String },

    #[error("invalid option '{option}': {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },
}
