/*!
 * Error types for the transapi library.
 *
 * This module contains the error taxonomy shared by the data store, the XLIFF
 * codec and the import/export pipeline, using the thiserror crate for
 * ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur in the data store, the codec or the pipeline
#[derive(Error, Debug)]
pub enum StoreError {
    /// A domain, string, translation or language does not exist
    #[error("{entity} '{key}' not found")]
    NotFound {
        /// Kind of entity that was looked up
        entity: &'static str,
        /// Name or code used for the lookup
        key: String,
    },

    /// The entity was found by a proactive probe before inserting it
    #[error("{entity} '{key}' already exists")]
    AlreadyExists {
        /// Kind of entity that was being created
        entity: &'static str,
        /// Name or code of the existing entity
        key: String,
    },

    /// The backend rejected a row because of a uniqueness constraint
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Malformed input: bad file name, language mismatch, bad request data
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unexpected failure reported by the SQL engine
    #[error("Storage error: {0}")]
    Storage(String),

    /// Misconfiguration such as an unknown database driver
    #[error("Configuration error: {0}")]
    Config(String),

    /// The schema version table holds more than one row
    #[error("too many rows in schema_migrations table ({0})")]
    CorruptVersionTable(i64),

    /// Error from a file operation
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// An XLIFF document could not be read or written
    #[error("XLIFF error: {0}")]
    Xml(String),
}

impl StoreError {
    /// Shorthand for a `NotFound` error
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Whether the error means that a row was absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status an API layer should answer with for this error
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::AlreadyExists { .. } | Self::UniqueViolation(_) => 409,
            Self::Validation(_) | Self::Xml(_) => 400,
            Self::Storage(_) | Self::Config(_) | Self::CorruptVersionTable(_) | Self::Io(_) => 500,
        }
    }

    /// Message safe to hand to API clients.
    ///
    /// Not-found errors never carry detail. Every other variant still passes its
    /// message through, including driver text.
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound { .. } => "not found".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, message) = &error {
            // SQLITE_CONSTRAINT_UNIQUE and SQLITE_CONSTRAINT_PRIMARYKEY
            if code.extended_code == 2067 || code.extended_code == 1555 {
                return Self::UniqueViolation(
                    message.clone().unwrap_or_else(|| error.to_string()),
                );
            }
        }
        Self::Storage(error.to_string())
    }
}

impl From<postgres::Error> for StoreError {
    fn from(error: postgres::Error) -> Self {
        if error.code() == Some(&postgres::error::SqlState::UNIQUE_VIOLATION) {
            return Self::UniqueViolation(error.to_string());
        }
        Self::Storage(error.to_string())
    }
}

impl From<quick_xml::Error> for StoreError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<quick_xml::DeError> for StoreError {
    fn from(error: quick_xml::DeError) -> Self {
        Self::Xml(error.to_string())
    }
}

/// A migration run stopped before reaching its target version
#[derive(Error, Debug)]
#[error("migration stopped at version {version}: {source}")]
pub struct MigrationFailure {
    /// Last version that was successfully reached
    pub version: i64,
    /// The error that stopped the run
    #[source]
    pub source: StoreError,
}

/// A directory import stopped at a failing file
#[derive(Error, Debug)]
#[error("import stopped after {processed} file(s): {source}")]
pub struct ImportFailure {
    /// Number of files imported before the failure
    pub processed: usize,
    /// The decode or import error for the failing file
    #[source]
    pub source: StoreError,
}

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;
