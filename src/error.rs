//! Error type shared by the store, the checkpoint subsystem and the CLI.

use rusqlite::ErrorCode;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a restore transaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionFailure {
    /// database busy, locked, unreadable or otherwise not reachable
    Unavailable,
    /// a constraint (foreign key, unique, not null) rejected a statement
    ConstraintViolation,
    Other,
}

impl TransactionFailure {
    pub fn classify(err: &rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => TransactionFailure::ConstraintViolation,
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::ReadOnly
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt,
            ) => TransactionFailure::Unavailable,
            _ => TransactionFailure::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionFailure::Unavailable => "store unavailable",
            TransactionFailure::ConstraintViolation => "constraint violation",
            TransactionFailure::Other => "statement failed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("checkpoint name must not be empty")]
    EmptyName,

    #[error("checkpoint '{0}' not found")]
    NotFound(String),

    #[error("checkpoint '{0}' already exists")]
    DuplicateName(String),

    #[error("cannot serialize {table}: {reason}")]
    Serialization { table: &'static str, reason: String },

    #[error("checkpoint '{name}' is corrupt: {reason}")]
    CorruptCheckpoint { name: String, reason: String },

    #[error("{table} row '{key}' references {parent_table} '{parent_key}' which is not in the checkpoint")]
    ReferentialViolation {
        table: &'static str,
        key: String,
        parent_table: &'static str,
        parent_key: String,
    },

    #[error("restore of '{name}' rolled back ({}): {source}", .kind.as_str())]
    Transaction {
        name: String,
        kind: TransactionFailure,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{table} '{key}' not found")]
    RecordNotFound { table: &'static str, key: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn transaction(name: &str, source: rusqlite::Error) -> Self {
        Error::Transaction {
            name: name.to_string(),
            kind: TransactionFailure::classify(&source),
            source,
        }
    }
}
