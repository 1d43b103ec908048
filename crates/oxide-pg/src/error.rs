//! Error types for the PostgreSQL dialect.

use crate::field::FieldKind;
use crate::hstore::HstoreError;

/// Errors that can occur while mapping fields to PostgreSQL.
#[derive(Debug, thiserror::Error)]
pub enum DialectError {
    /// No column type rule matched the field.
    #[error("invalid sql type {type_name} ({kind}) for postgres")]
    UnresolvedType {
        /// Runtime type name of the field value.
        type_name: String,
        /// Kind the field was classified as.
        kind: FieldKind,
    },

    /// A field kind name could not be parsed.
    #[error("unknown field kind '{0}'")]
    UnknownKind(String),

    /// An hstore literal could not be parsed.
    #[error("hstore error: {0}")]
    Hstore(#[from] HstoreError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for dialect operations.
pub type Result<T> = std::result::Result<T, DialectError>;
