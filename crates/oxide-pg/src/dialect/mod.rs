//! Database dialect implementations.
//!
//! A dialect is what the ORM holds for each target database: it turns field
//! descriptors into column types, formats placeholders and quotes names.

mod postgres;

pub use postgres::PostgresDialect;

use crate::error::Result;
use crate::field::FieldDescriptor;

/// Trait for database-specific behavior the ORM relies on.
pub trait Dialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the placeholder for a 1-based parameter position.
    fn bind_var(&self, position: usize) -> String;

    /// Returns the column type for a field.
    ///
    /// Side effects of inference (the auto-increment tag) are applied to the
    /// descriptor, so calling this again yields the same type.
    fn data_type_of(&self, field: &mut FieldDescriptor) -> Result<String>;

    /// Quote an identifier (table name, column name, etc.).
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Returns the clause appended to an INSERT to read back the new key,
    /// for dialects without a last-insert-id API.
    fn last_insert_id_returning_suffix(&self, table: &str, key: &str) -> String;

    /// Returns whether the driver reports the last inserted id directly.
    fn supports_last_insert_id(&self) -> bool;
}
