//! PostgreSQL dialect for the oxide ORM.
//!
//! `oxide-pg` is what the ORM layer consults whenever it needs to speak
//! PostgreSQL:
//!
//! - **Type inference** - Maps a [`FieldDescriptor`](field::FieldDescriptor)
//!   to a column type such as `bigserial`, `varchar(64)` or `hstore`
//! - **Introspection** - Asks the system catalog whether tables, columns,
//!   indexes and foreign keys exist
//! - **Bind variables** - Formats `$1`, `$2`, ... placeholders
//! - **Hstore** - Encodes and decodes the `hstore` key/value column type
//!
//! Query building, transactions, pooling and migration planning are left to
//! the ORM and to `sqlx`.
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_pg::prelude::*;
//!
//! let dialect = PostgresDialect::new();
//!
//! let mut id = FieldDescriptor::of::<i64>("id").primary_key();
//! assert_eq!(dialect.data_type_of(&mut id)?, "bigserial");
//! assert!(id.is_auto_increment());
//!
//! let tags = TagSettings::parse("size:150;not null;unique");
//! let mut username = FieldDescriptor::of::<String>("username").with_tags(&tags);
//! assert_eq!(dialect.data_type_of(&mut username)?, "varchar(150) NOT NULL UNIQUE");
//!
//! assert_eq!(dialect.bind_var(3), "$3");
//! ```
//!
//! With a pool attached the dialect also answers schema questions:
//!
//! ```rust,ignore
//! let pool = PgPool::connect("postgres://localhost/app").await?;
//! let dialect = PostgresDialect::with_connection(pool);
//!
//! if !dialect.has_column("users", "email").await {
//!     // ALTER TABLE users ADD COLUMN ...
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Column type for a field
//! oxide-pg infer --kind u64 --primary-key
//!
//! # Check the live schema
//! oxide-pg --database postgres://localhost/app probe table users
//! ```

pub mod bind;
pub mod dialect;
pub mod error;
pub mod field;
pub mod hstore;
pub mod infer;
pub mod introspect;
pub mod shape;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::bind::bind_var;
    pub use crate::dialect::{Dialect, PostgresDialect};
    pub use crate::error::{DialectError, Result};
    pub use crate::field::{FieldDescriptor, FieldKind, FieldType, TagSettings};
    pub use crate::hstore::{Hstore, HstoreError};
    pub use crate::infer::{infer_type, InferredType, SideEffects};
    pub use crate::introspect::CatalogConnection;
    pub use crate::shape::{ElementType, ValueShape};
}
