//! PostgreSQL dialect.

use tracing::debug;

use super::Dialect;
use crate::bind::bind_var;
use crate::error::Result;
use crate::field::FieldDescriptor;
use crate::infer::infer_type;
use crate::introspect::{self, CatalogConnection};

/// PostgreSQL dialect.
///
/// Type mapping and placeholders need no connection; the schema probes are
/// available once a [`CatalogConnection`] is attached.
///
/// ```rust,ignore
/// let dialect = PostgresDialect::with_connection(pool);
/// if !dialect.has_table("users").await {
///     // emit CREATE TABLE
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect<C = ()> {
    conn: C,
}

impl PostgresDialect {
    /// Creates a dialect without a connection.
    #[must_use]
    pub const fn new() -> Self {
        Self { conn: () }
    }
}

impl<C> PostgresDialect<C> {
    /// Creates a dialect that probes the schema through `conn`.
    #[must_use]
    pub fn with_connection(conn: C) -> Self {
        Self { conn }
    }

    /// Returns the connection.
    #[must_use]
    pub const fn connection(&self) -> &C {
        &self.conn
    }
}

impl<C: CatalogConnection> PostgresDialect<C> {
    /// Returns whether `table` has an index named `index`.
    pub async fn has_index(&self, table: &str, index: &str) -> bool {
        introspect::has_index(&self.conn, table, index).await
    }

    /// Returns whether `table` has a foreign key constraint named `name`.
    pub async fn has_foreign_key(&self, table: &str, name: &str) -> bool {
        introspect::has_foreign_key(&self.conn, table, name).await
    }

    /// Returns whether a base table named `table` exists.
    pub async fn has_table(&self, table: &str) -> bool {
        introspect::has_table(&self.conn, table).await
    }

    /// Returns whether `table` has a column named `column`.
    pub async fn has_column(&self, table: &str, column: &str) -> bool {
        introspect::has_column(&self.conn, table, column).await
    }

    /// Returns the name of the current database.
    pub async fn current_database(&self) -> String {
        introspect::current_database(&self.conn).await
    }
}

impl<C: Send + Sync> Dialect for PostgresDialect<C> {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn bind_var(&self, position: usize) -> String {
        bind_var(position)
    }

    fn data_type_of(&self, field: &mut FieldDescriptor) -> Result<String> {
        let inferred = infer_type(field)?;
        inferred.apply(field);
        debug!(field = field.name(), sql_type = %inferred, "inferred column type");
        Ok(inferred.sql_type)
    }

    fn last_insert_id_returning_suffix(&self, table: &str, key: &str) -> String {
        format!("RETURNING {table}.{key}")
    }

    fn supports_last_insert_id(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DialectError;
    use crate::field::{FieldKind, TagSettings, AUTO_INCREMENT};
    use crate::hstore::Hstore;
    use crate::introspect::testing::MemoryCatalog;

    fn dialect() -> PostgresDialect {
        PostgresDialect::new()
    }

    #[test]
    fn test_name() {
        assert_eq!(dialect().name(), "postgres");
    }

    #[test]
    fn test_bind_var() {
        let d = dialect();
        assert_eq!(d.bind_var(1), "$1");
        assert_eq!(d.bind_var(12), "$12");
    }

    #[test]
    fn test_data_type_of_sets_auto_increment() {
        let mut field = FieldDescriptor::of::<i64>("id").primary_key();
        assert_eq!(dialect().data_type_of(&mut field).unwrap(), "bigserial");
        assert_eq!(field.tag_settings().get(AUTO_INCREMENT), Some(AUTO_INCREMENT));
    }

    #[test]
    fn test_data_type_of_is_idempotent() {
        let d = dialect();
        let mut field = FieldDescriptor::of::<u32>("id").primary_key();
        let first = d.data_type_of(&mut field).unwrap();
        let second = d.data_type_of(&mut field).unwrap();
        assert_eq!(first, "serial");
        assert_eq!(first, second);
    }

    #[test]
    fn test_data_type_of_scenarios() {
        let d = dialect();

        let mut field = FieldDescriptor::new("count", FieldKind::UInt32);
        assert_eq!(d.data_type_of(&mut field).unwrap(), "integer");
        assert!(field.tag_settings().is_empty());

        let mut field = FieldDescriptor::of::<f64>("price").additional_type("NOT NULL");
        assert_eq!(d.data_type_of(&mut field).unwrap(), "numeric NOT NULL");

        let mut field = FieldDescriptor::of::<Vec<u8>>("avatar");
        assert_eq!(d.data_type_of(&mut field).unwrap(), "bytea");

        let mut field =
            FieldDescriptor::new("token", FieldKind::FixedBytes16).runtime_type_name("UUID");
        assert_eq!(d.data_type_of(&mut field).unwrap(), "uuid");

        let mut field = FieldDescriptor::of::<Hstore>("attributes");
        assert_eq!(d.data_type_of(&mut field).unwrap(), "hstore");
    }

    #[test]
    fn test_data_type_of_from_tags() {
        let tags = TagSettings::parse("size:64;not null;unique");
        let mut field = FieldDescriptor::of::<String>("username").with_tags(&tags);
        assert_eq!(
            dialect().data_type_of(&mut field).unwrap(),
            "varchar(64) NOT NULL UNIQUE"
        );
    }

    #[test]
    fn test_data_type_of_unresolved_leaves_tags() {
        let mut field = FieldDescriptor::new("shape", FieldKind::Other)
            .runtime_type_name("Polygon")
            .primary_key();
        let err = dialect().data_type_of(&mut field).unwrap_err();
        assert!(matches!(err, DialectError::UnresolvedType { .. }));
        assert!(!field.is_auto_increment());
    }

    #[test]
    fn test_quote_identifier() {
        let d = dialect();
        assert_eq!(d.quote_identifier("users"), "\"users\"");
        assert_eq!(d.quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_last_insert_id() {
        let d = dialect();
        assert!(!d.supports_last_insert_id());
        assert_eq!(
            d.last_insert_id_returning_suffix("users", "id"),
            "RETURNING users.id"
        );
    }

    #[tokio::test]
    async fn test_probes_through_connection() {
        let d = PostgresDialect::with_connection(MemoryCatalog {
            database: "app".to_string(),
            tables: vec!["users", "posts"],
            columns: vec![("posts", "author_id")],
            indexes: vec![("posts", "idx_posts_author")],
            foreign_keys: vec![("posts", "fk_posts_author")],
            broken: false,
        });

        assert!(d.has_table("users").await);
        assert!(!d.has_table("comments").await);
        assert!(d.has_column("posts", "author_id").await);
        assert!(d.has_index("posts", "idx_posts_author").await);
        assert!(d.has_foreign_key("posts", "fk_posts_author").await);
        assert_eq!(d.current_database().await, "app");
    }

    #[tokio::test]
    async fn test_probe_failure_is_not_found() {
        let d = PostgresDialect::with_connection(MemoryCatalog::broken());
        assert!(!d.has_table("users").await);
        assert_eq!(d.current_database().await, "");
    }
}
