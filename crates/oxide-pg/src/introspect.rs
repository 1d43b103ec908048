//! Schema introspection probes.
//!
//! Each probe asks the PostgreSQL system catalog whether a schema object
//! exists. Probes are best-effort: a failing query is logged and reported as
//! "does not exist", since callers only use them to decide which DDL to emit.

use sqlx::PgPool;
use tracing::debug;

/// Counts indexes with a given table and index name.
pub const HAS_INDEX_SQL: &str =
    "SELECT count(*) FROM pg_indexes WHERE tablename = $1 AND indexname = $2";

/// Counts foreign key constraints with a given name on a table.
pub const HAS_FOREIGN_KEY_SQL: &str = r#"
SELECT count(con.conname)
FROM   pg_constraint con
WHERE  $1::regclass::oid = con.conrelid
       AND con.conname = $2
       AND con.contype = 'f'
"#;

/// Counts base tables with a given name.
pub const HAS_TABLE_SQL: &str = r#"
SELECT count(*)
FROM   information_schema.tables
WHERE  table_name = $1
       AND table_type = 'BASE TABLE'
"#;

/// Counts columns with a given table and column name.
pub const HAS_COLUMN_SQL: &str = r#"
SELECT count(*)
FROM   information_schema.columns
WHERE  table_name = $1
       AND column_name = $2
"#;

/// Returns the database the connection is bound to.
pub const CURRENT_DATABASE_SQL: &str = "SELECT CURRENT_DATABASE()";

/// A connection that can run catalog queries.
#[allow(async_fn_in_trait)]
pub trait CatalogConnection: Send + Sync {
    /// Runs a query returning a single count, binding `args` as text in order.
    async fn fetch_count(&self, sql: &str, args: &[&str]) -> Result<i64, sqlx::Error>;

    /// Runs a query returning a single text value.
    async fn fetch_text(&self, sql: &str) -> Result<String, sqlx::Error>;
}

impl CatalogConnection for PgPool {
    async fn fetch_count(&self, sql: &str, args: &[&str]) -> Result<i64, sqlx::Error> {
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        for arg in args {
            query = query.bind(*arg);
        }
        query.fetch_one(self).await
    }

    async fn fetch_text(&self, sql: &str) -> Result<String, sqlx::Error> {
        sqlx::query_scalar::<_, String>(sql).fetch_one(self).await
    }
}

/// Returns whether `table` has an index named `index`.
pub async fn has_index<C: CatalogConnection>(conn: &C, table: &str, index: &str) -> bool {
    probe_count(conn, HAS_INDEX_SQL, &[table, index]).await > 0
}

/// Returns whether `table` has a foreign key constraint named `name`.
///
/// A table that does not exist makes the `regclass` cast fail, which is
/// reported as `false` like any other probe failure.
pub async fn has_foreign_key<C: CatalogConnection>(conn: &C, table: &str, name: &str) -> bool {
    probe_count(conn, HAS_FOREIGN_KEY_SQL, &[table, name]).await > 0
}

/// Returns whether a base table named `table` exists.
pub async fn has_table<C: CatalogConnection>(conn: &C, table: &str) -> bool {
    probe_count(conn, HAS_TABLE_SQL, &[table]).await > 0
}

/// Returns whether `table` has a column named `column`.
pub async fn has_column<C: CatalogConnection>(conn: &C, table: &str, column: &str) -> bool {
    probe_count(conn, HAS_COLUMN_SQL, &[table, column]).await > 0
}

/// Returns the name of the current database, or an empty string if the
/// query fails.
pub async fn current_database<C: CatalogConnection>(conn: &C) -> String {
    match conn.fetch_text(CURRENT_DATABASE_SQL).await {
        Ok(name) => name,
        Err(err) => {
            debug!(error = %err, "current database probe failed");
            String::new()
        }
    }
}

async fn probe_count<C: CatalogConnection>(conn: &C, sql: &str, args: &[&str]) -> i64 {
    match conn.fetch_count(sql, args).await {
        Ok(count) => count,
        Err(err) => {
            debug!(error = %err, ?args, "catalog probe failed, treating as absent");
            0
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory catalog for probe tests.

    use super::*;

    /// A scripted catalog answering the probe queries from plain lists.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryCatalog {
        pub database: String,
        pub tables: Vec<&'static str>,
        pub columns: Vec<(&'static str, &'static str)>,
        pub indexes: Vec<(&'static str, &'static str)>,
        pub foreign_keys: Vec<(&'static str, &'static str)>,
        pub broken: bool,
    }

    impl MemoryCatalog {
        pub(crate) fn broken() -> Self {
            Self {
                broken: true,
                ..Self::default()
            }
        }

        fn has_relation(&self, name: &str) -> bool {
            self.tables.iter().any(|table| *table == name)
        }

        fn count_pairs(pairs: &[(&str, &str)], args: &[&str]) -> i64 {
            let n = pairs
                .iter()
                .filter(|(a, b)| args == [*a, *b].as_slice())
                .count();
            i64::try_from(n).unwrap_or(i64::MAX)
        }
    }

    impl CatalogConnection for MemoryCatalog {
        async fn fetch_count(&self, sql: &str, args: &[&str]) -> Result<i64, sqlx::Error> {
            if self.broken {
                return Err(sqlx::Error::PoolClosed);
            }
            let count = match sql {
                HAS_INDEX_SQL => Self::count_pairs(&self.indexes, args),
                HAS_COLUMN_SQL => Self::count_pairs(&self.columns, args),
                HAS_FOREIGN_KEY_SQL => {
                    // Mirrors the regclass cast failing for unknown relations.
                    if !self.has_relation(args[0]) {
                        return Err(sqlx::Error::Protocol(format!(
                            "relation \"{}\" does not exist",
                            args[0]
                        )));
                    }
                    Self::count_pairs(&self.foreign_keys, args)
                }
                HAS_TABLE_SQL => i64::from(self.has_relation(args[0])),
                other => return Err(sqlx::Error::Protocol(format!("unexpected query: {other}"))),
            };
            Ok(count)
        }

        async fn fetch_text(&self, sql: &str) -> Result<String, sqlx::Error> {
            if self.broken || sql != CURRENT_DATABASE_SQL {
                return Err(sqlx::Error::PoolClosed);
            }
            Ok(self.database.clone())
        }
    }
}
