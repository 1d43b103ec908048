//! Probes against a real PostgreSQL server.
//!
//! These tests only run when `OXIDE_PG_TEST_URL` points at a database the
//! test may create and drop tables in; otherwise they return immediately.

use oxide_pg::prelude::*;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("OXIDE_PG_TEST_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to OXIDE_PG_TEST_URL");
    Some(pool)
}

fn table_name(prefix: &str) -> String {
    format!("{prefix}_{}", std::process::id())
}

#[tokio::test]
async fn test_schema_probes() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let authors = table_name("oxide_pg_authors");
    let books = table_name("oxide_pg_books");
    let index = format!("idx_{books}_title");
    let fk = format!("fk_{books}_author");

    for sql in [
        format!("CREATE TABLE {authors} (id bigserial PRIMARY KEY, name text NOT NULL)"),
        format!(
            "CREATE TABLE {books} (id serial PRIMARY KEY, author_id bigint, title varchar(200), \
             CONSTRAINT {fk} FOREIGN KEY (author_id) REFERENCES {authors} (id))"
        ),
        format!("CREATE INDEX {index} ON {books} (title)"),
    ] {
        sqlx::query(&sql).execute(&pool).await.unwrap();
    }

    let dialect = PostgresDialect::with_connection(pool.clone());

    assert!(dialect.has_table(&authors).await);
    assert!(!dialect.has_table("oxide_pg_missing_table").await);
    assert!(dialect.has_column(&books, "title").await);
    assert!(!dialect.has_column(&books, "isbn").await);
    assert!(dialect.has_index(&books, &index).await);
    assert!(!dialect.has_index(&authors, &index).await);
    assert!(dialect.has_foreign_key(&books, &fk).await);
    assert!(!dialect.has_foreign_key(&authors, &fk).await);
    // The regclass cast fails for unknown tables; the probe reports absence.
    assert!(!dialect.has_foreign_key("oxide_pg_missing_table", &fk).await);

    let expected: (String,) = sqlx::query_as("SELECT current_database()::text")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(dialect.current_database().await, expected.0);

    sqlx::query(&format!("DROP TABLE {books}, {authors}"))
        .execute(&pool)
        .await
        .unwrap();
    assert!(!dialect.has_table(&authors).await);
}

#[tokio::test]
async fn test_hstore_column_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };
    if sqlx::query("CREATE EXTENSION IF NOT EXISTS hstore")
        .execute(&pool)
        .await
        .is_err()
    {
        return;
    }

    let table = table_name("oxide_pg_hstore");
    sqlx::query(&format!("CREATE TABLE {table} (id int PRIMARY KEY, attrs hstore)"))
        .execute(&pool)
        .await
        .unwrap();

    let attrs: Hstore = [
        ("color", Some("red".to_string())),
        ("note", Some("say \"hi\"".to_string())),
        ("size", None),
    ]
    .into_iter()
    .collect();
    let insert = format!("INSERT INTO {table} (id, attrs) VALUES ($1, $2)");

    sqlx::query(&insert)
        .bind(1)
        .bind(&attrs)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(&insert)
        .bind(2)
        .bind(Hstore::new())
        .execute(&pool)
        .await
        .unwrap();

    let decoded: Hstore = sqlx::query_scalar(&format!("SELECT attrs FROM {table} WHERE id = 1"))
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(decoded, attrs);

    let literal: Option<String> =
        sqlx::query_scalar(&format!("SELECT attrs::text FROM {table} WHERE id = 1"))
            .fetch_one(&pool)
            .await
            .unwrap();
    let mut parsed = Hstore::new();
    parsed.from_storage(literal.as_deref()).unwrap();
    assert_eq!(parsed, attrs);

    // The empty map was stored as NULL, and reading it back keeps the target.
    let empty: Option<String> =
        sqlx::query_scalar(&format!("SELECT attrs::text FROM {table} WHERE id = 2"))
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(empty.is_none());
    parsed.from_storage(empty.as_deref()).unwrap();
    assert_eq!(parsed, attrs);

    sqlx::query(&format!("DROP TABLE {table}"))
        .execute(&pool)
        .await
        .unwrap();
}
