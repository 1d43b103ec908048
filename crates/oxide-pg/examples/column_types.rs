//! Column types for a small blog schema.
//!
//! Run with: `cargo run -p oxide-pg --example column_types`

use chrono::{DateTime, Utc};
use oxide_pg::prelude::*;

/// A 16-byte identifier named like a UUID.
#[allow(dead_code)]
struct Uuid([u8; 16]);

impl FieldType for Uuid {
    fn field_kind() -> FieldKind {
        <[u8; 16]>::field_kind()
    }
}

fn main() -> Result<()> {
    let dialect = PostgresDialect::new();

    let mut fields = vec![
        FieldDescriptor::of::<i64>("id").primary_key(),
        FieldDescriptor::of::<Uuid>("public_id").with_tags(&TagSettings::parse("not null;unique")),
        FieldDescriptor::of::<String>("title").with_tags(&TagSettings::parse("size:200;not null")),
        FieldDescriptor::of::<String>("body"),
        FieldDescriptor::of::<bool>("published").with_tags(&TagSettings::parse("default:false")),
        FieldDescriptor::of::<f64>("rating"),
        FieldDescriptor::of::<Vec<u8>>("cover_image"),
        FieldDescriptor::of::<Hstore>("metadata"),
        FieldDescriptor::of::<DateTime<Utc>>("created_at")
            .with_tags(&TagSettings::parse("not null;default:now()")),
    ];

    println!("CREATE TABLE {} (", dialect.quote_identifier("posts"));
    let mut columns = Vec::with_capacity(fields.len());
    for field in &mut fields {
        let sql_type = dialect.data_type_of(field)?;
        columns.push(format!(
            "  {} {}",
            dialect.quote_identifier(field.name()),
            sql_type
        ));
    }
    println!("{}", columns.join(",\n"));
    println!(")");

    let placeholders: Vec<String> = (1..=3).map(|i| dialect.bind_var(i)).collect();
    println!(
        "\nINSERT INTO posts (title, body, rating) VALUES ({}) {}",
        placeholders.join(", "),
        dialect.last_insert_id_returning_suffix("posts", "id")
    );

    let metadata: Hstore = [("lang", Some("en".to_string())), ("series", None)]
        .into_iter()
        .collect();
    println!(
        "\nmetadata literal: {}",
        metadata.to_storage().unwrap_or_else(|| "NULL".to_string())
    );

    Ok(())
}
