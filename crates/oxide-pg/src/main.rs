//! oxide-pg CLI
//!
//! Command-line access to the PostgreSQL dialect: column types, placeholders
//! and schema probes.

use clap::{Parser, Subcommand};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_pg::prelude::*;

/// PostgreSQL dialect tooling for the oxide ORM.
#[derive(Parser)]
#[command(name = "oxide-pg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL.
    #[arg(
        short,
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost/postgres"
    )]
    database: String,

    /// Maximum number of pooled connections.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the column type for a field.
    Infer {
        /// Field kind (bool, i32, u64, f64, string, timestamp, map, bytes, bytes16, other).
        #[arg(short, long)]
        kind: FieldKind,

        /// Field name, used in diagnostics.
        #[arg(short, long, default_value = "field")]
        name: String,

        /// The field is the primary key.
        #[arg(long)]
        primary_key: bool,

        /// Explicit size.
        #[arg(short, long)]
        size: Option<i64>,

        /// Tag string, e.g. "size:64;not null;unique".
        #[arg(short, long)]
        tags: Option<String>,

        /// Concrete type name of the value (e.g. Hstore, UUID).
        #[arg(long)]
        type_name: Option<String>,

        /// Suffix appended after the type.
        #[arg(long)]
        additional_type: Option<String>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the placeholder for a parameter position.
    BindVar {
        /// 1-based parameter position.
        position: usize,
    },

    /// Check whether a schema object exists.
    Probe {
        #[command(subcommand)]
        target: ProbeTarget,
    },

    /// Print the name of the current database.
    CurrentDatabase,
}

#[derive(Subcommand)]
enum ProbeTarget {
    /// A base table.
    Table {
        /// Table name.
        table: String,
    },

    /// A column of a table.
    Column {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// An index on a table.
    Index {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
    },

    /// A foreign key constraint on a table.
    ForeignKey {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
    },

    /// Table existence and current database, queried concurrently.
    All {
        /// Table name.
        table: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        database,
        max_connections,
        verbose,
        command,
    } = Cli::parse();

    // Setup logging
    let log_level = if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match command {
        Commands::Infer {
            kind,
            name,
            primary_key,
            size,
            tags,
            type_name,
            additional_type,
            json,
        } => {
            let mut field = build_field(
                FieldDescriptor::new(name, kind),
                primary_key,
                size,
                tags.as_deref(),
                type_name,
                additional_type,
            );
            let inferred = infer_type(&field)?;
            inferred.apply(&mut field);

            if json {
                println!("{}", serde_json::to_string_pretty(&inferred)?);
            } else {
                println!("{inferred}");
            }
        }

        Commands::BindVar { position } => {
            println!("{}", bind_var(position));
        }

        Commands::Probe { target } => {
            let pool = connect(&database, max_connections).await?;
            let dialect = PostgresDialect::with_connection(pool);

            match target {
                ProbeTarget::Table { table } => {
                    println!("{}", dialect.has_table(&table).await);
                }
                ProbeTarget::Column { table, column } => {
                    println!("{}", dialect.has_column(&table, &column).await);
                }
                ProbeTarget::Index { table, index } => {
                    println!("{}", dialect.has_index(&table, &index).await);
                }
                ProbeTarget::ForeignKey { table, name } => {
                    println!("{}", dialect.has_foreign_key(&table, &name).await);
                }
                ProbeTarget::All { table } => {
                    let (exists, current) =
                        futures::join!(dialect.has_table(&table), dialect.current_database());
                    println!("database: {current}");
                    println!("table {table}: {exists}");
                }
            }
        }

        Commands::CurrentDatabase => {
            let pool = connect(&database, max_connections).await?;
            let dialect = PostgresDialect::with_connection(pool);
            println!("{}", dialect.current_database().await);
        }
    }

    Ok(())
}

fn build_field(
    mut field: FieldDescriptor,
    primary_key: bool,
    size: Option<i64>,
    tags: Option<&str>,
    type_name: Option<String>,
    additional_type: Option<String>,
) -> FieldDescriptor {
    if let Some(tags) = tags {
        field = field.with_tags(&TagSettings::parse(tags));
    }
    if let Some(size) = size {
        field = field.size(size);
    }
    if primary_key {
        field = field.primary_key();
    }
    if let Some(type_name) = type_name {
        field = field.runtime_type_name(type_name);
    }
    if let Some(additional_type) = additional_type {
        field = field.additional_type(additional_type);
    }
    field
}

async fn connect(database: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    info!(max_connections, "Connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database)
        .await?;
    Ok(pool)
}
