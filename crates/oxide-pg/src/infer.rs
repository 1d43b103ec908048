//! Column type inference.
//!
//! Maps a [`FieldDescriptor`] to a PostgreSQL column type. Inference itself
//! never touches the descriptor: the auto-increment marker that the serial
//! types imply is reported through [`SideEffects`] and written back by
//! [`InferredType::apply`].

use std::fmt;

use serde::Serialize;

use crate::error::{DialectError, Result};
use crate::field::{FieldDescriptor, FieldKind, AUTO_INCREMENT, SIZE};
use crate::shape::is_uuid_type_name;

/// String columns of this size or larger are stored as `text`.
pub const MAX_VARCHAR_SIZE: i64 = 65532;

/// Runtime type name recognised as the hstore map.
pub const HSTORE_TYPE_NAME: &str = "Hstore";

/// Effects the caller should apply to the descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SideEffects {
    /// The column auto-increments and should carry the `AUTO_INCREMENT` tag.
    pub auto_increment: bool,
}

/// The result of type inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferredType {
    /// Column type, followed by the additional type when there is one.
    pub sql_type: String,
    /// Effects on the descriptor.
    pub side_effects: SideEffects,
}

impl InferredType {
    /// Writes the side effects back to the descriptor.
    ///
    /// Applying the same result more than once has no further effect.
    pub fn apply(&self, field: &mut FieldDescriptor) {
        if self.side_effects.auto_increment {
            field.mark_auto_increment();
        }
    }

    /// Returns the column type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.sql_type
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_type)
    }
}

/// Infers the PostgreSQL column type of a field.
///
/// An explicit SQL type on the descriptor wins over everything else.
/// Otherwise the type follows from the field kind:
///
/// | kind | type |
/// |------|------|
/// | bool | `boolean` |
/// | integers up to 32 bits | `serial` if auto-increment, else `integer` |
/// | 64-bit integers | `bigserial` if auto-increment, else `bigint` |
/// | floats | `numeric` |
/// | string | `varchar(n)` for a tagged size `0 < n < 65532`, else `text` |
/// | timestamp | `timestamp with time zone` |
/// | map named `Hstore` | `hstore` |
/// | byte sequence | `bytea` |
/// | 16 bytes named `uuid`/`guid` | `uuid`, else `bytea` |
///
/// A field auto-increments when it is the primary key or already carries an
/// `AUTO_INCREMENT` tag, whatever its value.
///
/// # Errors
///
/// Returns [`DialectError::UnresolvedType`] when no rule matches.
pub fn infer_type(field: &FieldDescriptor) -> Result<InferredType> {
    let mut side_effects = SideEffects::default();

    let explicit = field
        .explicit_sql_type()
        .filter(|sql_type| !sql_type.trim().is_empty());
    let base = match explicit {
        Some(sql_type) => Some(sql_type.to_string()),
        None => kind_type(field, &mut side_effects),
    };

    let Some(base) = base else {
        return Err(DialectError::UnresolvedType {
            type_name: field.type_name().to_string(),
            kind: field.kind(),
        });
    };

    let additional = field.additional();
    let sql_type = if additional.trim().is_empty() {
        base
    } else {
        format!("{base} {additional}")
    };

    Ok(InferredType {
        sql_type,
        side_effects,
    })
}

fn kind_type(field: &FieldDescriptor, side_effects: &mut SideEffects) -> Option<String> {
    let auto_increment =
        field.is_primary_key() || field.tag_settings().contains(AUTO_INCREMENT);

    let sql_type = match field.kind() {
        FieldKind::Bool => "boolean",
        FieldKind::Int8
        | FieldKind::Int16
        | FieldKind::Int32
        | FieldKind::UInt8
        | FieldKind::UInt16
        | FieldKind::UInt32 => {
            if auto_increment {
                side_effects.auto_increment = true;
                "serial"
            } else {
                "integer"
            }
        }
        FieldKind::Int64 | FieldKind::UInt64 => {
            if auto_increment {
                side_effects.auto_increment = true;
                "bigserial"
            } else {
                "bigint"
            }
        }
        FieldKind::Float32 | FieldKind::Float64 => "numeric",
        FieldKind::String => return Some(string_type(field)),
        FieldKind::Timestamp => "timestamp with time zone",
        FieldKind::Map if field.type_name() == HSTORE_TYPE_NAME => "hstore",
        FieldKind::ByteSequence => "bytea",
        FieldKind::FixedBytes16 if is_uuid_type_name(field.type_name()) => "uuid",
        // A 16-byte array that is not a UUID is still a byte string.
        FieldKind::FixedBytes16 => "bytea",
        FieldKind::Map | FieldKind::Other => return None,
    };

    Some(sql_type.to_string())
}

fn string_type(field: &FieldDescriptor) -> String {
    // Without a SIZE tag any recorded size is a default, not a request.
    let size = if field.tag_settings().contains(SIZE) {
        field.recorded_size()
    } else {
        None
    };

    match size {
        Some(size) if size > 0 && size < MAX_VARCHAR_SIZE => format!("varchar({size})"),
        _ => "text".to_string(),
    }
}
