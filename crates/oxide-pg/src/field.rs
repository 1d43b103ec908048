//! Field descriptors.
//!
//! A [`FieldDescriptor`] is the metadata of one mapped attribute: its
//! [`FieldKind`], size, tag settings and the concrete type name of its
//! value. Descriptors are built once by the caller (directly, from a Rust
//! type via [`FieldType`], or from a tag string via [`TagSettings::parse`])
//! and then handed to the type inference engine.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone};

use crate::error::DialectError;
use crate::hstore::Hstore;
use crate::infer::HSTORE_TYPE_NAME;
use crate::shape::{is_byte_sequence, is_fixed_16_byte_array, ElementType, ValueShape};

/// Tag marking a column as auto-incrementing.
pub const AUTO_INCREMENT: &str = "AUTO_INCREMENT";

/// Tag carrying the explicit column size.
pub const SIZE: &str = "SIZE";

/// Tag carrying an explicit SQL type.
pub const TYPE: &str = "TYPE";

/// Size recorded when no `SIZE` tag is given.
pub const DEFAULT_SIZE: i64 = 255;

/// Primitive shape of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Boolean.
    Bool,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit (or pointer-sized) integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit (or pointer-sized) integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Single precision float.
    Float32,
    /// Double precision float.
    Float64,
    /// String.
    String,
    /// Point in time.
    Timestamp,
    /// String-keyed map.
    Map,
    /// Byte array or byte vector.
    ByteSequence,
    /// Array of exactly 16 bytes.
    FixedBytes16,
    /// Anything else.
    Other,
}

impl FieldKind {
    /// Classifies a non-primitive value by its shape.
    #[must_use]
    pub const fn from_shape(shape: &ValueShape) -> Self {
        if is_fixed_16_byte_array(shape) {
            Self::FixedBytes16
        } else if is_byte_sequence(shape) {
            Self::ByteSequence
        } else {
            Self::Other
        }
    }

    /// Returns the kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Map => "map",
            Self::ByteSequence => "bytes",
            Self::FixedBytes16 => "bytes16",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Self::Bool,
            "int8" | "i8" => Self::Int8,
            "int16" | "i16" => Self::Int16,
            "int32" | "i32" | "int" | "isize" => Self::Int32,
            "int64" | "i64" => Self::Int64,
            "uint8" | "u8" => Self::UInt8,
            "uint16" | "u16" => Self::UInt16,
            "uint32" | "u32" | "uint" | "usize" => Self::UInt32,
            "uint64" | "u64" => Self::UInt64,
            "float32" | "f32" => Self::Float32,
            "float64" | "f64" => Self::Float64,
            "string" | "str" => Self::String,
            "timestamp" | "time" => Self::Timestamp,
            "map" => Self::Map,
            "bytes" | "bytea" => Self::ByteSequence,
            "bytes16" => Self::FixedBytes16,
            "other" => Self::Other,
            _ => return Err(DialectError::UnknownKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// Tag settings of a field, keyed by upper-cased option name.
///
/// Entries can be added but never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSettings(BTreeMap<String, String>);

impl TagSettings {
    /// Creates empty tag settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a tag string such as `type:varchar(100);size:64;not null`.
    ///
    /// Entries are separated by `;`. Each entry is `NAME:value` or a bare
    /// `NAME`, in which case the value is the name itself. Everything after
    /// the first `:` belongs to the value.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        let mut settings = Self::new();
        for entry in tag.split(';') {
            let (name, value) = match entry.split_once(':') {
                Some((name, value)) => (name, Some(value)),
                None => (entry, None),
            };
            let name = name.trim().to_ascii_uppercase();
            if name.is_empty() {
                continue;
            }
            let value = value.map_or_else(|| name.clone(), str::to_string);
            settings.0.insert(name, value);
        }
        settings
    }

    /// Returns the value for a name, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_uppercase()).map(String::as_str)
    }

    /// Returns whether a name is present, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_uppercase())
    }

    /// Sets a value, replacing any previous one.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_uppercase(), value.into());
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Metadata about one mapped field.
///
/// Everything except the tag settings is fixed once the descriptor is built.
/// The tag settings may gain an [`AUTO_INCREMENT`] entry when an inferred
/// type is applied to the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    is_primary_key: bool,
    size: Option<i64>,
    tag_settings: TagSettings,
    additional_type: String,
    runtime_type_name: String,
    sql_type: Option<String>,
}

impl FieldDescriptor {
    /// Creates a descriptor for a field of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_primary_key: false,
            size: None,
            tag_settings: TagSettings::new(),
            additional_type: String::new(),
            runtime_type_name: String::new(),
            sql_type: None,
        }
    }

    /// Creates a descriptor from a Rust type.
    #[must_use]
    pub fn of<T: FieldType + ?Sized>(name: impl Into<String>) -> Self {
        Self::new(name, T::field_kind()).runtime_type_name(T::runtime_type_name())
    }

    /// Marks the field as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Sets an explicit size, recording it as a `SIZE` tag.
    #[must_use]
    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self.tag_settings.insert(SIZE, size.to_string());
        self
    }

    /// Records a size without a `SIZE` tag.
    ///
    /// String columns ignore such a size and map to `text`.
    #[must_use]
    pub fn size_hint(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    /// Adds a single tag.
    #[must_use]
    pub fn tag(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.tag_settings.insert(name, value);
        self
    }

    /// Merges parsed tag settings and derives the explicit type, size,
    /// primary key flag and additional type from them.
    ///
    /// - `TYPE` becomes the explicit SQL type.
    /// - `SIZE` becomes the size; without it [`DEFAULT_SIZE`] is recorded.
    /// - `NOT NULL`, `UNIQUE` and `DEFAULT` make up the additional type.
    /// - `PRIMARY_KEY` marks the primary key.
    #[must_use]
    pub fn with_tags(mut self, tags: &TagSettings) -> Self {
        for (name, value) in tags.iter() {
            self.tag_settings.insert(name, value);
        }

        if let Some(sql_type) = self.tag_settings.get(TYPE) {
            self.sql_type = Some(sql_type.to_string());
        }

        self.size = match self.tag_settings.get(SIZE) {
            Some(size) => size.trim().parse().ok(),
            None => Some(DEFAULT_SIZE),
        };

        if self.tag_settings.contains("PRIMARY_KEY") {
            self.is_primary_key = true;
        }

        let mut parts: Vec<String> = ["NOT NULL", "UNIQUE"]
            .iter()
            .filter_map(|name| self.tag_settings.get(name))
            .map(str::to_string)
            .collect();
        if let Some(default) = self.tag_settings.get("DEFAULT") {
            parts.push(format!("DEFAULT {default}"));
        }
        if !parts.is_empty() {
            self.additional_type = parts.join(" ");
        }

        self
    }

    /// Sets the suffix appended after the inferred type (e.g. `NOT NULL`).
    #[must_use]
    pub fn additional_type(mut self, additional: impl Into<String>) -> Self {
        self.additional_type = additional.into();
        self
    }

    /// Sets the concrete type name of the field value.
    #[must_use]
    pub fn runtime_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.runtime_type_name = type_name.into();
        self
    }

    /// Sets an explicit SQL type that overrides kind-based inference.
    #[must_use]
    pub fn sql_type(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = Some(sql_type.into());
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns whether the field is the primary key.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.is_primary_key
    }

    /// Returns the recorded size, tagged or not.
    #[must_use]
    pub const fn recorded_size(&self) -> Option<i64> {
        self.size
    }

    /// Returns the tag settings.
    #[must_use]
    pub const fn tag_settings(&self) -> &TagSettings {
        &self.tag_settings
    }

    /// Returns the additional type suffix.
    #[must_use]
    pub fn additional(&self) -> &str {
        &self.additional_type
    }

    /// Returns the concrete type name of the field value.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.runtime_type_name
    }

    /// Returns the explicit SQL type, if any.
    #[must_use]
    pub fn explicit_sql_type(&self) -> Option<&str> {
        self.sql_type.as_deref()
    }

    /// Returns whether the field auto-increments.
    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.tag_settings.contains(AUTO_INCREMENT)
    }

    pub(crate) fn mark_auto_increment(&mut self) {
        self.tag_settings.insert(AUTO_INCREMENT, AUTO_INCREMENT);
    }
}

/// Rust types that can be mapped to a column.
pub trait FieldType {
    /// Returns the kind of values of this type.
    fn field_kind() -> FieldKind;

    /// Returns the short name of the type, e.g. `Hstore`.
    fn runtime_type_name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Strips the module path and generic arguments from a type name.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

macro_rules! impl_field_type {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FieldType for $ty {
                fn field_kind() -> FieldKind {
                    FieldKind::$kind
                }
            }
        )*
    };
}

impl_field_type! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    isize => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    usize => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    str => String,
    String => String,
    NaiveDateTime => Timestamp,
}

impl<Tz: TimeZone> FieldType for DateTime<Tz> {
    fn field_kind() -> FieldKind {
        FieldKind::Timestamp
    }
}

impl FieldType for Vec<u8> {
    fn field_kind() -> FieldKind {
        FieldKind::from_shape(&ValueShape::Sequence {
            element: ElementType::U8,
        })
    }
}

impl FieldType for [u8] {
    fn field_kind() -> FieldKind {
        FieldKind::from_shape(&ValueShape::Sequence {
            element: ElementType::U8,
        })
    }
}

impl<const N: usize> FieldType for [u8; N] {
    fn field_kind() -> FieldKind {
        FieldKind::from_shape(&ValueShape::Array {
            element: ElementType::U8,
            len: N,
        })
    }
}

impl FieldType for Hstore {
    fn field_kind() -> FieldKind {
        FieldKind::Map
    }

    fn runtime_type_name() -> &'static str {
        HSTORE_TYPE_NAME
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn field_kind() -> FieldKind {
        T::field_kind()
    }

    fn runtime_type_name() -> &'static str {
        T::runtime_type_name()
    }
}
