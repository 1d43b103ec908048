//! Value shape predicates.
//!
//! Used while building field descriptors to tell byte strings and
//! UUID-like arrays apart from other sequence types. Type inference only
//! ever sees the resulting [`FieldKind`](crate::field::FieldKind).

/// Element type of a sequence or array value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// Unsigned 8-bit integer.
    U8,
    /// Anything else.
    Other,
}

/// Structural shape of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// A single value.
    Scalar,
    /// A growable sequence (`Vec<T>`, `&[T]`).
    Sequence {
        /// Element type.
        element: ElementType,
    },
    /// A fixed-length array (`[T; N]`).
    Array {
        /// Element type.
        element: ElementType,
        /// Number of elements.
        len: usize,
    },
}

/// Returns whether the shape is an array or sequence of bytes.
#[must_use]
pub const fn is_byte_sequence(shape: &ValueShape) -> bool {
    matches!(
        shape,
        ValueShape::Sequence {
            element: ElementType::U8
        } | ValueShape::Array {
            element: ElementType::U8,
            ..
        }
    )
}

/// Returns whether the shape is an array of exactly 16 bytes.
#[must_use]
pub const fn is_fixed_16_byte_array(shape: &ValueShape) -> bool {
    matches!(
        shape,
        ValueShape::Array {
            element: ElementType::U8,
            len: 16
        }
    )
}

/// Returns whether a type name designates a UUID (`uuid` or `guid`, any case).
#[must_use]
pub fn is_uuid_type_name(type_name: &str) -> bool {
    type_name.eq_ignore_ascii_case("uuid") || type_name.eq_ignore_ascii_case("guid")
}

/// Returns whether the shape and type name together describe a UUID.
#[must_use]
pub fn is_uuid(shape: &ValueShape, type_name: &str) -> bool {
    is_fixed_16_byte_array(shape) && is_uuid_type_name(type_name)
}
