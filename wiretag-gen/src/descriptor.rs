//! In-memory descriptors for the record types being generated.
//!
//! Descriptors are build-time only: the metadata parser creates them from a
//! struct declaration, the emitter consumes them, and they are discarded
//! after emission.

use syn::{Ident, Type};

use crate::tables::ProtoType;

/// Sentinel field number carried by oneof fields; the real numbers live on
/// each variant.
pub const ONEOF_FIELD_NUM: u32 = 0;

/// Parsed information about one requested struct.
#[derive(Debug)]
pub struct TypeInfo {
    pub name: Ident,
    /// Fields in ascending field-number order (oneof sentinel first).
    pub fields: Vec<FieldInfo>,
}

/// Parsed information about one protobuf-visible field.
#[derive(Debug)]
pub struct FieldInfo {
    /// Field name in the host struct.
    pub name: Ident,
    /// The declared host type, as written.
    pub host_type: Type,
    pub field_num: u32,
    pub proto_type: ProtoType,
    /// Repeated (`Vec<T>`, except `Vec<u8>` which is scalar bytes).
    pub repeated: bool,
    /// Optional (`Option<T>`); absent values are omitted from the encoding.
    pub optional: bool,
    /// Boxed (`Box<T>`); a host-access concern, independent of `optional`.
    pub boxed: bool,
    /// Repeated with boxed elements (`Vec<Box<T>>`).
    pub boxed_elems: bool,
    /// Numeric-alias type encoded as int32 via `From` conversions.
    pub enumeration: bool,
    /// The type brings its own `marshal_fields`/`unmarshal_protobuf` pair.
    pub custom: bool,
    /// Element type for repeated fields, without the `Vec`/`Box` adornment.
    pub elem_type: Option<Type>,
    pub map: Option<MapInfo>,
    pub oneof: Option<OneofInfo>,
}

/// Sub-descriptors for a map field.
#[derive(Debug)]
pub struct MapInfo {
    pub key_type: Type,
    /// Value host type with `Option`/`Box` adornments stripped.
    pub value_type: Type,
    pub key_proto: ProtoType,
    pub value_proto: ProtoType,
    pub value_optional: bool,
    pub value_boxed: bool,
    pub value_custom: bool,
}

impl MapInfo {
    pub fn value_is_message(&self) -> bool {
        matches!(self.value_proto, ProtoType::Message) || self.value_custom
    }
}

/// Sub-descriptors for a oneof field.
#[derive(Debug)]
pub struct OneofInfo {
    /// The tagged sum type named by the field's host type.
    pub sum_type: Ident,
    /// Variants in the order they were written in the tag.
    pub variants: Vec<OneofVariant>,
}

/// One concrete alternative of a oneof field.
#[derive(Debug)]
pub struct OneofVariant {
    pub type_name: Ident,
    pub field_num: u32,
}
