//! Static wire-type tables: the valid protobuf types, map-key legality, and
//! the runtime facade method used for each type.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;

/// A protobuf type as it appears in a tag string (plus `Interface`, which is
/// only ever inferred and never valid in a tag).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProtoType {
    String,
    Bytes,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Bool,
    Double,
    Float,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Message,
    Enum,
    Map,
    Oneof,
    Interface,
}

impl ProtoType {
    /// Parses an explicit wire type from a tag, validating against the
    /// whitelist. `Interface` is deliberately absent.
    pub fn from_name(name: &str) -> Option<Self> {
        let proto_type = match name {
            "string" => Self::String,
            "bytes" => Self::Bytes,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "sint32" => Self::Sint32,
            "sint64" => Self::Sint64,
            "bool" => Self::Bool,
            "double" => Self::Double,
            "float" => Self::Float,
            "fixed32" => Self::Fixed32,
            "fixed64" => Self::Fixed64,
            "sfixed32" => Self::Sfixed32,
            "sfixed64" => Self::Sfixed64,
            "message" => Self::Message,
            "enum" => Self::Enum,
            "map" => Self::Map,
            "oneof" => Self::Oneof,
            _ => return None,
        };
        Some(proto_type)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Bool => "bool",
            Self::Double => "double",
            Self::Float => "float",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Message => "message",
            Self::Enum => "enum",
            Self::Map => "map",
            Self::Oneof => "oneof",
            Self::Interface => "interface",
        }
    }

    /// Protobuf allows integral, bool, and string map keys; never
    /// float/double, bytes, or messages.
    pub fn is_valid_map_key(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Int32
                | Self::Int64
                | Self::Uint32
                | Self::Uint64
                | Self::Sint32
                | Self::Sint64
                | Self::Fixed32
                | Self::Fixed64
                | Self::Sfixed32
                | Self::Sfixed64
                | Self::Bool
        )
    }

    /// Length-delimited scalars are repeated one fragment per element rather
    /// than packed.
    pub fn is_length_delimited(self) -> bool {
        matches!(self, Self::String | Self::Bytes)
    }

    /// The numeric/bool scalars that pack into a single length-delimited
    /// fragment when repeated.
    pub fn is_packable(self) -> bool {
        matches!(
            self,
            Self::Int32
                | Self::Int64
                | Self::Uint32
                | Self::Uint64
                | Self::Sint32
                | Self::Sint64
                | Self::Bool
                | Self::Double
                | Self::Float
                | Self::Fixed32
                | Self::Fixed64
                | Self::Sfixed32
                | Self::Sfixed64
        )
    }

    /// The scalar name used to derive runtime method names. `enum` rides on
    /// the int32 wire format.
    fn scalar_name(self) -> &'static str {
        match self {
            Self::Enum => "int32",
            other => other.name(),
        }
    }

    /// Name of the `MessageMarshaler` append method for this type.
    pub fn append_fn(self, repeated: bool) -> Ident {
        if repeated && self.is_packable() {
            format_ident!("append_{}s", self.scalar_name())
        } else {
            format_ident!("append_{}", self.scalar_name())
        }
    }

    /// Name of the `FieldContext` read method for this type.
    pub fn read_fn(self) -> Ident {
        format_ident!("{}", self.scalar_name())
    }

    /// Name of the `FieldContext` packed-unpack method for this type.
    pub fn unpack_fn(self) -> Ident {
        format_ident!("unpack_{}s", self.scalar_name())
    }

    /// The canonical Rust value type the runtime reads and writes for this
    /// wire type, or `None` for non-scalar types.
    pub fn scalar_host_type(self) -> Option<TokenStream> {
        let tokens = match self {
            Self::Int32 | Self::Sint32 | Self::Sfixed32 | Self::Enum => quote!(i32),
            Self::Int64 | Self::Sint64 | Self::Sfixed64 => quote!(i64),
            Self::Uint32 | Self::Fixed32 => quote!(u32),
            Self::Uint64 | Self::Fixed64 => quote!(u64),
            Self::Bool => quote!(bool),
            Self::Float => quote!(f32),
            Self::Double => quote!(f64),
            _ => return None,
        };
        Some(tokens)
    }

    /// Whether values of this type are floating point (changes the zero
    /// literal in default checks).
    pub fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }
}
