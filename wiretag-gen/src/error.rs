//! Error types for wiretag-gen.

use std::io;
use std::path::PathBuf;

/// Errors that can occur during code generation.
///
/// Every variant is fatal: the generator reports one diagnostic and stops.
#[derive(Debug)]
pub enum Error {
    /// IO error reading sources or writing output.
    Io(io::Error),
    /// No type names were requested.
    NoTypesRequested,
    /// No `.rs` files in the source directory.
    NoSourceFiles { dir: PathBuf },
    /// A source file failed to parse.
    SourceParse { path: PathBuf, message: String },
    /// A requested type was not found in the source set.
    TypeNotFound { name: String },
    /// A requested name resolved to something other than a struct.
    NotAStruct { name: String },
    /// A requested struct has unnamed (tuple) or no fields.
    UnsupportedFields { name: String },
    /// A `#[proto]` attribute did not carry a single string literal.
    BadAttribute { field: String, message: String },
    /// The tag's first part is not a decimal field number.
    InvalidFieldNumber { tag: String },
    /// Field number below the protobuf minimum of 1.
    FieldNumberTooLow { num: i64, tag: String },
    /// Field number above the protobuf maximum of 536870911.
    FieldNumberTooHigh { num: i64, tag: String },
    /// Field number inside the reserved 19000-19999 range.
    FieldNumberReserved { num: i64, tag: String },
    /// A oneof tag with no variant list.
    OneofNoVariants { tag: String },
    /// A oneof variant part without the `Type:FieldNum` shape.
    OneofVariantFormat { part: String, tag: String },
    /// A oneof variant with a non-numeric field number.
    OneofVariantNumber { part: String, tag: String },
    /// A oneof variant field number outside [1, 536870911].
    OneofVariantRange { num: i64, variant: String },
    /// A oneof variant field number inside the reserved range.
    OneofVariantReserved { num: i64, variant: String },
    /// Two variants of one oneof share a field number.
    OneofDuplicateNumber {
        num: u32,
        first: String,
        second: String,
    },
    /// Two fields of a record share a field number. Oneof variants count with
    /// their own numbers.
    DuplicateFieldNumber {
        num: u32,
        first: String,
        second: String,
        type_name: String,
    },
    /// An explicit wire type that is not in the protobuf whitelist.
    InvalidProtoType { name: String, tag: String },
    /// An interface-shaped field without a oneof tag.
    InterfaceField {
        field: String,
        type_name: String,
        host_type: String,
    },
    /// A oneof tag on an ineligible host type.
    InvalidOneofField {
        field: String,
        type_name: String,
        reason: String,
    },
    /// A map key wire type outside the allowed scalar set.
    InvalidMapKey { key: String, tag: String },
    /// A `map` wire type on a field whose host type is not a map.
    MapHostType { field: String, type_name: String },
    /// The emitted token stream failed to parse for formatting.
    Format { message: String, debug_path: PathBuf },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::NoTypesRequested => write!(f, "no type names requested"),
            Self::NoSourceFiles { dir } => {
                write!(f, "no Rust files found in {}", dir.display())
            }
            Self::SourceParse { path, message } => {
                write!(f, "failed to parse file {}: {message}", path.display())
            }
            Self::TypeNotFound { name } => write!(f, "type {name} not found"),
            Self::NotAStruct { name } => write!(f, "type {name} is not a struct"),
            Self::UnsupportedFields { name } => {
                write!(f, "type {name} must be a struct with named fields")
            }
            Self::BadAttribute { field, message } => {
                write!(
                    f,
                    "field {field}: #[proto] expects a single tag string: {message}"
                )
            }
            Self::InvalidFieldNumber { tag } => {
                write!(f, "invalid field number in tag {tag:?}: must be a number")
            }
            Self::FieldNumberTooLow { num, tag } => {
                write!(f, "invalid field number {num} in tag {tag:?}: must be >= 1")
            }
            Self::FieldNumberTooHigh { num, tag } => {
                write!(
                    f,
                    "invalid field number {num} in tag {tag:?}: must be <= 536870911"
                )
            }
            Self::FieldNumberReserved { num, tag } => {
                write!(
                    f,
                    "invalid field number {num} in tag {tag:?}: range 19000-19999 is reserved"
                )
            }
            Self::OneofNoVariants { tag } => {
                write!(f, "oneof tag requires at least one variant: {tag}")
            }
            Self::OneofVariantFormat { part, tag } => {
                write!(
                    f,
                    "invalid oneof variant {part:?} in tag {tag:?}: expected Type:FieldNum format"
                )
            }
            Self::OneofVariantNumber { part, tag } => {
                write!(f, "invalid field number for oneof variant {part:?} in tag {tag:?}")
            }
            Self::OneofVariantRange { num, variant } => {
                write!(
                    f,
                    "invalid field number {num} for oneof variant {variant:?}: must be 1-536870911"
                )
            }
            Self::OneofVariantReserved { num, variant } => {
                write!(
                    f,
                    "invalid field number {num} for oneof variant {variant:?}: range 19000-19999 is reserved"
                )
            }
            Self::OneofDuplicateNumber { num, first, second } => {
                write!(
                    f,
                    "duplicate field number {num} in oneof: used by both {first:?} and {second:?}"
                )
            }
            Self::DuplicateFieldNumber {
                num,
                first,
                second,
                type_name,
            } => {
                write!(
                    f,
                    "duplicate field number {num}: used by both {first:?} and {second:?} in type {type_name}"
                )
            }
            Self::InvalidProtoType { name, tag } => {
                write!(f, "invalid protobuf type {name:?} in tag {tag:?}")
            }
            Self::InterfaceField {
                field,
                type_name,
                host_type,
            } => {
                write!(
                    f,
                    "interface types are not supported for protobuf (use a oneof tag for \
                     polymorphism): field {field:?} in type {type_name} has type {host_type}"
                )
            }
            Self::InvalidOneofField {
                field,
                type_name,
                reason,
            } => {
                write!(f, "invalid oneof field {field:?} in type {type_name}: {reason}")
            }
            Self::InvalidMapKey { key, tag } => {
                write!(
                    f,
                    "invalid map key type {key:?} in tag {tag:?}: must be string, bool, or integer type"
                )
            }
            Self::MapHostType { field, type_name } => {
                write!(
                    f,
                    "field {field:?} in type {type_name} declares the map wire type but its host type is not a map"
                )
            }
            Self::Format { message, debug_path } => {
                write!(
                    f,
                    "failed to format generated code (raw output: {}): {message}",
                    debug_path.display()
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
