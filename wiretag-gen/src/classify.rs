//! Host-type classification: walks a field's declared Rust type to infer its
//! protobuf wire type, encoding category, and access flags.

use syn::{GenericArgument, Ident, PathArguments, PathSegment, Type, TypePath};

use crate::descriptor::{FieldInfo, MapInfo};
use crate::tables::ProtoType;

/// Primitive idents that can never carry a oneof tag.
const PRIMITIVES: &[&str] = &[
    "String", "str", "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64",
];

/// Renders a type the way it was written, without token-stream spacing.
pub fn type_to_string(ty: &Type) -> String {
    let raw = quote::quote!(#ty).to_string();
    raw.replace(" :: ", "::")
        .replace(" < ", "<")
        .replace(" >", ">")
        .replace("< ", "<")
        .replace(" ,", ",")
        .replace("& ", "&")
}

fn last_segment(path: &TypePath) -> Option<&PathSegment> {
    path.path.segments.last()
}

fn generic_args(seg: &PathSegment) -> Vec<&Type> {
    match &seg.arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn single_generic(seg: &PathSegment) -> Option<&Type> {
    generic_args(seg).first().copied()
}

fn is_plain_ident(ty: &Type, name: &str) -> bool {
    matches!(ty, Type::Path(p) if p.path.is_ident(name))
}

/// Infers the protobuf wire type for a host type expression.
pub fn infer_proto_type(ty: &Type) -> ProtoType {
    match ty {
        Type::Path(path) => infer_path(path),
        Type::TraitObject(_) | Type::ImplTrait(_) => ProtoType::Interface,
        Type::Reference(reference) => infer_proto_type(&reference.elem),
        Type::Paren(paren) => infer_proto_type(&paren.elem),
        Type::Group(group) => infer_proto_type(&group.elem),
        Type::Array(array) => infer_proto_type(&array.elem),
        Type::Slice(slice) => {
            if is_plain_ident(&slice.elem, "u8") {
                ProtoType::Bytes
            } else {
                infer_proto_type(&slice.elem)
            }
        }
        _ => ProtoType::Bytes,
    }
}

fn infer_path(path: &TypePath) -> ProtoType {
    if let Some(ident) = path.path.get_ident() {
        return match ident.to_string().as_str() {
            "String" => ProtoType::String,
            "bool" => ProtoType::Bool,
            "i32" => ProtoType::Int32,
            "i64" | "isize" => ProtoType::Int64,
            "u32" => ProtoType::Uint32,
            "u64" | "usize" => ProtoType::Uint64,
            "f32" => ProtoType::Float,
            "f64" => ProtoType::Double,
            "u8" => ProtoType::Int32,
            _ => ProtoType::Message,
        };
    }

    let Some(seg) = last_segment(path) else {
        return ProtoType::Message;
    };
    match seg.ident.to_string().as_str() {
        "Option" | "Box" => single_generic(seg).map_or(ProtoType::Message, infer_proto_type),
        "Vec" => match single_generic(seg) {
            Some(elem) if is_plain_ident(elem, "u8") => ProtoType::Bytes,
            Some(elem) => infer_proto_type(elem),
            None => ProtoType::Message,
        },
        "BTreeMap" | "HashMap" => ProtoType::Map,
        // Qualified paths and generic user types denote nested messages.
        _ => ProtoType::Message,
    }
}

/// Populates the kind flags and sub-descriptors derived from the host type.
pub fn analyze(field: &mut FieldInfo, ty: &Type) {
    match ty {
        Type::Path(path) => {
            let Some(seg) = last_segment(path) else { return };
            match seg.ident.to_string().as_str() {
                "Option" => {
                    field.optional = true;
                    if let Some(inner) = single_generic(seg) {
                        analyze(field, inner);
                    }
                }
                "Box" => {
                    field.boxed = true;
                    if let Some(inner) = single_generic(seg) {
                        analyze(field, inner);
                    }
                }
                "Vec" => {
                    let Some(elem) = single_generic(seg) else { return };
                    // []byte analog: Vec<u8> is scalar bytes, not repeated.
                    if is_plain_ident(elem, "u8") {
                        field.elem_type = Some(elem.clone());
                        return;
                    }
                    field.repeated = true;
                    if let Type::Path(elem_path) = elem {
                        if let Some(elem_seg) = last_segment(elem_path) {
                            if elem_seg.ident == "Box" {
                                field.boxed_elems = true;
                                field.elem_type = single_generic(elem_seg).cloned();
                                return;
                            }
                        }
                    }
                    field.elem_type = Some(elem.clone());
                }
                "BTreeMap" | "HashMap" => {
                    let args = generic_args(seg);
                    if let [key, value] = args[..] {
                        field.map = Some(analyze_map(key, value));
                    }
                }
                _ => {}
            }
        }
        Type::Reference(reference) => analyze(field, &reference.elem),
        Type::Paren(paren) => analyze(field, &paren.elem),
        Type::Group(group) => analyze(field, &group.elem),
        _ => {}
    }
}

fn analyze_map(key: &Type, value: &Type) -> MapInfo {
    let mut value_optional = false;
    let mut value_boxed = false;
    let mut value_type = value;

    // Strip `Option`/`Box` adornments from the value, recording each axis.
    loop {
        let Type::Path(path) = value_type else { break };
        let Some(seg) = last_segment(path) else { break };
        match seg.ident.to_string().as_str() {
            "Option" => value_optional = true,
            "Box" => value_boxed = true,
            _ => break,
        }
        match single_generic(seg) {
            Some(inner) => value_type = inner,
            None => break,
        }
    }

    MapInfo {
        key_type: key.clone(),
        value_type: value_type.clone(),
        key_proto: infer_proto_type(key),
        value_proto: infer_proto_type(value),
        value_optional,
        value_boxed,
        value_custom: false,
    }
}

/// Checks that a host type can carry a oneof tag.
///
/// The type must name the variant sum (optionally wrapped in one `Option`
/// layer for nullability); whether the name really resolves to the emitted
/// sum type is left to the compiler when the generated file builds.
pub fn validate_oneof_field_type(ty: &Type) -> Result<(), String> {
    match ty {
        Type::Path(path) => {
            if let Some(ident) = path.path.get_ident() {
                let name = ident.to_string();
                if PRIMITIVES.contains(&name.as_str()) {
                    return Err(format!("oneof tag cannot be used on primitive type {name:?}"));
                }
                return Ok(());
            }
            let Some(seg) = last_segment(path) else {
                return Ok(());
            };
            match seg.ident.to_string().as_str() {
                "Option" => match single_generic(seg) {
                    Some(inner) => validate_oneof_field_type(inner),
                    None => Ok(()),
                },
                "Vec" => Err(format!(
                    "oneof tag cannot be used on slice type {}",
                    type_to_string(ty)
                )),
                "BTreeMap" | "HashMap" => Err(format!(
                    "oneof tag cannot be used on map type {}",
                    type_to_string(ty)
                )),
                "Box" => Err(format!(
                    "oneof tag cannot be used on pointer type {} (declare the field as Option<Sum>)",
                    type_to_string(ty)
                )),
                _ => Ok(()),
            }
        }
        Type::Slice(_) | Type::Array(_) => Err(format!(
            "oneof tag cannot be used on slice/array type {}",
            type_to_string(ty)
        )),
        Type::Reference(_) | Type::Ptr(_) => Err(format!(
            "oneof tag cannot be used on pointer type {}",
            type_to_string(ty)
        )),
        Type::BareFn(_) => Err("oneof tag cannot be used on function type".to_string()),
        Type::Tuple(_) => Err(format!(
            "oneof tag cannot be used on tuple type {}",
            type_to_string(ty)
        )),
        Type::Paren(paren) => validate_oneof_field_type(&paren.elem),
        Type::Group(group) => validate_oneof_field_type(&group.elem),
        other => Err(format!(
            "oneof tag cannot be used on type {}",
            type_to_string(other)
        )),
    }
}

/// The sum type ident named by a oneof field's host type, unwrapping one
/// `Option` layer if present.
pub fn oneof_sum_type(ty: &Type) -> Option<Ident> {
    match ty {
        Type::Path(path) => {
            let seg = last_segment(path)?;
            if seg.ident == "Option" {
                return oneof_sum_type(single_generic(seg)?);
            }
            Some(seg.ident.clone())
        }
        Type::Paren(paren) => oneof_sum_type(&paren.elem),
        Type::Group(group) => oneof_sum_type(&group.elem),
        _ => None,
    }
}
