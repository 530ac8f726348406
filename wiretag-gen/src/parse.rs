//! Tag-string parsing and validation.
//!
//! A field's metadata lives in its `#[proto("...")]` attribute as a
//! comma-separated tag. Two top-level forms exist:
//!
//! * ordinary fields: `fieldNum[,wireType][,option...]`, where a `map` wire
//!   type may carry positional key/value types:
//!   `fieldNum,map,keyType,valueType[,option...]`
//! * oneof fields: `oneof,TypeName:fieldNum(,TypeName:fieldNum)*`
//!
//! Options are `repeated`, `optional`, `enum`, and `custom`; unknown option
//! words are ignored to leave room for future additions.

use std::collections::HashMap;

use syn::{Fields, Ident, ItemStruct, Type};

use crate::classify;
use crate::descriptor::{FieldInfo, OneofInfo, OneofVariant, TypeInfo, ONEOF_FIELD_NUM};
use crate::error::Error;
use crate::introspect;
use crate::tables::ProtoType;

/// Largest legal protobuf field number, `2^29 - 1`.
const FIELD_NUM_MAX: i64 = 536_870_911;
/// Field numbers reserved by the protobuf specification.
const RESERVED_RANGE: std::ops::RangeInclusive<i64> = 19_000..=19_999;

/// Builds the descriptor for one requested struct.
///
/// Fields without a `#[proto]` attribute are invisible to the generator. The
/// returned descriptor has its fields sorted by ascending field number, with
/// oneof fields (sentinel number) first.
pub fn parse_struct(item: &ItemStruct) -> Result<TypeInfo, Error> {
    let type_name = item.ident.to_string();
    let Fields::Named(fields) = &item.fields else {
        return Err(Error::UnsupportedFields { name: type_name });
    };

    let mut info = TypeInfo {
        name: item.ident.clone(),
        fields: Vec::new(),
    };
    // Field number -> owning field, for duplicate detection across the whole
    // record, oneof variants included.
    let mut seen: HashMap<u32, String> = HashMap::new();

    for field in &fields.named {
        let Some(tag) = introspect::proto_tag(field)? else {
            continue;
        };
        let Some(name) = field.ident.clone() else {
            continue;
        };

        let parts: Vec<&str> = tag.split(',').map(str::trim).collect();
        let parsed = if parts.first() == Some(&"oneof") {
            parse_oneof_field(&type_name, name, &field.ty, &parts, &tag, &mut seen)?
        } else {
            parse_ordinary_field(&type_name, name, &field.ty, &parts, &tag, &mut seen)?
        };
        info.fields.push(parsed);
    }

    info.fields.sort_by_key(|f| f.field_num);
    Ok(info)
}

fn parse_ordinary_field(
    type_name: &str,
    name: Ident,
    ty: &Type,
    parts: &[&str],
    tag: &str,
    seen: &mut HashMap<u32, String>,
) -> Result<FieldInfo, Error> {
    let field_num = parse_field_num(parts.first().copied().unwrap_or(""), tag)?;

    // Explicit wire type when present, inferred from the host type otherwise.
    let explicit = match parts.get(1) {
        Some(part) => Some(ProtoType::from_name(part).ok_or_else(|| Error::InvalidProtoType {
            name: (*part).to_string(),
            tag: tag.to_string(),
        })?),
        None => None,
    };
    let proto_type = explicit.unwrap_or_else(|| classify::infer_proto_type(ty));

    if proto_type == ProtoType::Interface {
        return Err(Error::InterfaceField {
            field: name.to_string(),
            type_name: type_name.to_string(),
            host_type: classify::type_to_string(ty),
        });
    }

    let mut field = FieldInfo {
        name,
        host_type: ty.clone(),
        field_num,
        proto_type,
        repeated: false,
        optional: false,
        boxed: false,
        boxed_elems: false,
        enumeration: false,
        custom: false,
        elem_type: None,
        map: None,
        oneof: None,
    };
    classify::analyze(&mut field, ty);

    if proto_type == ProtoType::Map {
        let Some(map) = field.map.as_mut() else {
            return Err(Error::MapHostType {
                field: field.name.to_string(),
                type_name: type_name.to_string(),
            });
        };
        // Positional key/value wire types override the inferred ones:
        // `fieldNum,map,keyType,valueType`.
        if explicit == Some(ProtoType::Map) && parts.len() >= 4 {
            map.key_proto =
                ProtoType::from_name(parts[2]).ok_or_else(|| Error::InvalidMapKey {
                    key: parts[2].to_string(),
                    tag: tag.to_string(),
                })?;
            map.value_proto =
                ProtoType::from_name(parts[3]).ok_or_else(|| Error::InvalidProtoType {
                    name: parts[3].to_string(),
                    tag: tag.to_string(),
                })?;
        }
        if !map.key_proto.is_valid_map_key() {
            return Err(Error::InvalidMapKey {
                key: map.key_proto.name().to_string(),
                tag: tag.to_string(),
            });
        }
    }

    // Remaining parts are order-independent option words.
    let option_start = if proto_type == ProtoType::Map && parts.len() >= 4 {
        4
    } else {
        2
    };
    for part in parts.iter().skip(option_start) {
        match *part {
            "repeated" => field.repeated = true,
            "optional" => field.optional = true,
            "enum" => field.enumeration = true,
            "custom" => {
                field.custom = true;
                if let Some(map) = field.map.as_mut() {
                    map.value_custom = true;
                }
            }
            // Unknown options are reserved for future use.
            _ => {}
        }
    }

    if field.proto_type == ProtoType::Enum {
        field.enumeration = true;
    } else if field.enumeration && field.proto_type == ProtoType::Message {
        // `enum` option on a named alias type whose inference fell through to
        // message: the alias rides the int32 wire format.
        field.proto_type = ProtoType::Enum;
    }

    check_duplicate(seen, field_num, &field.name.to_string(), type_name)?;
    Ok(field)
}

fn parse_oneof_field(
    type_name: &str,
    name: Ident,
    ty: &Type,
    parts: &[&str],
    tag: &str,
    seen: &mut HashMap<u32, String>,
) -> Result<FieldInfo, Error> {
    classify::validate_oneof_field_type(ty).map_err(|reason| Error::InvalidOneofField {
        field: name.to_string(),
        type_name: type_name.to_string(),
        reason,
    })?;

    if parts.len() < 2 {
        return Err(Error::OneofNoVariants {
            tag: tag.to_string(),
        });
    }

    let mut variants: Vec<OneofVariant> = Vec::new();
    for part in &parts[1..] {
        // Split at the last colon so qualified type names survive.
        let Some(colon) = part.rfind(':') else {
            return Err(Error::OneofVariantFormat {
                part: (*part).to_string(),
                tag: tag.to_string(),
            });
        };
        let variant_type = part[..colon].trim();
        let type_ident: Ident =
            syn::parse_str(variant_type).map_err(|_| Error::OneofVariantFormat {
                part: (*part).to_string(),
                tag: tag.to_string(),
            })?;
        let field_num = parse_variant_num(&part[colon + 1..], part, variant_type, tag)?;

        for existing in &variants {
            if existing.field_num == field_num {
                return Err(Error::OneofDuplicateNumber {
                    num: field_num,
                    first: existing.type_name.to_string(),
                    second: variant_type.to_string(),
                });
            }
        }
        variants.push(OneofVariant {
            type_name: type_ident,
            field_num,
        });
    }

    for variant in &variants {
        if let Some(existing) = seen.get(&variant.field_num) {
            return Err(Error::DuplicateFieldNumber {
                num: variant.field_num,
                first: existing.clone(),
                second: format!("oneof variant {}", variant.type_name),
                type_name: type_name.to_string(),
            });
        }
        seen.insert(
            variant.field_num,
            format!("{name}:{}", variant.type_name),
        );
    }

    let Some(sum_type) = classify::oneof_sum_type(ty) else {
        return Err(Error::InvalidOneofField {
            field: name.to_string(),
            type_name: type_name.to_string(),
            reason: "oneof field type must name the variant sum type".to_string(),
        });
    };

    Ok(FieldInfo {
        name,
        host_type: ty.clone(),
        field_num: ONEOF_FIELD_NUM,
        proto_type: ProtoType::Oneof,
        repeated: false,
        optional: true,
        boxed: false,
        boxed_elems: false,
        enumeration: false,
        custom: false,
        elem_type: None,
        map: None,
        oneof: Some(OneofInfo { sum_type, variants }),
    })
}

fn parse_field_num(part: &str, tag: &str) -> Result<u32, Error> {
    let num: i64 = part.parse().map_err(|_| Error::InvalidFieldNumber {
        tag: tag.to_string(),
    })?;
    if num < 1 {
        return Err(Error::FieldNumberTooLow {
            num,
            tag: tag.to_string(),
        });
    }
    if num > FIELD_NUM_MAX {
        return Err(Error::FieldNumberTooHigh {
            num,
            tag: tag.to_string(),
        });
    }
    if RESERVED_RANGE.contains(&num) {
        return Err(Error::FieldNumberReserved {
            num,
            tag: tag.to_string(),
        });
    }
    Ok(num as u32)
}

fn parse_variant_num(raw: &str, part: &str, variant: &str, tag: &str) -> Result<u32, Error> {
    let num: i64 = raw.trim().parse().map_err(|_| Error::OneofVariantNumber {
        part: part.to_string(),
        tag: tag.to_string(),
    })?;
    if num < 1 || num > FIELD_NUM_MAX {
        return Err(Error::OneofVariantRange {
            num,
            variant: variant.to_string(),
        });
    }
    if RESERVED_RANGE.contains(&num) {
        return Err(Error::OneofVariantReserved {
            num,
            variant: variant.to_string(),
        });
    }
    Ok(num as u32)
}

fn check_duplicate(
    seen: &mut HashMap<u32, String>,
    num: u32,
    name: &str,
    type_name: &str,
) -> Result<(), Error> {
    if let Some(existing) = seen.get(&num) {
        return Err(Error::DuplicateFieldNumber {
            num,
            first: existing.clone(),
            second: name.to_string(),
            type_name: type_name.to_string(),
        });
    }
    seen.insert(num, name.to_string());
    Ok(())
}
