//! Encoder emission.

use proc_macro2::TokenStream;
use quote::quote;

use crate::descriptor::{FieldInfo, MapInfo, TypeInfo};
use crate::tables::ProtoType;

use super::{base_type, is_canonical, numeric_append_expr};

/// Renders `marshal_protobuf` (the public entry point that borrows a pooled
/// marshaler) and `marshal_fields` (one append per present field, in
/// ascending field-number order).
pub fn encoder(info: &TypeInfo) -> TokenStream {
    let name = &info.name;
    let fields = info.fields.iter().map(field_encoder);

    quote! {
        impl #name {
            /// Appends the protobuf encoding of `self` to `dst` and returns it.
            pub fn marshal_protobuf(&self, dst: ::std::vec::Vec<u8>) -> ::std::vec::Vec<u8> {
                let mut m = MARSHALER_POOL.get();
                let mut mm = m.message_marshaler();
                self.marshal_fields(&mut mm);
                let dst = m.marshal(dst);
                MARSHALER_POOL.put(m);
                dst
            }

            pub(crate) fn marshal_fields(&self, mm: &mut ::wiretag::MessageMarshaler<'_>) {
                #(#fields)*
            }
        }
    }
}

fn field_encoder(field: &FieldInfo) -> TokenStream {
    if let Some(oneof) = &field.oneof {
        return oneof_encoder(field, oneof);
    }
    if let Some(map) = &field.map {
        return map_encoder(field, map);
    }
    if field.proto_type == ProtoType::Message || field.custom {
        return message_encoder(field);
    }
    if field.repeated {
        return repeated_encoder(field);
    }
    if field.optional {
        return optional_encoder(field);
    }
    plain_encoder(field)
}

fn oneof_encoder(field: &FieldInfo, oneof: &crate::descriptor::OneofInfo) -> TokenStream {
    let name = &field.name;
    let sum = &oneof.sum_type;
    let arms = oneof.variants.iter().map(|variant| {
        let vname = &variant.type_name;
        let tag = variant.field_num;
        quote! {
            #sum::#vname(value) => mm.append_message(#tag, |mm| value.marshal_fields(mm)),
        }
    });

    quote! {
        if let Some(value) = &self.#name {
            match value {
                #(#arms)*
            }
        }
    }
}

fn map_encoder(field: &FieldInfo, map: &MapInfo) -> TokenStream {
    let name = &field.name;
    let tag = field.field_num;

    let key_append = map.key_proto.append_fn(false);
    let key_expr = match map.key_proto {
        ProtoType::String => quote!(key),
        _ => numeric_append_expr(map.key_proto, &map.key_type, false, quote!(*key)),
    };

    let value_stmt = if map.value_is_message() {
        let append = quote!(mm.append_message(2u32, |mm| value.marshal_fields(mm)););
        if map.value_optional {
            quote! {
                if let Some(value) = value {
                    #append
                }
            }
        } else {
            append
        }
    } else {
        let value_append = map.value_proto.append_fn(false);
        let value_expr = match map.value_proto {
            ProtoType::String | ProtoType::Bytes => quote!(value),
            _ => numeric_append_expr(
                map.value_proto,
                &map.value_type,
                map.value_proto == ProtoType::Enum,
                quote!(*value),
            ),
        };
        quote!(mm.#value_append(2u32, #value_expr);)
    };

    // One sub-message per entry, key under 1 and value under 2, in the host
    // map's natural iteration order.
    quote! {
        for (key, value) in &self.#name {
            mm.append_message(#tag, |mm| {
                mm.#key_append(1u32, #key_expr);
                #value_stmt
            });
        }
    }
}

fn message_encoder(field: &FieldInfo) -> TokenStream {
    let name = &field.name;
    let tag = field.field_num;

    if field.repeated {
        quote! {
            for value in &self.#name {
                mm.append_message(#tag, |mm| value.marshal_fields(mm));
            }
        }
    } else if field.optional {
        quote! {
            if let Some(value) = &self.#name {
                mm.append_message(#tag, |mm| value.marshal_fields(mm));
            }
        }
    } else {
        quote! {
            mm.append_message(#tag, |mm| self.#name.marshal_fields(mm));
        }
    }
}

fn repeated_encoder(field: &FieldInfo) -> TokenStream {
    let name = &field.name;
    let tag = field.field_num;
    let proto = field.proto_type;
    let Some(elem) = &field.elem_type else {
        // Repeated via option flag on a host type the classifier could not
        // destructure; fall back to element-wise iteration.
        return length_delimited_loop(field);
    };

    if proto.is_length_delimited() {
        return length_delimited_loop(field);
    }

    // Packed encoding, omitted entirely when empty.
    if field.enumeration || proto == ProtoType::Enum {
        // Enums ride the packed int32 wire format.
        let append = ProtoType::Int32.append_fn(true);
        quote! {
            if !self.#name.is_empty() {
                let values: ::std::vec::Vec<i32> = self.#name
                    .iter()
                    .map(|value| ::core::primitive::i32::from(*value))
                    .collect();
                mm.#append(#tag, &values);
            }
        }
    } else if is_canonical(elem, proto) {
        let append = proto.append_fn(true);
        quote! {
            if !self.#name.is_empty() {
                mm.#append(#tag, &self.#name);
            }
        }
    } else {
        let append = proto.append_fn(true);
        let Some(canonical) = proto.scalar_host_type() else {
            return length_delimited_loop(field);
        };
        quote! {
            if !self.#name.is_empty() {
                let values: ::std::vec::Vec<#canonical> = self.#name
                    .iter()
                    .map(|value| *value as #canonical)
                    .collect();
                mm.#append(#tag, &values);
            }
        }
    }
}

fn length_delimited_loop(field: &FieldInfo) -> TokenStream {
    let name = &field.name;
    let tag = field.field_num;
    let append = field.proto_type.append_fn(false);
    quote! {
        for value in &self.#name {
            mm.#append(#tag, value);
        }
    }
}

fn optional_encoder(field: &FieldInfo) -> TokenStream {
    let name = &field.name;
    let tag = field.field_num;
    let proto = field.proto_type;
    let append = proto.append_fn(false);
    let base = base_type(&field.host_type);

    let value_expr = match proto {
        ProtoType::String | ProtoType::Bytes => quote!(value),
        _ => numeric_append_expr(proto, base, field.enumeration, quote!(*value)),
    };

    quote! {
        if let Some(value) = &self.#name {
            mm.#append(#tag, #value_expr);
        }
    }
}

fn plain_encoder(field: &FieldInfo) -> TokenStream {
    let name = &field.name;
    let tag = field.field_num;
    let proto = field.proto_type;
    let append = proto.append_fn(false);

    match proto {
        ProtoType::String | ProtoType::Bytes => quote! {
            if !self.#name.is_empty() {
                mm.#append(#tag, &self.#name);
            }
        },
        ProtoType::Bool => quote! {
            if self.#name {
                mm.#append(#tag, self.#name);
            }
        },
        _ if field.enumeration => quote! {
            let value = ::core::primitive::i32::from(self.#name);
            if value != 0 {
                mm.#append(#tag, value);
            }
        },
        _ => {
            // Protobuf default omission: numeric zero is not encoded.
            let zero = if proto.is_float() {
                quote!(0.0)
            } else {
                quote!(0)
            };
            let value_expr =
                numeric_append_expr(proto, &field.host_type, false, quote!(self.#name));
            quote! {
                if self.#name != #zero {
                    mm.#append(#tag, #value_expr);
                }
            }
        }
    }
}
