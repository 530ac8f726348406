//! Decoder emission.

use proc_macro2::TokenStream;
use quote::quote;

use crate::descriptor::{FieldInfo, MapInfo, TypeInfo};
use crate::tables::ProtoType;

use super::{base_type, field_error, is_canonical, scalar_read_expr};

/// Renders `unmarshal_protobuf`: iterate tagged fragments, dispatch on field
/// number, silently skip unknown numbers.
pub fn decoder(info: &TypeInfo) -> TokenStream {
    let name = &info.name;
    let arms = info.fields.iter().map(|field| field_arms(info, field));

    quote! {
        impl #name {
            /// Decodes the protobuf bytes in `src` into `self`.
            pub fn unmarshal_protobuf(
                &mut self,
                src: &[u8],
            ) -> ::core::result::Result<(), ::wiretag::DecodeError> {
                let mut src = src;
                while !src.is_empty() {
                    let (fc, rest) = ::wiretag::FieldContext::next_field(src)?;
                    src = rest;
                    match fc.field_num {
                        #(#arms)*
                        _ => {}
                    }
                }
                ::core::result::Result::Ok(())
            }
        }
    }
}

fn field_arms(info: &TypeInfo, field: &FieldInfo) -> TokenStream {
    if let Some(oneof) = &field.oneof {
        return oneof_arms(info, field, oneof);
    }
    if let Some(map) = &field.map {
        return map_arm(info, field, map);
    }
    if field.proto_type == ProtoType::Message || field.custom {
        return message_arm(info, field);
    }
    if field.repeated {
        return repeated_arm(info, field);
    }
    scalar_arm(info, field)
}

fn oneof_arms(
    info: &TypeInfo,
    field: &FieldInfo,
    oneof: &crate::descriptor::OneofInfo,
) -> TokenStream {
    let name = &field.name;
    let sum = &oneof.sum_type;
    let err = field_error(info, field);

    let arms = oneof.variants.iter().map(|variant| {
        let vname = &variant.type_name;
        let tag = variant.field_num;
        quote! {
            #tag => {
                let data = fc.message_data().ok_or(#err)?;
                let mut value = <#vname>::default();
                value.unmarshal_protobuf(data)?;
                self.#name = ::core::option::Option::Some(#sum::#vname(value));
            }
        }
    });
    quote!(#(#arms)*)
}

fn map_arm(info: &TypeInfo, field: &FieldInfo, map: &MapInfo) -> TokenStream {
    let name = &field.name;
    let tag = field.field_num;
    let err = field_error(info, field);

    let key_type = &map.key_type;
    let key_read = scalar_read_expr(map.key_proto, key_type, false, &err);

    let value_type = &map.value_type;
    let (value_init, value_stmt) = if map.value_is_message() {
        let decode = quote! {
            let data = fc.message_data().ok_or(#err)?;
        };
        match (map.value_optional, map.value_boxed) {
            (true, true) => (
                quote!(::core::option::Option::None),
                quote! {
                    #decode
                    let mut decoded = <#value_type>::default();
                    decoded.unmarshal_protobuf(data)?;
                    value = ::core::option::Option::Some(::std::boxed::Box::new(decoded));
                },
            ),
            (true, false) => (
                quote!(::core::option::Option::None),
                quote! {
                    #decode
                    let mut decoded = <#value_type>::default();
                    decoded.unmarshal_protobuf(data)?;
                    value = ::core::option::Option::Some(decoded);
                },
            ),
            (false, true) => (
                quote!(<::std::boxed::Box<#value_type>>::default()),
                quote! {
                    #decode
                    value.unmarshal_protobuf(data)?;
                },
            ),
            (false, false) => (
                quote!(<#value_type>::default()),
                quote! {
                    #decode
                    value.unmarshal_protobuf(data)?;
                },
            ),
        }
    } else {
        let read = scalar_read_expr(
            map.value_proto,
            value_type,
            map.value_proto == ProtoType::Enum,
            &err,
        );
        (quote!(<#value_type>::default()), quote!(value = #read;))
    };

    // Map entries are sub-messages with key = 1 and value = 2, in either
    // order. The host map allocates lazily on insert.
    quote! {
        #tag => {
            let data = fc.message_data().ok_or(#err)?;
            let mut key = <#key_type>::default();
            let mut value = #value_init;
            let mut entry = data;
            while !entry.is_empty() {
                let (fc, rest) = ::wiretag::FieldContext::next_field(entry)?;
                entry = rest;
                match fc.field_num {
                    1u32 => {
                        key = #key_read;
                    }
                    2u32 => {
                        #value_stmt
                    }
                    _ => {}
                }
            }
            self.#name.insert(key, value);
        }
    }
}

fn message_arm(info: &TypeInfo, field: &FieldInfo) -> TokenStream {
    let name = &field.name;
    let tag = field.field_num;
    let err = field_error(info, field);
    let base = base_type(&field.host_type);

    if field.repeated {
        let Some(elem) = &field.elem_type else {
            return TokenStream::new();
        };
        let push = if field.boxed_elems {
            quote!(self.#name.push(::std::boxed::Box::new(value));)
        } else {
            quote!(self.#name.push(value);)
        };
        return quote! {
            #tag => {
                let data = fc.message_data().ok_or(#err)?;
                let mut value = <#elem>::default();
                value.unmarshal_protobuf(data)?;
                #push
            }
        };
    }

    if field.optional {
        let assign = if field.boxed {
            quote!(self.#name = ::core::option::Option::Some(::std::boxed::Box::new(value));)
        } else {
            quote!(self.#name = ::core::option::Option::Some(value);)
        };
        return quote! {
            #tag => {
                let data = fc.message_data().ok_or(#err)?;
                let mut value = <#base>::default();
                value.unmarshal_protobuf(data)?;
                #assign
            }
        };
    }

    quote! {
        #tag => {
            let data = fc.message_data().ok_or(#err)?;
            self.#name.unmarshal_protobuf(data)?;
        }
    }
}

fn repeated_arm(info: &TypeInfo, field: &FieldInfo) -> TokenStream {
    let name = &field.name;
    let tag = field.field_num;
    let proto = field.proto_type;
    let err = field_error(info, field);

    if proto.is_length_delimited() {
        let read = match proto {
            ProtoType::String => quote!(fc.string().ok_or(#err)?.to_owned()),
            _ => quote!(fc.bytes().ok_or(#err)?.to_vec()),
        };
        return quote! {
            #tag => {
                self.#name.push(#read);
            }
        };
    }

    let Some(elem) = &field.elem_type else {
        return TokenStream::new();
    };
    let unpack = proto.unpack_fn();
    let read = proto.read_fn();
    let single = quote!(fc.#read().ok_or(#err)?);

    // Try the packed read first; fall back to a single scalar read for
    // compatibility with encoders that produced unpacked repeated fields.
    if field.enumeration || proto == ProtoType::Enum {
        quote! {
            #tag => {
                let mut values = ::std::vec::Vec::new();
                if fc.#unpack(&mut values).is_none() {
                    values.push(#single);
                }
                self.#name
                    .extend(values.into_iter().map(<#elem>::from));
            }
        }
    } else if is_canonical(elem, proto) {
        quote! {
            #tag => {
                if fc.#unpack(&mut self.#name).is_none() {
                    self.#name.push(#single);
                }
            }
        }
    } else {
        quote! {
            #tag => {
                let mut values = ::std::vec::Vec::new();
                if fc.#unpack(&mut values).is_none() {
                    values.push(#single);
                }
                self.#name
                    .extend(values.into_iter().map(|value| value as #elem));
            }
        }
    }
}

fn scalar_arm(info: &TypeInfo, field: &FieldInfo) -> TokenStream {
    let name = &field.name;
    let tag = field.field_num;
    let err = field_error(info, field);
    let base = base_type(&field.host_type);
    let read = scalar_read_expr(field.proto_type, base, field.enumeration, &err);

    if field.optional {
        quote! {
            #tag => {
                self.#name = ::core::option::Option::Some(#read);
            }
        }
    } else {
        quote! {
            #tag => {
                self.#name = #read;
            }
        }
    }
}
