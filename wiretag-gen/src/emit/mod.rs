//! Code emission: renders the header section plus encoder/decoder impls for
//! each requested type.
//!
//! Emission order is fully determined by the request: types in requested
//! order, fields in ascending field-number order, oneof variants in tag
//! order. Re-running on unchanged inputs yields byte-identical output.

mod decode;
mod encode;

use proc_macro2::TokenStream;
use quote::quote;
use syn::Type;

use crate::classify;
use crate::descriptor::{FieldInfo, TypeInfo};
use crate::tables::ProtoType;

/// Renders the generated module: optional header (pool + oneof sums)
/// followed by encoder and decoder impls in requested order.
pub fn generate(types: &[TypeInfo], skip_header: bool) -> TokenStream {
    let mut tokens = TokenStream::new();
    if !skip_header {
        tokens.extend(header(types));
    }
    for info in types {
        tokens.extend(encode::encoder(info));
        tokens.extend(decode::decoder(info));
    }
    tokens
}

/// Shared declarations used by the generated code of one output file: the
/// marshaler pool and the sum types backing oneof fields. Suppressed in
/// no-header mode so repeated invocations can share a file.
fn header(types: &[TypeInfo]) -> TokenStream {
    let mut seen: Vec<String> = Vec::new();
    let mut sums = TokenStream::new();
    for info in types {
        for field in &info.fields {
            let Some(oneof) = &field.oneof else { continue };
            let sum_name = oneof.sum_type.to_string();
            if seen.contains(&sum_name) {
                continue;
            }
            seen.push(sum_name);

            let sum = &oneof.sum_type;
            let variants = oneof.variants.iter().map(|v| {
                let name = &v.type_name;
                quote!(#name(#name))
            });
            sums.extend(quote! {
                #[derive(Debug, Clone, PartialEq)]
                pub enum #sum {
                    #(#variants,)*
                }
            });
        }
    }

    quote! {
        use super::*;

        static MARSHALER_POOL: ::wiretag::MarshalerPool = ::wiretag::MarshalerPool::new();

        #sums
    }
}

/// Strips `Option`/`Box` adornments down to the underlying value type.
fn base_type(ty: &Type) -> &Type {
    match ty {
        Type::Path(path) => {
            let Some(seg) = path.path.segments.last() else {
                return ty;
            };
            if seg.ident == "Option" || seg.ident == "Box" {
                if let syn::PathArguments::AngleBracketed(args) = &seg.arguments {
                    for arg in &args.args {
                        if let syn::GenericArgument::Type(inner) = arg {
                            return base_type(inner);
                        }
                    }
                }
            }
            ty
        }
        Type::Paren(paren) => base_type(&paren.elem),
        Type::Group(group) => base_type(&group.elem),
        _ => ty,
    }
}

/// True when `ty` is written exactly as the canonical host type of `proto`,
/// in which case no conversion cast is emitted.
fn is_canonical(ty: &Type, proto: ProtoType) -> bool {
    match proto.scalar_host_type() {
        Some(canonical) => classify::type_to_string(ty) == canonical.to_string(),
        None => false,
    }
}

/// The error value a generated decoder reports for an unreadable field.
fn field_error(info: &TypeInfo, field: &FieldInfo) -> TokenStream {
    let message = info.name.to_string();
    let name = field.name.to_string();
    quote!(::wiretag::DecodeError::field(#message, #name))
}

/// Converts a numeric value expression to the canonical wire host type for
/// appending: identity when the host type matches, `i32::from` for enums,
/// an `as` cast otherwise.
fn numeric_append_expr(
    proto: ProtoType,
    host: &Type,
    enumeration: bool,
    value: TokenStream,
) -> TokenStream {
    if enumeration {
        return quote!(::core::primitive::i32::from(#value));
    }
    if is_canonical(host, proto) {
        return value;
    }
    match proto.scalar_host_type() {
        Some(canonical) => quote!(#value as #canonical),
        None => value,
    }
}

/// Expression reading the current fragment as `proto` and converting it to
/// the host type.
fn scalar_read_expr(
    proto: ProtoType,
    host: &Type,
    enumeration: bool,
    err: &TokenStream,
) -> TokenStream {
    match proto {
        ProtoType::String => quote!(fc.string().ok_or(#err)?.to_owned()),
        ProtoType::Bytes => quote!(fc.bytes().ok_or(#err)?.to_vec()),
        _ => {
            let read = proto.read_fn();
            let value = quote!(fc.#read().ok_or(#err)?);
            if enumeration || proto == ProtoType::Enum {
                quote!(<#host>::from(#value))
            } else if is_canonical(host, proto) {
                value
            } else {
                quote!(#value as #host)
            }
        }
    }
}
