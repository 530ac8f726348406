//! Inert derive that registers the `#[proto(...)]` field attribute.
//!
//! The `wiretag-gen` binary reads tagged struct declarations straight from
//! source, so no code is expanded here; the derive exists only so that the
//! compiler accepts `#[proto("...")]` on fields of annotated structs.

use proc_macro::TokenStream;

/// Marks a struct whose fields carry `#[proto("...")]` tags for processing by
/// `wiretag-gen`.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Default, PartialEq, ProtoTagged)]
/// pub struct Message {
///     #[proto("1")]
///     pub id: i64,
///     #[proto("2")]
///     pub text: String,
/// }
/// ```
#[proc_macro_derive(ProtoTagged, attributes(proto))]
pub fn derive_proto_tagged(_input: TokenStream) -> TokenStream {
    TokenStream::new()
}
