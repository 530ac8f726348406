//! Runtime support for the encoders and decoders emitted by `wiretag-gen`.
//!
//! Generated code builds messages through a [`Marshaler`] borrowed from a
//! process-wide [`MarshalerPool`], and decodes them by iterating tagged wire
//! fragments with [`FieldContext`]. Nothing in this crate is specific to any
//! particular message type; the generator wires concrete types against this
//! surface.

pub mod error;
pub mod leb128;
pub mod marshal;
pub mod reader;
pub mod wire;

pub use error::DecodeError;
pub use marshal::{Marshaler, MarshalerPool, MessageMarshaler};
pub use reader::FieldContext;

#[cfg(feature = "derive")]
pub use wiretag_derive::ProtoTagged;
