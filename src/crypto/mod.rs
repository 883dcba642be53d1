//! Field-level encryption for personally identifiable values.

pub mod field_codec;

pub use field_codec::FieldCodec;
