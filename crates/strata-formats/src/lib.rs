//! Concrete [`FormatCodec`](strata_file::FormatCodec) implementations.
//!
//! Both codecs treat a blank file as an empty tree, because
//! create-on-first-use leaves a zero-byte file behind.

pub mod json;
pub mod toml;

pub use json::JsonCodec;
pub use toml::TomlCodec;
