//! Strata: a hierarchical, file-backed configuration store.
//!
//! Values live in an in-memory tree addressed by separator-delimited key
//! paths, persisted through a pluggable format codec, with configurable
//! reload and error-recovery policies and a typed retrieval layer.
//!
//! ```no_run
//! use strata::{DataStorage, StoreBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreBuilder::json("config.json").open()?;
//! let port = config.get_or_set_default("server.port", 8080i64)?;
//! config.set("server.host", "localhost");
//! # Ok(())
//! # }
//! ```

pub mod builder;

pub use builder::StoreBuilder;

pub use strata_coerce::{coerce, CoerceError, EnumValue, FromValue};
pub use strata_file::{
    DataStorage, DecodeError, EncodeError, ErrorPolicy, FileError, FormatCodec, ReloadPolicy,
    Section, StoreFile,
};
pub use strata_formats::{JsonCodec, TomlCodec};
pub use strata_serialize::{SerializeError, SerializerRegistry, ValueSerializer};
pub use strata_tree::{Branch, MapKind, TreeData, Value};
