//! Type-keyed object serializer registry for the Strata configuration store.
//!
//! Applications register a [`ValueSerializer`] per custom type; typed
//! accessors then bridge stored [`Value`](strata_tree::Value) trees to those
//! types through a [`SerializerRegistry`].
//!
//! # Design Rules
//!
//! 1. Lookup is by exact `TypeId` only; no assignability or subtype match.
//! 2. A missing serializer is always a loud [`SerializeError::NoSerializer`],
//!    never a silent fallback; it indicates a programming mistake.
//! 3. Registries are explicit instances wired in by the caller;
//!    [`SerializerRegistry::shared_global`] is a thin process-wide
//!    convenience, not the primary API.

pub mod error;
pub mod registry;

pub use error::{Result, SerializeError};
pub use registry::{SerializerRegistry, ValueSerializer};
