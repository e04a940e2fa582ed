//! Typed value coercion for the Strata configuration store.
//!
//! Turns an untyped stored [`Value`](strata_tree::Value) into a requested
//! static type: numeric narrowing/widening and string parsing, the lenient
//! boolean rule, list and map reconstruction, and string-to-enum resolution.
//!
//! # Design Rules
//!
//! 1. Dispatch is closed over the target type: one [`FromValue`] impl per
//!    supported family, no runtime fallthrough.
//! 2. Scalar shape mismatches raise [`CoerceError`]; collection targets and
//!    every `*_filtered` helper degrade to empty/dropped instead of raising.
//! 3. Explicit-type and infer-from-default call styles share one rule table.

pub mod coerce;
pub mod enums;
pub mod error;

pub use coerce::{coerce, list_filtered, map_filtered, map_of, FromValue};
pub use enums::{
    enum_from_value, enum_from_value_mapped, enum_list_filtered, enum_list_from_value, EnumValue,
};
pub use error::{CoerceError, Result};
