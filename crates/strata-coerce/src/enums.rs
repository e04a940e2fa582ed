//! String-to-enum resolution.

use strata_tree::Value;

use crate::coerce::FromValue;
use crate::error::{CoerceError, Result};

/// An enum whose variants are stored by name.
///
/// Implemented by hand per application enum; `variant_name` is used when
/// writing a variant back into the store.
pub trait EnumValue: Sized {
    /// Name of the enum type, used in error messages.
    const NAME: &'static str;

    /// Resolve a variant from its exact stored name.
    fn from_variant_name(name: &str) -> Option<Self>;

    /// The name this variant is stored under.
    fn variant_name(&self) -> &'static str;
}

/// Resolve a stored value into an enum variant by exact name match.
pub fn enum_from_value<E: EnumValue>(value: &Value) -> Result<E> {
    enum_from_value_mapped(value, |name| name.to_string())
}

/// Resolve an enum variant after applying a case-mapping hook to the stored
/// name (e.g. `str::to_uppercase` for stores written in lowercase).
pub fn enum_from_value_mapped<E, F>(value: &Value, mapper: F) -> Result<E>
where
    E: EnumValue,
    F: Fn(&str) -> String,
{
    let raw = String::from_value(value)?;
    let name = mapper(&raw);
    E::from_variant_name(&name).ok_or(CoerceError::UnknownVariant {
        enum_name: E::NAME,
        name,
    })
}

/// Resolve every element of a stored list into enum variants; element
/// failures propagate. A non-sequence value yields the empty list.
pub fn enum_list_from_value<E: EnumValue>(value: &Value) -> Result<Vec<E>> {
    match value.as_list() {
        Some(items) => items.iter().map(enum_from_value).collect(),
        None => Ok(Vec::new()),
    }
}

/// Like [`enum_list_from_value`], but unresolvable elements are dropped.
pub fn enum_list_filtered<E: EnumValue>(value: &Value) -> Vec<E> {
    value
        .as_list()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| enum_from_value(v).ok())
                .collect()
        })
        .unwrap_or_default()
}
