//! The coercion rule table, one [`FromValue`] impl per target family.

use strata_tree::Value;

use crate::error::{CoerceError, Result};

/// A type a stored [`Value`] can be coerced into.
///
/// Dispatch is closed: the compiler picks the rule from the target type, so
/// there is no runtime fallthrough. Both entry styles resolve here — an
/// explicit turbofish (`coerce::<i64>`) and inference from a supplied default
/// (`get_or_default(path, 30i64)`) use the identical impl.
pub trait FromValue: Sized {
    /// Target name used in error messages.
    const TARGET: &'static str;

    fn from_value(value: &Value) -> Result<Self>;
}

/// Coerce a stored value into `T` by the rule table.
pub fn coerce<T: FromValue>(value: &Value) -> Result<T> {
    T::from_value(value)
}

macro_rules! int_from_value {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            const TARGET: &'static str = stringify!($ty);

            fn from_value(value: &Value) -> Result<Self> {
                match value {
                    // Numeric narrowing is silent, matching the store's
                    // documented numeric rule.
                    Value::Int(i) => Ok(*i as $ty),
                    Value::Float(f) => Ok(*f as $ty),
                    Value::String(s) => {
                        s.trim().parse::<$ty>().map_err(|_| CoerceError::Parse {
                            target: Self::TARGET,
                            input: s.clone(),
                        })
                    }
                    other => Err(CoerceError::Shape {
                        expected: Self::TARGET,
                        actual: other.type_name(),
                    }),
                }
            }
        }
    )*};
}

int_from_value!(i8, i16, i32, i64);

macro_rules! float_from_value {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            const TARGET: &'static str = stringify!($ty);

            fn from_value(value: &Value) -> Result<Self> {
                match value {
                    Value::Int(i) => Ok(*i as $ty),
                    Value::Float(f) => Ok(*f as $ty),
                    Value::String(s) => {
                        s.trim().parse::<$ty>().map_err(|_| CoerceError::Parse {
                            target: Self::TARGET,
                            input: s.clone(),
                        })
                    }
                    other => Err(CoerceError::Shape {
                        expected: Self::TARGET,
                        actual: other.type_name(),
                    }),
                }
            }
        }
    )*};
}

float_from_value!(f32, f64);

impl FromValue for bool {
    const TARGET: &'static str = "bool";

    /// Lenient by contract: any non-boolean value stringifies and compares
    /// case-insensitively against `"true"`. Everything else, malformed input
    /// included, is `false` — never an error.
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Ok(other.to_string().eq_ignore_ascii_case("true")),
        }
    }
}

impl FromValue for String {
    const TARGET: &'static str = "string";

    /// A single-element list unwraps to its element's string form; anything
    /// else stringifies directly.
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::List(items) if items.len() == 1 => Ok(items[0].to_string()),
            other => Ok(other.to_string()),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const TARGET: &'static str = "list";

    /// A non-sequence value coerces to the empty list rather than erroring;
    /// element failures propagate.
    fn from_value(value: &Value) -> Result<Self> {
        match value.as_list() {
            Some(items) => items.iter().map(T::from_value).collect(),
            None => Ok(Vec::new()),
        }
    }
}

/// Coerce every element of a list, silently dropping elements that fail.
/// A non-sequence value yields the empty list.
pub fn list_filtered<T: FromValue>(value: &Value) -> Vec<T> {
    value
        .as_list()
        .map(|items| items.iter().filter_map(|v| T::from_value(v).ok()).collect())
        .unwrap_or_default()
}

/// Coerce a branch's direct children into typed entries in branch order.
/// Element failures propagate; a non-branch value yields the empty list.
pub fn map_of<T: FromValue>(value: &Value) -> Result<Vec<(String, T)>> {
    match value.as_branch() {
        Some(branch) => branch
            .iter()
            .map(|(k, v)| Ok((k.to_string(), T::from_value(v)?)))
            .collect(),
        None => Ok(Vec::new()),
    }
}

/// Like [`map_of`], but entries whose value fails to coerce are dropped.
pub fn map_filtered<T: FromValue>(value: &Value) -> Vec<(String, T)> {
    value
        .as_branch()
        .map(|branch| {
            branch
                .iter()
                .filter_map(|(k, v)| T::from_value(v).ok().map(|t| (k.to_string(), t)))
                .collect()
        })
        .unwrap_or_default()
}
