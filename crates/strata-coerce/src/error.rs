use thiserror::Error;

/// Failure to coerce a stored value into a requested type.
///
/// Raised only for scalar targets whose shape is fundamentally incompatible;
/// collection targets and filtered helpers degrade to empty/dropped elements
/// instead of raising.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoerceError {
    /// The stored value's shape cannot become the target type.
    #[error("cannot coerce {actual} value to {expected}")]
    Shape {
        expected: &'static str,
        actual: &'static str,
    },

    /// A string value could not be parsed as the numeric target.
    #[error("cannot parse {input:?} as {target}")]
    Parse {
        target: &'static str,
        input: String,
    },

    /// A string did not name any variant of the target enum.
    #[error("{name:?} is not a variant of {enum_name}")]
    UnknownVariant {
        enum_name: &'static str,
        name: String,
    },
}

pub type Result<T> = std::result::Result<T, CoerceError>;
