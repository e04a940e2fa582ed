use thiserror::Error;

/// Failure in the object (de)serialization layer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SerializeError {
    /// No serializer is registered for the requested type.
    #[error("no serializer registered for {type_name}")]
    NoSerializer { type_name: &'static str },

    /// A registered serializer rejected the value it was given.
    #[error("serializer for {type_name} failed: {message}")]
    Failed {
        type_name: &'static str,
        message: String,
    },
}

impl SerializeError {
    /// Convenience constructor for serializer implementations.
    pub fn failed<T>(message: impl Into<String>) -> Self {
        Self::Failed {
            type_name: std::any::type_name::<T>(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SerializeError>;
