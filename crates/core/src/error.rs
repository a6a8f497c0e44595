//! Marshaling error model.

use thiserror::Error;

/// Result type used across the marshaling layer.
pub type MarshalResult<T> = Result<T, MarshalError>;

/// Marshaling-level error.
///
/// Every variant is deterministic: the same input against the same entity
/// declaration always fails the same way. Nothing here is retried.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// Caller-supplied data does not match the declared structure.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Encoding met a value that has no JSON representation.
    #[error("cannot represent field '{field}': {reason}")]
    Unrepresentable { field: String, reason: String },

    /// Indexed access to a collection slot that holds no element.
    #[error("index {0} out of range")]
    OutOfRange(usize),

    /// Dynamic accessor for a field the entity does not declare.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// An entity declaration is malformed (e.g. duplicate field keys).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Serializer failure while producing JSON text.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MarshalError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unrepresentable(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unrepresentable {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn out_of_range(index: usize) -> Self {
        Self::OutOfRange(index)
    }

    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::UnknownOperation(name.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Prefix a validation/unrepresentable error with the field it came from.
    ///
    /// Nested failures accumulate a dotted path (`metadata.0.value`).
    pub fn in_field(self, field: &str) -> Self {
        match self {
            Self::Validation(msg) => Self::Validation(format!("field '{field}': {msg}")),
            Self::Unrepresentable { field: inner, reason } => Self::Unrepresentable {
                field: if inner.is_empty() {
                    field.to_string()
                } else {
                    format!("{field}.{inner}")
                },
                reason,
            },
            other => other,
        }
    }
}
