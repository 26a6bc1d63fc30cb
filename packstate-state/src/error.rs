//! Error types for packed state values.

use packstate_layout::CodecError;
use thiserror::Error;

/// Result type for packed state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors raised when constructing or updating a packed state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// A field value failed its codec's validation.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The raw word has bits set outside every field.
    #[error("value contains set bits which must not be set in a {state}: {bits:#b}")]
    StrayBits { state: String, bits: u64 },

    /// No field with this name exists in the state.
    #[error("{state} has no field named {field}")]
    UnknownField { state: String, field: String },

    /// A state of one type was used where another was expected.
    #[error("expected a {expected} but got a {actual}")]
    LayoutMismatch { expected: String, actual: String },
}
