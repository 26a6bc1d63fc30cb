//! Error types for layout planning and field codecs.

use thiserror::Error;

/// Result type for layout planning.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Result type for field encoding, decoding and validation.
pub type CodecResult<T> = Result<T, CodecError>;

/// Configuration errors detected while planning a state's bit layout.
///
/// Any of these aborts planning for the affected state; no partial plan is
/// ever produced.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The fields need more bits than a single 64-bit word holds.
    #[error("state {state} requires {required} bits, more than the 64 available")]
    CapacityExceeded { state: String, required: u32 },

    /// A value range whose minimum is not below its maximum.
    #[error("field {field}: minimum {min} must be less than maximum {max}")]
    ContradictoryRange { field: String, min: i64, max: i64 },

    /// A value range declared on a kind that cannot carry one.
    #[error("field {field}: a value range cannot be applied to {kind}")]
    RangeNotSupported { field: String, kind: &'static str },

    /// A value range reaching outside what the declared kind can represent.
    #[error("field {field}: range {min}..={max} exceeds the bounds of {kind}")]
    RangeOutOfBounds {
        field: String,
        kind: &'static str,
        min: i64,
        max: i64,
    },

    /// An enumeration without members.
    #[error("field {field}: an enumeration needs at least one member")]
    EmptyEnum { field: String },

    /// Two fields with the same name in one state.
    #[error("state {state} declares field {field} more than once")]
    DuplicateField { state: String, field: String },

    /// A field with an empty name.
    #[error("state {state} declares a field with an empty name")]
    EmptyFieldName { state: String },

    /// Schema document could not be parsed.
    #[error("schema error: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Validation errors for a single field value.
///
/// Every variant names the field and the offending value; values are never
/// clamped into range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// An integer outside the field's inclusive bounds.
    #[error("{field} must be >= {min} and <= {max} but got {value}")]
    OutOfRange {
        field: String,
        value: i128,
        min: i64,
        max: i64,
    },

    /// An enum ordinal outside `0..count`.
    #[error("ordinal for {field} must be >= 0 and < {count} but got {ordinal}")]
    InvalidOrdinal { field: String, ordinal: u64, count: u32 },

    /// A value of the wrong variant for the field's kind.
    #[error("{field} holds {expected} values but got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
}
