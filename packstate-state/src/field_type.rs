//! Traits connecting Rust types to packed fields and states.
//!
//! These are implemented by [`packed_enum!`](crate::packed_enum) and
//! [`packed_state!`](crate::packed_state); implementing them by hand is
//! possible but rarely needed.

use crate::error::StateResult;
use crate::state::PackedState;
use packstate_layout::{BitLayoutPlan, FieldValue, ValueKind};
use std::sync::Arc;

/// A Rust type that can be stored in a packed field.
pub trait FieldType: Copy {
    /// The kind of field this type is declared as.
    fn value_kind() -> ValueKind;

    fn into_field_value(self) -> FieldValue;

    /// Converts a decoded value back.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a value this type produces. Values decoded
    /// from a field declared with [`value_kind`](Self::value_kind) always
    /// convert.
    fn from_field_value(value: FieldValue) -> Self;
}

impl FieldType for bool {
    fn value_kind() -> ValueKind {
        ValueKind::Bool
    }

    fn into_field_value(self) -> FieldValue {
        FieldValue::Bool(self)
    }

    fn from_field_value(value: FieldValue) -> Self {
        match value {
            FieldValue::Bool(b) => b,
            other => mismatch("bool", other),
        }
    }
}

macro_rules! int_field_type {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FieldType for $ty {
                fn value_kind() -> ValueKind {
                    ValueKind::$kind
                }

                fn into_field_value(self) -> FieldValue {
                    FieldValue::Int(i64::from(self))
                }

                fn from_field_value(value: FieldValue) -> Self {
                    match value {
                        FieldValue::Int(v) => match <$ty>::try_from(v) {
                            Ok(v) => v,
                            Err(_) => panic!("{v} does not fit in {}", stringify!($ty)),
                        },
                        other => mismatch(stringify!($ty), other),
                    }
                }
            }
        )*
    };
}

int_field_type! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
}

/// A fieldless Rust enum stored by ordinal.
pub trait PackedEnum: Copy + 'static {
    /// All members in ordinal order.
    const MEMBERS: &'static [Self];

    fn ordinal(self) -> u32;

    fn member_name(self) -> &'static str;

    #[must_use]
    fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::MEMBERS.get(ordinal as usize).copied()
    }

    /// Field kind listing every member name.
    #[must_use]
    fn enum_kind() -> ValueKind {
        ValueKind::enumeration(Self::MEMBERS.iter().map(|m| m.member_name()))
    }
}

/// A typed wrapper over [`PackedState`] with a fixed, shared layout.
pub trait StateType: Clone + Send + Sync + 'static {
    /// The layout every value of this type shares.
    fn layout() -> &'static Arc<BitLayoutPlan>;

    fn as_state(&self) -> &PackedState;

    /// Wraps an untyped state, failing if it has a different layout.
    fn from_state(state: PackedState) -> StateResult<Self>;

    /// Wraps an untyped state known to have this type's layout.
    #[doc(hidden)]
    fn from_state_unchecked(state: PackedState) -> Self;
}

#[doc(hidden)]
#[track_caller]
pub fn mismatch(expected: &str, value: FieldValue) -> ! {
    panic!("packed field holds {} but {expected} was expected", value.variant_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "does not fit in i8")]
    fn narrowing_overflow_panics() {
        let _ = i8::from_field_value(FieldValue::Int(300));
    }

    #[test]
    #[should_panic(expected = "packed field holds boolean")]
    fn wrong_variant_panics() {
        let _ = i32::from_field_value(FieldValue::Bool(true));
    }

    #[test]
    fn bool_round_trip() {
        assert!(bool::from_field_value(true.into_field_value()));
        assert_eq!(i16::value_kind(), ValueKind::Int16);
    }
}
