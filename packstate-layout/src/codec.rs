//! Per-field encode, decode and validate rules.
//!
//! A [`FieldCodec`] works on raw bits already shifted down to bit 0 of the
//! field; placing them into the packed word is the job of the slot that owns
//! the codec (see [`FieldSlot`](crate::FieldSlot)).

use crate::error::{CodecError, CodecResult, LayoutError, LayoutResult};
use crate::kind::{ValueKind, bits_for};
use crate::schema::FieldDescriptor;
use serde::Serialize;
use std::fmt;

/// A decoded field value.
///
/// Integers of every declared width travel as `i64`; enumerations travel as
/// their ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Enum(u32),
}

impl FieldValue {
    /// Name of the variant, used in type-mismatch errors.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Enum(_) => "enum ordinal",
        }
    }

    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_ordinal(self) -> Option<u32> {
        match self {
            Self::Enum(o) => Some(o),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Enum(o) => write!(f, "#{o}"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! int_field_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

int_field_value!(i8, i16, i32, i64);

/// All-ones mask of `width` low bits.
#[must_use]
pub const fn low_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Encoding rule for one field, resolved from its descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldCodec {
    /// One bit, set for `true`.
    Bool,
    /// Two's complement bits of a fixed-width signed integer.
    Int { width: u32, min: i64, max: i64 },
    /// Offset from `min`, in as few bits as the span needs.
    Ranged { min: i64, max: i64 },
    /// Member ordinal.
    Enum { members: Vec<String> },
}

impl FieldCodec {
    /// Resolves the codec for a descriptor, rejecting invalid declarations.
    pub fn for_descriptor(descriptor: &FieldDescriptor) -> LayoutResult<Self> {
        let field = &descriptor.name;
        match (&descriptor.kind, descriptor.range) {
            (ValueKind::Enum { members }, _) if members.is_empty() => Err(LayoutError::EmptyEnum {
                field: field.clone(),
            }),
            (kind @ (ValueKind::Bool | ValueKind::Enum { .. }), Some(_)) => {
                Err(LayoutError::RangeNotSupported {
                    field: field.clone(),
                    kind: kind.name(),
                })
            }
            (ValueKind::Bool, None) => Ok(Self::Bool),
            (ValueKind::Enum { members }, None) => Ok(Self::Enum {
                members: members.clone(),
            }),
            (kind, range) => {
                let Some(natural) = kind.natural_bounds() else {
                    unreachable!("non-integral kinds are matched above")
                };
                let Some(range) = range else {
                    return Ok(Self::Int {
                        width: kind.natural_width(),
                        min: natural.0,
                        max: natural.1,
                    });
                };
                let (min, max) = range.resolve(natural);
                if min >= max {
                    return Err(LayoutError::ContradictoryRange {
                        field: field.clone(),
                        min,
                        max,
                    });
                }
                if min < natural.0 || max > natural.1 {
                    return Err(LayoutError::RangeOutOfBounds {
                        field: field.clone(),
                        kind: kind.name(),
                        min,
                        max,
                    });
                }
                Ok(Self::Ranged { min, max })
            }
        }
    }

    /// Name of the values this codec accepts.
    #[must_use]
    pub fn value_name(&self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int { .. } | Self::Ranged { .. } => "integer",
            Self::Enum { .. } => "enum ordinal",
        }
    }

    /// Bits the field occupies.
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            Self::Bool => 1,
            Self::Int { width, .. } => *width,
            Self::Ranged { .. } | Self::Enum { .. } => bits_for(self.max_raw()),
        }
    }

    /// Largest raw value that decodes successfully.
    #[must_use]
    pub fn max_raw(&self) -> u64 {
        match self {
            Self::Bool => 1,
            Self::Int { width, .. } => low_mask(*width),
            Self::Ranged { min, max } => span(*min, *max),
            Self::Enum { members } => u64::try_from(members.len().saturating_sub(1)).unwrap_or(u64::MAX),
        }
    }

    /// True when every bit pattern of the field's width is a valid encoding.
    ///
    /// Ranged integers and enumerations whose cardinality is not a power of
    /// two leave some patterns unused; those are rejected on decode.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.max_raw() == low_mask(self.width())
    }

    /// Checks a value against the field's bounds without encoding it.
    pub fn validate(&self, field: &str, value: FieldValue) -> CodecResult<()> {
        match (self, value) {
            (Self::Bool, FieldValue::Bool(_)) => Ok(()),
            (Self::Int { min, max, .. } | Self::Ranged { min, max }, FieldValue::Int(v)) => {
                if v < *min || v > *max {
                    Err(CodecError::OutOfRange {
                        field: field.to_string(),
                        value: i128::from(v),
                        min: *min,
                        max: *max,
                    })
                } else {
                    Ok(())
                }
            }
            (Self::Enum { members }, FieldValue::Enum(ordinal)) => {
                if (ordinal as usize) < members.len() {
                    Ok(())
                } else {
                    Err(CodecError::InvalidOrdinal {
                        field: field.to_string(),
                        ordinal: u64::from(ordinal),
                        count: member_count(members),
                    })
                }
            }
            (codec, value) => Err(CodecError::TypeMismatch {
                field: field.to_string(),
                expected: codec.value_name(),
                actual: value.variant_name(),
            }),
        }
    }

    /// Validates `value` and returns its raw bits, unshifted.
    pub fn encode(&self, field: &str, value: FieldValue) -> CodecResult<u64> {
        self.validate(field, value)?;
        Ok(match (self, value) {
            (Self::Int { width, .. }, FieldValue::Int(v)) => (v as u64) & low_mask(*width),
            (Self::Ranged { min, .. }, FieldValue::Int(v)) => (i128::from(v) - i128::from(*min)) as u64,
            (_, FieldValue::Bool(b)) => u64::from(b),
            (_, FieldValue::Enum(ordinal)) => u64::from(ordinal),
            (_, FieldValue::Int(_)) => unreachable!("validate rejects integers for this codec"),
        })
    }

    /// Decodes raw bits (already shifted to bit 0) into a value.
    ///
    /// Bits above the field's width are ignored.
    pub fn decode(&self, field: &str, raw: u64) -> CodecResult<FieldValue> {
        let raw = raw & low_mask(self.width());
        match self {
            Self::Bool => Ok(FieldValue::Bool(raw != 0)),
            Self::Int { width, .. } => {
                let shift = 64 - width;
                Ok(FieldValue::Int(((raw << shift) as i64) >> shift))
            }
            Self::Ranged { min, max } => {
                let value = i128::from(*min) + i128::from(raw);
                if raw > span(*min, *max) {
                    Err(CodecError::OutOfRange {
                        field: field.to_string(),
                        value,
                        min: *min,
                        max: *max,
                    })
                } else {
                    Ok(FieldValue::Int(value as i64))
                }
            }
            Self::Enum { members } => match u32::try_from(raw) {
                Ok(ordinal) if (ordinal as usize) < members.len() => Ok(FieldValue::Enum(ordinal)),
                _ => Err(CodecError::InvalidOrdinal {
                    field: field.to_string(),
                    ordinal: raw,
                    count: member_count(members),
                }),
            },
        }
    }

    /// Renders a decoded value, naming enum members.
    #[must_use]
    pub fn format_value(&self, value: FieldValue) -> String {
        match (self, value) {
            (Self::Enum { members }, FieldValue::Enum(ordinal)) => members
                .get(ordinal as usize)
                .cloned()
                .unwrap_or_else(|| value.to_string()),
            _ => value.to_string(),
        }
    }

    /// Looks up an enum member's ordinal by name.
    #[must_use]
    pub fn ordinal_of(&self, member: &str) -> Option<u32> {
        match self {
            Self::Enum { members } => members
                .iter()
                .position(|m| m == member)
                .and_then(|i| u32::try_from(i).ok()),
            _ => None,
        }
    }
}

fn span(min: i64, max: i64) -> u64 {
    (i128::from(max) - i128::from(min)) as u64
}

fn member_count(members: &[String]) -> u32 {
    u32::try_from(members.len()).unwrap_or(u32::MAX)
}
