//! Value kinds a packed field can hold.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a packed field.
///
/// Integers are signed, matching the width they are declared with. An
/// enumeration carries its member names in ordinal order; only the member
/// count affects the layout, the names are kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Enum { members: Vec<String> },
}

impl ValueKind {
    /// Creates an enumeration kind from its member names.
    pub fn enumeration<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Short lowercase name, used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Enum { .. } => "enum",
        }
    }

    /// Returns true for the fixed-width integer kinds.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        self.natural_bounds().is_some()
    }

    /// Inclusive bounds of the integer kinds; `None` for bool and enum.
    #[must_use]
    pub fn natural_bounds(&self) -> Option<(i64, i64)> {
        match self {
            Self::Int8 => Some((i8::MIN.into(), i8::MAX.into())),
            Self::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            Self::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            Self::Int64 => Some((i64::MIN, i64::MAX)),
            Self::Bool | Self::Enum { .. } => None,
        }
    }

    /// Bits the kind occupies when no range narrows it.
    #[must_use]
    pub fn natural_width(&self) -> u32 {
        match self {
            Self::Bool => 1,
            Self::Int8 => 8,
            Self::Int16 => 16,
            Self::Int32 => 32,
            Self::Int64 => 64,
            Self::Enum { members } => {
                bits_for(u64::try_from(members.len().saturating_sub(1)).unwrap_or(u64::MAX))
            }
        }
    }

    /// Number of enum members, or `None` for non-enum kinds.
    #[must_use]
    pub fn member_count(&self) -> Option<usize> {
        match self {
            Self::Enum { members } => Some(members.len()),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum { members } => write!(f, "enum({})", members.len()),
            other => f.write_str(other.name()),
        }
    }
}

/// Bits needed to store every raw value in `0..=max_raw`.
///
/// This is `floor(log2(max_raw)) + 1`, with a minimum of one bit, so an enum
/// of five members (largest ordinal 4) takes three bits and a range spanning
/// `0..=120` takes seven.
#[must_use]
pub const fn bits_for(max_raw: u64) -> u32 {
    if max_raw == 0 {
        1
    } else {
        u64::BITS - max_raw.leading_zeros()
    }
}
