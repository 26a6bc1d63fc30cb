//! Field descriptors and state schemas.
//!
//! A [`StateSchema`] is what a schema reader hands to the planner: a state
//! name, its fields in declaration order, and whether change notification is
//! wanted. Schemas can be built in code or parsed from JSON:
//!
//! ```
//! use packstate_layout::StateSchema;
//!
//! let schema = StateSchema::from_json(r#"{
//!     "name": "Stately",
//!     "change_support": true,
//!     "fields": [
//!         { "name": "age", "kind": { "type": "int32" }, "range": { "minimum": 0, "maximum": 120 } },
//!         { "name": "isCool", "kind": { "type": "bool" } }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(schema.fields.len(), 2);
//! ```

use crate::error::LayoutResult;
use crate::kind::ValueKind;
use serde::{Deserialize, Serialize};

/// Inclusive range of values an integer field may take.
///
/// Either bound may be left open, in which case it falls back to the natural
/// bound of the field's kind when the layout is planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub minimum: Option<i64>,
    #[serde(default)]
    pub maximum: Option<i64>,
}

impl ValueRange {
    /// A range with both bounds given.
    #[must_use]
    pub const fn new(minimum: i64, maximum: i64) -> Self {
        Self {
            minimum: Some(minimum),
            maximum: Some(maximum),
        }
    }

    /// A range bounded below only.
    #[must_use]
    pub const fn at_least(minimum: i64) -> Self {
        Self {
            minimum: Some(minimum),
            maximum: None,
        }
    }

    /// A range bounded above only.
    #[must_use]
    pub const fn at_most(maximum: i64) -> Self {
        Self {
            minimum: None,
            maximum: Some(maximum),
        }
    }

    /// Fills open bounds from `natural` and returns `(min, max)`.
    #[must_use]
    pub fn resolve(&self, natural: (i64, i64)) -> (i64, i64) {
        (
            self.minimum.unwrap_or(natural.0),
            self.maximum.unwrap_or(natural.1),
        )
    }
}

/// One declared field of a packed state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: ValueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
}

impl FieldDescriptor {
    /// Creates a descriptor without a range.
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            range: None,
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Bool)
    }

    pub fn int8(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Int8)
    }

    pub fn int16(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Int16)
    }

    pub fn int32(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Int32)
    }

    pub fn int64(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Int64)
    }

    /// An enumeration field with members in ordinal order.
    pub fn enumeration<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, ValueKind::enumeration(members))
    }

    /// An integer field restricted to `minimum..=maximum`.
    pub fn ranged(name: impl Into<String>, kind: ValueKind, minimum: i64, maximum: i64) -> Self {
        Self::new(name, kind).with_range(ValueRange::new(minimum, maximum))
    }

    /// Attaches a value range.
    #[must_use]
    pub fn with_range(mut self, range: ValueRange) -> Self {
        self.range = Some(range);
        self
    }
}

/// The ordered field declarations of one state type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSchema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    /// Whether holders of this state may notify a change listener.
    #[serde(default)]
    pub change_support: bool,
}

impl StateSchema {
    /// Creates an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            change_support: false,
        }
    }

    /// Appends a field; declaration order is the order of these calls.
    #[must_use]
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    /// Requests change-notification support.
    #[must_use]
    pub fn with_change_support(mut self, enabled: bool) -> Self {
        self.change_support = enabled;
        self
    }

    /// Parses a schema from a JSON document.
    pub fn from_json(json: &str) -> LayoutResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the schema to pretty-printed JSON.
    pub fn to_json(&self) -> LayoutResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
