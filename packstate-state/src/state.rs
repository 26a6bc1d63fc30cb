//! The immutable packed state value.

use crate::error::{StateError, StateResult};
use packstate_layout::{BackingWidth, BitLayoutPlan, FieldSlot, FieldValue};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One immutable value of a packed state type.
///
/// Wraps a single raw word together with the plan describing how fields are
/// laid out in it. Updates never mutate: [`with`](Self::with) returns a new
/// value, or an equal copy when the field already holds the requested value.
///
/// Two values are equal when they belong to the same state type and their raw
/// words are identical.
#[derive(Clone)]
pub struct PackedState {
    layout: Arc<BitLayoutPlan>,
    value: u64,
}

impl PackedState {
    /// Creates a state from a raw word, validating every field.
    ///
    /// Fails if the word has bits set outside all fields, or if any field's
    /// bits decode to a value outside its range or enumeration.
    pub fn new(layout: Arc<BitLayoutPlan>, value: u64) -> StateResult<Self> {
        Self::validate(&layout, value)?;
        Ok(Self { layout, value })
    }

    /// The all-zero state.
    ///
    /// Always valid: every field decodes zero bits to its first member,
    /// its minimum, `false` or `0`.
    #[must_use]
    pub fn initial(layout: Arc<BitLayoutPlan>) -> Self {
        Self { layout, value: 0 }
    }

    /// Wraps a raw word without validating it.
    ///
    /// Atomic holders use this to rebuild states from their cell. `value`
    /// must have been taken from a state of the same layout; use
    /// [`new`](Self::new) for words of unknown origin.
    ///
    /// # Panics
    ///
    /// Debug builds panic if `value` does not validate. Release builds accept
    /// it, and reading a field it corrupts panics later.
    #[doc(hidden)]
    #[must_use]
    pub fn from_validated(layout: Arc<BitLayoutPlan>, value: u64) -> Self {
        debug_assert!(Self::validate(&layout, value).is_ok());
        Self { layout, value }
    }

    /// Checks a raw word against a layout.
    pub fn validate(layout: &BitLayoutPlan, value: u64) -> StateResult<()> {
        let stray = value & !layout.used_mask();
        if stray != 0 {
            return Err(StateError::StrayBits {
                state: layout.name().to_string(),
                bits: stray,
            });
        }
        for slot in layout.fields() {
            if !slot.codec().is_dense() {
                slot.read(value)?;
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn layout(&self) -> &Arc<BitLayoutPlan> {
        &self.layout
    }

    /// Name of the state type.
    #[must_use]
    pub fn name(&self) -> &str {
        self.layout.name()
    }

    /// The raw packed word.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Reads a field by name.
    pub fn read(&self, field: &str) -> StateResult<FieldValue> {
        let index = self.index_of(field)?;
        Ok(self.value_at(index))
    }

    /// Reads the field at `index` in declaration order.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds for the layout.
    #[must_use]
    pub fn value_at(&self, index: usize) -> FieldValue {
        let slot = &self.layout.fields()[index];
        match slot.read(self.value) {
            Ok(value) => value,
            Err(e) => unreachable!("validated {} failed to decode: {e}", self.name()),
        }
    }

    /// Decoded values of all fields in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&FieldSlot, FieldValue)> + '_ {
        self.layout
            .fields()
            .iter()
            .enumerate()
            .map(|(index, slot)| (slot, self.value_at(index)))
    }

    /// Returns a state with `field` set to `value`.
    ///
    /// The value is validated before anything else happens. If the field
    /// already holds it, an equal copy of `self` is returned.
    pub fn with(&self, field: &str, value: impl Into<FieldValue>) -> StateResult<Self> {
        let index = self.index_of(field)?;
        self.with_at(index, value.into())
    }

    /// Like [`with`](Self::with), addressing the field by declaration index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds for the layout.
    pub fn with_at(&self, index: usize, value: FieldValue) -> StateResult<Self> {
        let slot = &self.layout.fields()[index];
        let raw = slot.codec().encode(slot.name(), value)?;
        if slot.extract(self.value) == raw {
            return Ok(self.clone());
        }
        Ok(Self {
            layout: Arc::clone(&self.layout),
            value: slot.place(self.value, raw),
        })
    }

    /// True if both states belong to the same state type.
    #[must_use]
    pub fn same_layout(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.layout, &other.layout) || self.layout == other.layout
    }

    /// Fails unless this state was laid out by `expected`.
    pub fn expect_layout(&self, expected: &Arc<BitLayoutPlan>) -> StateResult<()> {
        if Arc::ptr_eq(&self.layout, expected) || *self.layout == **expected {
            Ok(())
        } else {
            Err(StateError::LayoutMismatch {
                expected: expected.name().to_string(),
                actual: self.name().to_string(),
            })
        }
    }

    /// Scrambled 32-bit hash of the raw word.
    ///
    /// Multiplying by an odd constant spreads small raw values, which are the
    /// common case, across the hash space.
    #[must_use]
    pub fn hash_code(&self) -> u32 {
        match self.layout.backing() {
            BackingWidth::U32 => (self.value as u32).wrapping_mul(43867),
            BackingWidth::U64 => (self.value ^ (self.value >> 32)).wrapping_mul(102_071) as u32,
        }
    }

    fn index_of(&self, field: &str) -> StateResult<usize> {
        self.layout
            .index_of(field)
            .ok_or_else(|| StateError::UnknownField {
                state: self.name().to_string(),
                field: field.to_string(),
            })
    }
}

impl PartialEq for PackedState {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.same_layout(other)
    }
}

impl Eq for PackedState {}

impl Hash for PackedState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash_code());
    }
}

impl fmt::Display for PackedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (i, (slot, value)) in self.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", slot.name(), slot.codec().format_value(value))?;
        }
        write!(f, ") = 0b{:b} = 0x{:x} = {}", self.value, self.value, self.value)
    }
}

impl fmt::Debug for PackedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedState")
            .field("state", &self.name())
            .field("value", &format_args!("{:#x}", self.value))
            .finish()
    }
}
