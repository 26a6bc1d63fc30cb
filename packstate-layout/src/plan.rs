//! Bit layout planning.
//!
//! The planner walks a schema's fields in declaration order and gives each
//! one the next free run of bits, starting at bit 0. Field order is never
//! rearranged: reordering would change every mask and shift, and with them
//! the meaning of any packed word already stored elsewhere.

use crate::codec::{FieldCodec, FieldValue, low_mask};
use crate::error::{CodecResult, LayoutError, LayoutResult};
use crate::kind::ValueKind;
use crate::schema::StateSchema;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Width of the integer backing a packed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackingWidth {
    U32,
    U64,
}

impl BackingWidth {
    /// Smallest backing width able to hold `total_bits`.
    #[must_use]
    pub const fn for_bits(total_bits: u32) -> Self {
        if total_bits > 32 { Self::U64 } else { Self::U32 }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::U32 => 32,
            Self::U64 => 64,
        }
    }

    /// All bits of the backing word.
    #[must_use]
    pub const fn word_mask(self) -> u64 {
        low_mask(self.bits())
    }
}

/// A field's position in the packed word together with its codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldSlot {
    name: String,
    kind: ValueKind,
    codec: FieldCodec,
    starting_bit: u32,
    width: u32,
    mask: u64,
}

impl FieldSlot {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    #[must_use]
    pub fn codec(&self) -> &FieldCodec {
        &self.codec
    }

    #[must_use]
    pub fn starting_bit(&self) -> u32 {
        self.starting_bit
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// `((1 << width) - 1) << starting_bit`
    #[must_use]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Extracts this field's raw bits from a packed word.
    #[must_use]
    pub fn extract(&self, word: u64) -> u64 {
        (word & self.mask) >> self.starting_bit
    }

    /// Returns `word` with this field's bits replaced by `raw`.
    #[must_use]
    pub fn place(&self, word: u64, raw: u64) -> u64 {
        (word & !self.mask) | ((raw << self.starting_bit) & self.mask)
    }

    /// Decodes this field from a packed word.
    pub fn read(&self, word: u64) -> CodecResult<FieldValue> {
        self.codec.decode(&self.name, self.extract(word))
    }

    /// Validates and encodes `value` into `word`.
    pub fn write(&self, word: u64, value: FieldValue) -> CodecResult<u64> {
        let raw = self.codec.encode(&self.name, value)?;
        Ok(self.place(word, raw))
    }
}

/// The computed layout of one state type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BitLayoutPlan {
    name: String,
    backing: BackingWidth,
    total_bits: u32,
    fields: Vec<FieldSlot>,
    used_mask: u64,
    unused_mask: u64,
    change_support: bool,
}

impl BitLayoutPlan {
    /// Plans the layout for `schema`.
    ///
    /// Fails with a configuration error if any field declaration is invalid
    /// or the fields need more than 64 bits.
    pub fn plan(schema: &StateSchema) -> LayoutResult<Self> {
        let mut seen = HashSet::with_capacity(schema.fields.len());
        let mut codecs = Vec::with_capacity(schema.fields.len());
        let mut total_bits: u32 = 0;

        for descriptor in &schema.fields {
            if descriptor.name.is_empty() {
                return Err(LayoutError::EmptyFieldName {
                    state: schema.name.clone(),
                });
            }
            if !seen.insert(descriptor.name.as_str()) {
                return Err(LayoutError::DuplicateField {
                    state: schema.name.clone(),
                    field: descriptor.name.clone(),
                });
            }
            let codec = FieldCodec::for_descriptor(descriptor)?;
            total_bits += codec.width();
            codecs.push((descriptor, codec));
        }

        if total_bits > 64 {
            return Err(LayoutError::CapacityExceeded {
                state: schema.name.clone(),
                required: total_bits,
            });
        }

        let backing = BackingWidth::for_bits(total_bits);
        let mut fields = Vec::with_capacity(codecs.len());
        let mut starting_bit = 0;
        for (descriptor, codec) in codecs {
            let width = codec.width();
            fields.push(FieldSlot {
                name: descriptor.name.clone(),
                kind: descriptor.kind.clone(),
                mask: low_mask(width) << starting_bit,
                codec,
                starting_bit,
                width,
            });
            starting_bit += width;
        }

        let used_mask = low_mask(total_bits);
        let plan = Self {
            name: schema.name.clone(),
            backing,
            total_bits,
            fields,
            used_mask,
            unused_mask: backing.word_mask() & !used_mask,
            change_support: schema.change_support,
        };

        debug!(
            state = %plan.name,
            total_bits,
            backing = ?plan.backing,
            fields = plan.fields.len(),
            "Planned bit layout"
        );
        Ok(plan)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn backing(&self) -> BackingWidth {
        self.backing
    }

    /// Sum of all field widths.
    #[must_use]
    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    /// Field slots in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSlot] {
        &self.fields
    }

    /// Position of a field in declaration order.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSlot> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Union of every field's mask.
    #[must_use]
    pub fn used_mask(&self) -> u64 {
        self.used_mask
    }

    /// Bits of the backing word that belong to no field.
    ///
    /// Zero when the fields exactly fill the backing word; a valid packed
    /// word never has any of these bits set.
    #[must_use]
    pub fn unused_mask(&self) -> u64 {
        self.unused_mask
    }

    /// True when the fields use every bit of the backing word.
    #[must_use]
    pub fn fills_word(&self) -> bool {
        self.total_bits == self.backing.bits()
    }

    /// Whether holders of this state may notify a change listener.
    #[must_use]
    pub fn change_support(&self) -> bool {
        self.change_support
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;

    #[test]
    fn empty_schema_plans_to_zero_bits() {
        let plan = BitLayoutPlan::plan(&StateSchema::new("Empty")).unwrap();
        assert_eq!(plan.total_bits(), 0);
        assert_eq!(plan.backing(), BackingWidth::U32);
        assert_eq!(plan.used_mask(), 0);
        assert_eq!(plan.unused_mask(), 0xFFFF_FFFF);
    }

    #[test]
    fn place_keeps_neighbouring_bits() {
        let plan = BitLayoutPlan::plan(
            &StateSchema::new("S")
                .field(FieldDescriptor::int8("a"))
                .field(FieldDescriptor::int8("b")),
        )
        .unwrap();
        let b = &plan.fields()[1];
        let word = b.place(0x00FF, 0xAB);
        assert_eq!(word, 0xABFF);
        assert_eq!(b.extract(word), 0xAB);
    }
}
