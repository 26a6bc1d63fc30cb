//! Field descriptors, value codecs and bit layout planning for packstate.
//!
//! This crate turns a declaration of named fields into a plan for packing
//! them into one 32- or 64-bit word:
//!
//! - [`StateSchema`] / [`FieldDescriptor`]: the declared fields, in order
//! - [`FieldCodec`]: how each field's value maps to raw bits and back
//! - [`BitLayoutPlan`]: starting bit, width and mask of every field
//!
//! ```
//! use packstate_layout::{BackingWidth, BitLayoutPlan, FieldDescriptor, StateSchema, ValueKind};
//!
//! let schema = StateSchema::new("Stately")
//!     .field(FieldDescriptor::ranged("age", ValueKind::Int32, 0, 120))
//!     .field(FieldDescriptor::boolean("isCool"))
//!     .field(FieldDescriptor::enumeration("thing", ["SHOES", "CLOUDS", "DARTH_VADER", "FEATHER_BARBULES"]));
//!
//! let plan = BitLayoutPlan::plan(&schema).unwrap();
//! assert_eq!(plan.total_bits(), 10);
//! assert_eq!(plan.backing(), BackingWidth::U32);
//! assert_eq!(plan.fields()[1].mask(), 0b1000_0000);
//! ```

mod codec;
mod error;
mod kind;
mod plan;
mod schema;

pub use codec::{FieldCodec, FieldValue, low_mask};
pub use error::{CodecError, CodecResult, LayoutError, LayoutResult};
pub use kind::{ValueKind, bits_for};
pub use plan::{BackingWidth, BitLayoutPlan, FieldSlot};
pub use schema::{FieldDescriptor, StateSchema, ValueRange};
