//! Immutable bit-packed state values.
//!
//! A [`PackedState`] is a single raw word plus the [`BitLayoutPlan`] that
//! says where each field lives in it. Values are immutable; every update
//! returns a new value and leaves the original untouched, which makes them
//! safe to share and to publish through an atomic cell.
//!
//! States can be used untyped, addressing fields by name:
//!
//! ```
//! use packstate_state::{BitLayoutPlan, FieldDescriptor, FieldValue, PackedState, StateSchema};
//! use std::sync::Arc;
//!
//! let layout = Arc::new(BitLayoutPlan::plan(
//!     &StateSchema::new("Door")
//!         .field(FieldDescriptor::boolean("open"))
//!         .field(FieldDescriptor::enumeration("lock", ["NONE", "LATCH", "BOLT"])),
//! )?);
//! let door = PackedState::initial(layout).with("lock", FieldValue::Enum(2))?;
//! assert_eq!(door.value(), 0b100);
//! assert_eq!(door.to_string(), "Door(open=false, lock=BOLT) = 0b100 = 0x4 = 4");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! or typed, through [`packed_state!`] and [`packed_enum!`].

mod error;
mod field_type;
mod macros;
mod state;

pub use error::{StateError, StateResult};
pub use field_type::{FieldType, PackedEnum, StateType};
pub use state::PackedState;

pub use packstate_layout::{
    BackingWidth, BitLayoutPlan, CodecError, FieldCodec, FieldDescriptor, FieldSlot, FieldValue,
    LayoutError, StateSchema, ValueKind, ValueRange,
};

#[doc(hidden)]
pub mod __private {
    pub use crate::field_type::mismatch;
    pub use paste::paste;
}
