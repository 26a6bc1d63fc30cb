//! Atomic holders for packed states.
//!
//! An [`AtomicHolder`] stores one packed word in an atomic cell and updates it
//! with a lock-free compare-and-swap loop. Any number of threads may update
//! the same holder; committed transitions are totally ordered.
//!
//! ```
//! use packstate_holder::{AtomicHolder, HolderResult};
//! use packstate_state::{BitLayoutPlan, FieldDescriptor, FieldValue, StateSchema};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = Arc::new(BitLayoutPlan::plan(
//!     &StateSchema::new("Counter")
//!         .with_change_support(true)
//!         .field(FieldDescriptor::int16("count")),
//! )?);
//!
//! let changes = Arc::new(AtomicUsize::new(0));
//! let seen = Arc::clone(&changes);
//! let holder = AtomicHolder::builder(layout)
//!     .on_change(move |_, _, _| {
//!         seen.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let next = holder.update_and_get(|s| {
//!     let count = s.read("count")?.as_int().unwrap_or_default();
//!     s.with("count", count + 1)
//! })?;
//! assert_eq!(next.read("count")?, FieldValue::Int(1));
//! assert_eq!(changes.load(Ordering::SeqCst), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Listeners see `(previous, changed_to, current)` after each effective
//! commit; see [`ChangeListener`], [`chain`], [`asynchronous`] and
//! [`asynchronous_on_runtime`].

mod error;
mod executor;
mod holder;
mod listener;
mod word;

pub use error::{HolderError, HolderResult};
pub use executor::{Executor, Job, SerialExecutor};
pub use holder::{AtomicHolder, CurrentState, HolderBuilder, TypedHolder};
pub use listener::{
    ChangeListener, SharedListener, asynchronous, asynchronous_on_runtime, chain,
    listener_fn,
};
