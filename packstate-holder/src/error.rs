//! Error types for atomic holders.

use packstate_state::StateError;
use thiserror::Error;

/// Result type for holder operations.
pub type HolderResult<T> = Result<T, HolderError>;

/// Errors raised by holders and listener composition.
#[derive(Debug, Error)]
pub enum HolderError {
    /// A transition failed, or produced a state of another type.
    #[error(transparent)]
    State(#[from] StateError),

    /// A listener was chained with itself.
    #[error("cannot chain a listener with itself")]
    SelfChain,

    /// A listener was attached to a state declared without change support.
    #[error("{state} does not support change listeners")]
    ChangeSupportDisabled { state: String },

    /// Runtime dispatch was requested outside a tokio runtime.
    #[error("no tokio runtime to dispatch listeners on: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
