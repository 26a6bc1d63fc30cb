//! Change listeners and their composition.
//!
//! A listener runs after a holder commits a transition that actually changed
//! the packed word. It sees the previous and new states plus a
//! [`CurrentState`] handle that reads the live value at call time, which may
//! already differ from `changed_to` if other writers got in first.
//!
//! Listeners cannot affect the commit. An `Err` result or a panic is logged
//! and otherwise ignored.

use crate::error::{HolderError, HolderResult};
use crate::executor::Executor;
use crate::holder::CurrentState;
use packstate_state::PackedState;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::warn;

/// Observer of committed state changes.
pub trait ChangeListener: Send + Sync + 'static {
    fn on_change(
        &self,
        previous: &PackedState,
        changed_to: &PackedState,
        current: &CurrentState,
    ) -> anyhow::Result<()>;
}

impl<F> ChangeListener for F
where
    F: Fn(&PackedState, &PackedState, &CurrentState) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn on_change(
        &self,
        previous: &PackedState,
        changed_to: &PackedState,
        current: &CurrentState,
    ) -> anyhow::Result<()> {
        self(previous, changed_to, current)
    }
}

/// A listener shared between holders, chains and executors.
pub type SharedListener = Arc<dyn ChangeListener>;

/// Wraps a closure as a [`SharedListener`].
///
/// Prefer this over `Arc::new` for closures: it pins down the argument types
/// so they need no annotations.
pub fn listener_fn<F>(f: F) -> SharedListener
where
    F: Fn(&PackedState, &PackedState, &CurrentState) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Calls `first` then `then` with the same arguments.
///
/// `then` runs even if `first` fails or panics; the first failure is the one
/// reported.
pub fn chain(first: SharedListener, then: SharedListener) -> HolderResult<SharedListener> {
    if Arc::ptr_eq(&first, &then) {
        return Err(HolderError::SelfChain);
    }
    Ok(Arc::new(Chained { first, then }))
}

/// Hands each change to `executor` and returns immediately.
///
/// Arguments are cloned for the deferred call; `current` still reads the
/// holder's live value when the delegate finally runs. Delegate failures are
/// logged. Changes reach the delegate in commit order only if the executor
/// preserves submission order.
pub fn asynchronous<E: Executor>(executor: E, delegate: SharedListener) -> SharedListener {
    Arc::new(Deferred { executor, delegate })
}

/// [`asynchronous`] on the blocking pool of the tokio runtime the caller is
/// running in.
///
/// Fails with [`HolderError::NoRuntime`] when called outside a runtime.
pub fn asynchronous_on_runtime(delegate: SharedListener) -> HolderResult<SharedListener> {
    let handle = Handle::try_current()?;
    Ok(asynchronous(handle, delegate))
}

struct Chained {
    first: SharedListener,
    then: SharedListener,
}

impl ChangeListener for Chained {
    fn on_change(
        &self,
        previous: &PackedState,
        changed_to: &PackedState,
        current: &CurrentState,
    ) -> anyhow::Result<()> {
        let first = invoke(self.first.as_ref(), previous, changed_to, current);
        let then = invoke(self.then.as_ref(), previous, changed_to, current);
        first.and(then)
    }
}

struct Deferred<E> {
    executor: E,
    delegate: SharedListener,
}

impl<E: Executor> ChangeListener for Deferred<E> {
    fn on_change(
        &self,
        previous: &PackedState,
        changed_to: &PackedState,
        current: &CurrentState,
    ) -> anyhow::Result<()> {
        let delegate = Arc::clone(&self.delegate);
        let previous = previous.clone();
        let changed_to = changed_to.clone();
        let current = current.clone();
        self.executor.execute(Box::new(move || {
            dispatch(delegate.as_ref(), &previous, &changed_to, &current);
        }))
    }
}

/// Runs a listener, turning a panic into an error.
fn invoke(
    listener: &dyn ChangeListener,
    previous: &PackedState,
    changed_to: &PackedState,
    current: &CurrentState,
) -> anyhow::Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| {
        listener.on_change(previous, changed_to, current)
    })) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!(
            "listener panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}

/// Runs a listener and logs any failure.
pub(crate) fn dispatch(
    listener: &dyn ChangeListener,
    previous: &PackedState,
    changed_to: &PackedState,
    current: &CurrentState,
) {
    if let Err(e) = invoke(listener, previous, changed_to, current) {
        warn!(
            state = %changed_to.name(),
            previous = previous.value(),
            changed_to = changed_to.value(),
            "Change listener failed: {:#}",
            e
        );
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
