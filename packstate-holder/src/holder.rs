//! Lock-free holders for packed states.

use crate::error::{HolderError, HolderResult};
use crate::listener::{self, SharedListener};
use crate::word::AtomicWord;
use packstate_state::{BitLayoutPlan, PackedState, StateResult, StateType};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace};

/// The atomic cell and the layout of the states stored in it.
struct Shared {
    layout: Arc<BitLayoutPlan>,
    cell: AtomicWord,
}

impl Shared {
    fn load(&self) -> PackedState {
        self.wrap(self.cell.load())
    }

    fn wrap(&self, value: u64) -> PackedState {
        PackedState::from_validated(Arc::clone(&self.layout), value)
    }
}

/// Reads a holder's live value.
///
/// Handed to change listeners; a listener that runs late, or on another
/// thread, sees whatever the holder contains when it calls [`get`](Self::get).
#[derive(Clone)]
pub struct CurrentState {
    shared: Arc<Shared>,
}

impl CurrentState {
    #[must_use]
    pub fn get(&self) -> PackedState {
        self.shared.load()
    }
}

impl fmt::Debug for CurrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CurrentState").field(&self.get()).finish()
    }
}

/// A concurrency-safe mutable cell around one [`PackedState`].
///
/// Updates run an optimistic compare-and-swap loop: the current word is
/// loaded, a transition proposes a successor, and the swap succeeds only if
/// no other writer committed in between. On contention the transition runs
/// again against the fresher value, so transitions must be free of side
/// effects.
///
/// Clones share the same cell and listener.
#[derive(Clone)]
pub struct AtomicHolder {
    shared: Arc<Shared>,
    listener: Option<SharedListener>,
}

impl AtomicHolder {
    /// A holder starting at the all-zero state, without a listener.
    #[must_use]
    pub fn new(layout: Arc<BitLayoutPlan>) -> Self {
        Self::with_state(PackedState::initial(layout))
    }

    /// A holder starting at `initial`, without a listener.
    #[must_use]
    pub fn with_state(initial: PackedState) -> Self {
        let shared = Shared {
            cell: AtomicWord::new(initial.layout().backing(), initial.value()),
            layout: Arc::clone(initial.layout()),
        };
        Self {
            shared: Arc::new(shared),
            listener: None,
        }
    }

    #[must_use]
    pub fn builder(layout: Arc<BitLayoutPlan>) -> HolderBuilder {
        HolderBuilder::new(layout)
    }

    #[must_use]
    pub fn layout(&self) -> &Arc<BitLayoutPlan> {
        &self.shared.layout
    }

    /// The current value.
    #[must_use]
    pub fn state(&self) -> PackedState {
        self.shared.load()
    }

    /// A handle that reads the live value.
    #[must_use]
    pub fn current(&self) -> CurrentState {
        CurrentState {
            shared: Arc::clone(&self.shared),
        }
    }

    #[must_use]
    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Applies `transition` atomically and returns the committed value.
    ///
    /// `transition` may run several times under contention. If it fails, the
    /// call fails and nothing is committed. The listener, if any, runs once
    /// after the commit when the word actually changed.
    pub fn update_and_get<F>(&self, transition: F) -> HolderResult<PackedState>
    where
        F: FnMut(&PackedState) -> StateResult<PackedState>,
    {
        self.update(transition).map(|(_, next)| next)
    }

    /// Like [`update_and_get`](Self::update_and_get), returning the value the
    /// transition replaced.
    pub fn get_and_update<F>(&self, transition: F) -> HolderResult<PackedState>
    where
        F: FnMut(&PackedState) -> StateResult<PackedState>,
    {
        self.update(transition).map(|(previous, _)| previous)
    }

    /// Replaces the value, returning whether it changed.
    pub fn set(&self, new: PackedState) -> HolderResult<bool> {
        new.expect_layout(&self.shared.layout)?;
        let old = self.shared.cell.swap(new.value());
        if old == new.value() {
            return Ok(false);
        }
        self.notify(&self.shared.wrap(old), &new);
        Ok(true)
    }

    fn update<F>(&self, mut transition: F) -> HolderResult<(PackedState, PackedState)>
    where
        F: FnMut(&PackedState) -> StateResult<PackedState>,
    {
        let mut observed = self.shared.cell.load();
        let mut retries = 0u32;
        loop {
            let previous = self.shared.wrap(observed);
            let next = transition(&previous)?;
            next.expect_layout(&self.shared.layout)?;
            if next.value() == observed {
                return Ok((previous, next));
            }
            match self.shared.cell.compare_exchange_weak(observed, next.value()) {
                Ok(_) => {
                    if retries > 0 {
                        trace!(
                            state = %self.shared.layout.name(),
                            retries,
                            "Transition committed after contention"
                        );
                    }
                    self.notify(&previous, &next);
                    return Ok((previous, next));
                }
                Err(actual) => {
                    observed = actual;
                    retries += 1;
                }
            }
        }
    }

    fn notify(&self, previous: &PackedState, next: &PackedState) {
        if let Some(l) = &self.listener {
            listener::dispatch(l.as_ref(), previous, next, &self.current());
        }
    }
}

impl fmt::Debug for AtomicHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicHolder")
            .field("state", &self.state())
            .field("listener", &self.has_listener())
            .finish()
    }
}

/// Configures an [`AtomicHolder`].
pub struct HolderBuilder {
    layout: Arc<BitLayoutPlan>,
    initial: Option<PackedState>,
    listener: Option<SharedListener>,
}

impl HolderBuilder {
    #[must_use]
    pub fn new(layout: Arc<BitLayoutPlan>) -> Self {
        Self {
            layout,
            initial: None,
            listener: None,
        }
    }

    /// Starting value; defaults to the all-zero state.
    #[must_use]
    pub fn initial(mut self, state: PackedState) -> Self {
        self.initial = Some(state);
        self
    }

    /// Listener to notify of changes, replacing any set earlier.
    ///
    /// Use [`chain`](crate::chain) to notify more than one.
    #[must_use]
    pub fn listener(mut self, listener: SharedListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Shorthand for [`listener`](Self::listener) with a closure.
    #[must_use]
    pub fn on_change<F>(self, f: F) -> Self
    where
        F: Fn(&PackedState, &PackedState, &CurrentState) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.listener(listener::listener_fn(f))
    }

    /// Builds the holder.
    ///
    /// Fails if a listener is set but the layout was declared without change
    /// support, or if the initial state belongs to another layout.
    pub fn build(self) -> HolderResult<AtomicHolder> {
        if self.listener.is_some() && !self.layout.change_support() {
            return Err(HolderError::ChangeSupportDisabled {
                state: self.layout.name().to_string(),
            });
        }
        let initial = match self.initial {
            Some(state) => {
                state.expect_layout(&self.layout)?;
                state
            }
            None => PackedState::initial(Arc::clone(&self.layout)),
        };
        debug!(
            state = %self.layout.name(),
            initial = initial.value(),
            listener = self.listener.is_some(),
            "Built atomic holder"
        );
        let mut holder = AtomicHolder::with_state(initial);
        holder.listener = self.listener;
        Ok(holder)
    }
}

/// An [`AtomicHolder`] for one typed state.
pub struct TypedHolder<T> {
    inner: AtomicHolder,
    _state: PhantomData<fn() -> T>,
}

impl<T: StateType> TypedHolder<T> {
    /// A holder starting at the all-zero state, without a listener.
    #[must_use]
    pub fn new() -> Self {
        Self::wrap(AtomicHolder::new(Arc::clone(T::layout())))
    }

    #[must_use]
    pub fn with_state(initial: T) -> Self {
        Self::wrap(AtomicHolder::with_state(initial.as_state().clone()))
    }

    /// A builder for this state's layout; finish with
    /// [`from_holder`](Self::from_holder).
    #[must_use]
    pub fn builder() -> HolderBuilder {
        HolderBuilder::new(Arc::clone(T::layout()))
    }

    /// Wraps an untyped holder, typically one made with [`HolderBuilder`].
    pub fn from_holder(holder: AtomicHolder) -> HolderResult<Self> {
        holder.state().expect_layout(T::layout())?;
        Ok(Self::wrap(holder))
    }

    fn wrap(inner: AtomicHolder) -> Self {
        Self {
            inner,
            _state: PhantomData,
        }
    }

    #[must_use]
    pub fn state(&self) -> T {
        T::from_state_unchecked(self.inner.state())
    }

    pub fn update_and_get<F>(&self, transition: F) -> HolderResult<T>
    where
        F: FnMut(&T) -> StateResult<T>,
    {
        self.inner
            .update_and_get(typed(transition))
            .map(T::from_state_unchecked)
    }

    pub fn get_and_update<F>(&self, transition: F) -> HolderResult<T>
    where
        F: FnMut(&T) -> StateResult<T>,
    {
        self.inner
            .get_and_update(typed(transition))
            .map(T::from_state_unchecked)
    }

    pub fn set(&self, new: T) -> HolderResult<bool> {
        self.inner.set(new.as_state().clone())
    }

    /// The untyped holder underneath.
    #[must_use]
    pub fn untyped(&self) -> &AtomicHolder {
        &self.inner
    }
}

impl<T: StateType> Default for TypedHolder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TypedHolder<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _state: PhantomData,
        }
    }
}

impl<T: StateType + fmt::Debug> fmt::Debug for TypedHolder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedHolder").field(&self.state()).finish()
    }
}

fn typed<T, F>(mut transition: F) -> impl FnMut(&PackedState) -> StateResult<PackedState>
where
    T: StateType,
    F: FnMut(&T) -> StateResult<T>,
{
    move |state| {
        let current = T::from_state_unchecked(state.clone());
        transition(&current).map(|next| next.as_state().clone())
    }
}
