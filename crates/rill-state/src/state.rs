//! The base mutable state container.

use crate::apply::{apply_new_value, ApplyValue, NeedsFeeding, NewValue};
use crate::cell::{Subscription, ValueCell};
use crate::container::{StateContainer, ValueContainer};

/// A mutable value behind a reactive change stream.
///
/// `State` owns its value exclusively: the only mutation path is
/// [`StateContainer::set_value`] (or the [`set`]/[`update`] sugar), which
/// runs the apply policy, stores the result, and synchronously notifies all
/// subscribers exactly once. Cloning a `State` clones a handle to the same
/// underlying value.
///
/// [`set`]: crate::StateContainerExt::set
/// [`update`]: crate::StateContainerExt::update
///
/// # Examples
///
/// ```
/// use rill_state::{State, StateContainerExt, ValueContainer};
///
/// let counter = State::new(0);
/// counter.set(1);
/// counter.update(|current| current + 10);
/// assert_eq!(counter.value(), 11);
/// ```
pub struct State<T> {
    cell: ValueCell<T>,
    apply: ApplyValue<T>,
    needs_feeding: Option<NeedsFeeding<T>>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            apply: self.apply.clone(),
            needs_feeding: self.needs_feeding.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> State<T> {
    /// Create a state with the default apply policy (replace semantics).
    pub fn new(initial: T) -> Self {
        Self::with_apply(initial, apply_new_value())
    }

    /// Create a state with a custom apply policy.
    pub fn with_apply(initial: T, apply: ApplyValue<T>) -> Self {
        Self {
            cell: ValueCell::new(initial),
            apply,
            needs_feeding: None,
        }
    }

    /// Install a needs-feeding guard.
    ///
    /// When the guard returns `false` for `(current, candidate)` the update
    /// is computed but not stored and no notification is emitted.
    pub fn with_needs_feeding<F>(mut self, guard: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.needs_feeding = Some(std::sync::Arc::new(guard));
        self
    }

    /// Suppress updates whose candidate value equals the current one.
    pub fn deduped(self) -> Self
    where
        T: PartialEq,
    {
        self.with_needs_feeding(|current, candidate| current != candidate)
    }
}

impl<T: Clone + Send + 'static> ValueContainer<T> for State<T> {
    #[inline]
    fn value(&self) -> T {
        self.cell.value()
    }

    fn subscribe<F>(&self, subscriber: F) -> Subscription
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.cell.subscribe(subscriber)
    }
}

impl<T: Clone + Send + 'static> StateContainer<T> for State<T> {
    fn set_value(&self, new_value: NewValue<T>) {
        let current = self.cell.value();
        let previous = self.needs_feeding.as_ref().map(|_| current.clone());
        let next = (self.apply)(current, new_value);
        if let (Some(guard), Some(previous)) = (&self.needs_feeding, &previous) {
            if !guard(previous, &next) {
                return;
            }
        }
        self.cell.publish(next);
    }
}

impl<T: Clone + Send + std::fmt::Debug + 'static> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State").field("value", &self.value()).finish()
    }
}
