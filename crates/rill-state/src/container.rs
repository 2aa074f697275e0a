//! Capability traits for value containers.
//!
//! Every container exposes a readable current value plus a change stream
//! ([`ValueContainer`]); mutable containers add `set` on top
//! ([`StateContainer`]). Derived containers implement the same traits
//! directly, so capabilities compose through the type system instead of
//! runtime property mixing.

use crate::apply::NewValue;
use crate::cell::Subscription;

/// Read-only access to a current value and its change stream.
///
/// Invariant: `value()` always equals the last value delivered to
/// subscribers (or the initial value if none was delivered yet), and every
/// new subscriber receives the current value synchronously on subscription.
pub trait ValueContainer<T> {
    /// Snapshot of the current value.
    fn value(&self) -> T;

    /// Register a change subscriber.
    ///
    /// The callback is invoked synchronously with the current value before
    /// this returns, then once per accepted update.
    fn subscribe<F>(&self, subscriber: F) -> Subscription
    where
        F: FnMut(&T) + Send + 'static;
}

/// A [`ValueContainer`] that accepts updates.
pub trait StateContainer<T>: ValueContainer<T> {
    /// Apply an update through this container's apply policy.
    ///
    /// All active subscribers are notified before this returns, unless the
    /// container's needs-feeding guard vetoes the update.
    fn set_value(&self, new_value: NewValue<T>);
}

/// Convenience methods available on every [`StateContainer`].
pub trait StateContainerExt<T>: StateContainer<T> {
    /// Set from anything convertible into a [`NewValue`].
    fn set(&self, new_value: impl Into<NewValue<T>>) {
        self.set_value(new_value.into());
    }

    /// Set using an updater function of the current value.
    fn update<F>(&self, updater: F)
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        self.set_value(NewValue::compute(updater));
    }
}

impl<T, S: StateContainer<T>> StateContainerExt<T> for S {}
