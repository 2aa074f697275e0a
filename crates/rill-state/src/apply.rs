//! Update inputs and apply policies.
//!
//! A `set` call carries a [`NewValue`]: either a replacement value or an
//! updater function of the current value. An [`ApplyValue`] policy decides how
//! that input becomes the next stored value; policies compose through
//! [`ApplyExtension`] wrappers, outermost first.

use std::sync::Arc;

/// An update input accepted by any state container's `set`.
///
/// Updaters take the current value **by value** and return the next one, so
/// branches they do not touch keep their allocations.
pub enum NewValue<T> {
    /// Replace the current value.
    Value(T),
    /// Compute the next value from the current one.
    Compute(Box<dyn FnOnce(T) -> T + Send>),
}

impl<T> NewValue<T> {
    /// Wrap a replacement value.
    #[inline]
    pub fn value(value: T) -> Self {
        NewValue::Value(value)
    }

    /// Wrap an updater function of the current value.
    #[inline]
    pub fn compute<F>(updater: F) -> Self
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        NewValue::Compute(Box::new(updater))
    }

    /// Resolve this input against the current value (replace semantics).
    ///
    /// This is what the default policy does: run updaters, take plain values
    /// as-is.
    pub fn apply(self, current: T) -> T {
        match self {
            NewValue::Value(value) => value,
            NewValue::Compute(updater) => updater(current),
        }
    }
}

impl<T> From<T> for NewValue<T> {
    fn from(value: T) -> Self {
        NewValue::Value(value)
    }
}

impl<T> std::fmt::Debug for NewValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NewValue::Value(_) => f.write_str("NewValue::Value"),
            NewValue::Compute(_) => f.write_str("NewValue::Compute"),
        }
    }
}

/// Policy turning `(current, input)` into the next stored value.
pub type ApplyValue<T> = Arc<dyn Fn(T, NewValue<T>) -> T + Send + Sync>;

/// Wrapper able to intercept an [`ApplyValue`] before/after delegating to the
/// next policy in the chain.
pub type ApplyExtension<T> = Arc<dyn Fn(ApplyValue<T>) -> ApplyValue<T> + Send + Sync>;

/// Predicate gating an update: `(current, candidate) -> bool`.
///
/// Returning `false` vetoes the update: nothing is stored and nothing is
/// emitted. Absence of a guard means "always feed".
pub type NeedsFeeding<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// The default apply policy: run updaters, replace with plain values.
pub fn apply_new_value<T: 'static>() -> ApplyValue<T> {
    Arc::new(|current, new_value| new_value.apply(current))
}

/// Compose extensions around a base policy, outermost extension first.
///
/// `extend_apply_value([a, b], base)` yields `a(b(base))`: when the composed
/// policy runs, `a` sees the input first and `base` last.
///
/// # Examples
///
/// ```
/// use rill_state::{apply_new_value, extend_apply_value, ApplyExtension, NewValue};
/// use std::sync::Arc;
///
/// let double: ApplyExtension<i32> = Arc::new(|next| -> rill_state::ApplyValue<i32> {
///     Arc::new(move |current, new| next(current, new) * 2)
/// });
/// let add_one: ApplyExtension<i32> = Arc::new(|next| -> rill_state::ApplyValue<i32> {
///     Arc::new(move |current, new| next(current, new) + 1)
/// });
///
/// let policy = extend_apply_value([double, add_one], apply_new_value());
/// // double runs outermost: (3 + 1) * 2
/// assert_eq!(policy(0, NewValue::value(3)), 8);
/// ```
pub fn extend_apply_value<T: 'static>(
    extensions: impl IntoIterator<Item = ApplyExtension<T>>,
    base: ApplyValue<T>,
) -> ApplyValue<T> {
    let extensions: Vec<_> = extensions.into_iter().collect();
    extensions
        .into_iter()
        .rev()
        .fold(base, |next, extension| extension(next))
}
