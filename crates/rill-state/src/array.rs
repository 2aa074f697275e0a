//! Updater builders for `Vec` values.
//!
//! Each function returns an owned-input updater suitable for
//! [`StateContainerExt::update`](crate::container::StateContainerExt::update)
//! or [`NewValue::compute`](crate::apply::NewValue::compute) on a container
//! holding a `Vec<T>`.
//!
//! # Examples
//!
//! ```
//! use rill_state::{array, State, StateContainerExt, ValueContainer};
//!
//! let tags = State::new(vec!["a".to_string(), "b".to_string()]);
//! tags.update(array::add_item("c".to_string()));
//! tags.update(array::remove_item("a".to_string()));
//! assert_eq!(tags.value(), vec!["b".to_string(), "c".to_string()]);
//! ```

/// Append one item.
pub fn add_item<T: Send + 'static>(item: T) -> impl FnOnce(Vec<T>) -> Vec<T> + Send + 'static {
    move |mut items| {
        items.push(item);
        items
    }
}

/// Remove every item equal to `item`. Absence is a no-op.
pub fn remove_item<T>(item: T) -> impl FnOnce(Vec<T>) -> Vec<T> + Send + 'static
where
    T: PartialEq + Send + 'static,
{
    move |mut items| {
        items.retain(|candidate| *candidate != item);
        items
    }
}

/// Remove every item matching the predicate.
pub fn remove_items<T, P>(predicate: P) -> impl FnOnce(Vec<T>) -> Vec<T> + Send + 'static
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + 'static,
{
    move |mut items| {
        items.retain(|candidate| !predicate(candidate));
        items
    }
}

/// Replace every item matching the predicate with a clone of `replacement`.
/// Items that match nothing are left in place; no match is a no-op.
pub fn replace_items<T, P>(
    predicate: P,
    replacement: T,
) -> impl FnOnce(Vec<T>) -> Vec<T> + Send + 'static
where
    T: Clone + Send + 'static,
    P: Fn(&T) -> bool + Send + 'static,
{
    move |mut items| {
        for slot in items.iter_mut() {
            if predicate(slot) {
                *slot = replacement.clone();
            }
        }
        items
    }
}

/// Replace every item matching the predicate, or append `item` when nothing
/// matches. Useful for keyed upserts.
pub fn add_or_replace_item<T, P>(
    predicate: P,
    item: T,
) -> impl FnOnce(Vec<T>) -> Vec<T> + Send + 'static
where
    T: Clone + Send + 'static,
    P: Fn(&T) -> bool + Send + 'static,
{
    move |mut items| {
        let mut replaced = false;
        for slot in items.iter_mut() {
            if predicate(slot) {
                *slot = item.clone();
                replaced = true;
            }
        }
        if !replaced {
            items.push(item);
        }
        items
    }
}

/// Rewrite every item matching the predicate through `update`.
pub fn update_items<T, P, U>(
    predicate: P,
    update: U,
) -> impl FnOnce(Vec<T>) -> Vec<T> + Send + 'static
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + 'static,
    U: Fn(T) -> T + Send + 'static,
{
    move |items| {
        items
            .into_iter()
            .map(|item| if predicate(&item) { update(item) } else { item })
            .collect()
    }
}
