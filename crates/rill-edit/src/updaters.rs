//! Updater builders bridging path edits into state containers.
//!
//! Each builder wraps one edit from [`crate::edit`] as an owned-input
//! updater suitable for a container holding a `serde_json::Value`
//! (`StateContainerExt::update` or `NewValue::compute` in `rill-state`).
//!
//! Updaters are permissive where the underlying edits are fallible: an
//! edit that fails leaves the document unchanged and logs the violation,
//! since there is no caller in a subscription flow to hand the error to.
//!
//! # Examples
//!
//! ```
//! use rill_edit::{path, updaters};
//! use rill_state::{State, StateContainerExt, ValueContainer};
//! use serde_json::json;
//!
//! let doc = State::new(json!({"user": {"name": "ada"}}));
//! doc.update(updaters::set(path!("user", "age"), json!(36)));
//! doc.update(updaters::append(path!("tags"), json!("admin")));
//! assert_eq!(
//!     doc.value(),
//!     json!({"user": {"name": "ada", "age": 36}, "tags": ["admin"]}),
//! );
//! ```

use crate::edit;
use crate::error::EditResult;
use crate::path::Path;
use rill_state::{ApplyValue, NewValue};
use serde_json::Value;
use std::sync::Arc;

/// Run a fallible edit in place, rolling back to a pristine copy on
/// failure so a rejected edit cannot leave a half-modified document.
/// Successful edits keep every untouched sibling's allocation.
fn permissive(mut doc: Value, apply: impl FnOnce(&mut Value) -> EditResult<()>) -> Value {
    let backup = doc.clone();
    match apply(&mut doc) {
        Ok(()) => doc,
        Err(error) => {
            tracing::debug!(%error, "edit rejected, document unchanged");
            backup
        }
    }
}

/// Set the value at a path, creating missing intermediate objects.
pub fn set(path: Path, value: Value) -> impl FnOnce(Value) -> Value + Send + 'static {
    move |doc| permissive(doc, |doc| edit::set_at(doc, &path, value))
}

/// Rewrite the value at a path; a missing path leaves the document
/// unchanged.
pub fn update<F>(path: Path, update: F) -> impl FnOnce(Value) -> Value + Send + 'static
where
    F: FnOnce(Value) -> Value + Send + 'static,
{
    move |doc| permissive(doc, |doc| edit::update_at(doc, &path, update))
}

/// Shallow-merge an object into the object at a path.
pub fn merge(path: Path, value: Value) -> impl FnOnce(Value) -> Value + Send + 'static {
    move |doc| permissive(doc, |doc| edit::merge_at(doc, &path, value))
}

/// Shallow-merge a partial object into the document root: colliding keys
/// are replaced wholesale (nested objects are not merged), others are
/// left untouched.
pub fn shallow_merge(partial: Value) -> impl FnOnce(Value) -> Value + Send + 'static {
    merge(Path::root(), partial)
}

/// Delete the value at a path; a missing path is a no-op.
pub fn delete(path: Path) -> impl FnOnce(Value) -> Value + Send + 'static {
    move |mut doc| {
        edit::delete_at(&mut doc, &path);
        doc
    }
}

/// Append to the array at a path, creating it if absent.
pub fn append(path: Path, value: Value) -> impl FnOnce(Value) -> Value + Send + 'static {
    move |doc| permissive(doc, |doc| edit::append_at(doc, &path, value))
}

/// Insert into the array at a path at `index`.
pub fn insert(path: Path, index: usize, value: Value) -> impl FnOnce(Value) -> Value + Send + 'static {
    move |doc| permissive(doc, |doc| edit::insert_at(doc, &path, index, value))
}

/// Remove every matching element from the array at a path.
pub fn remove(path: Path, value: Value) -> impl FnOnce(Value) -> Value + Send + 'static {
    move |doc| permissive(doc, |doc| edit::remove_at(doc, &path, &value))
}

/// An apply policy for `Value` states where setting an object value
/// shallow-merges it into the current object instead of replacing it.
///
/// Non-object values (and object values over a non-object current value)
/// replace as usual, and updaters run unchanged. Pass the result to a
/// container's apply-policy slot.
///
/// # Examples
///
/// ```
/// use rill_edit::updaters::object_merge_apply;
/// use rill_state::{State, StateContainerExt, ValueContainer};
/// use serde_json::json;
///
/// let doc = State::with_apply(json!({"a": 1}), object_merge_apply());
/// doc.set(json!({"b": 2}));
/// assert_eq!(doc.value(), json!({"a": 1, "b": 2}));
/// ```
pub fn object_merge_apply() -> ApplyValue<Value> {
    Arc::new(|current: Value, new_value: NewValue<Value>| match new_value {
        NewValue::Compute(update) => update(current),
        NewValue::Value(next) => match (current, next) {
            (Value::Object(mut base), Value::Object(patch)) => {
                for (key, value) in patch {
                    base.insert(key, value);
                }
                Value::Object(base)
            }
            (_, next) => next,
        },
    })
}
