//! Path-addressed edits on `serde_json::Value` documents.
//!
//! All edit functions mutate the document in place, leaving untouched
//! siblings exactly as they were. `set_at` creates missing intermediate
//! objects along key segments; index segments never create anything and
//! must address an existing element.

use crate::error::{value_type_name, EditError, EditResult};
use crate::path::{Path, Seg};
use serde_json::{Map, Value};

/// Read the value at a path. `None` when any segment is missing.
///
/// # Examples
///
/// ```
/// use rill_edit::{get_at, path};
/// use serde_json::json;
///
/// let doc = json!({"users": [{"name": "ada"}]});
/// assert_eq!(get_at(&doc, &path!("users", 0, "name")), Some(&json!("ada")));
/// assert_eq!(get_at(&doc, &path!("users", 1)), None);
/// ```
pub fn get_at<'a>(doc: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = doc;
    for seg in path {
        current = match seg {
            Seg::Key(key) => current.get(key)?,
            Seg::Index(index) => current.get(index)?,
        };
    }
    Some(current)
}

/// Write `value` at `path`, creating missing intermediate objects along
/// key segments. Replaces the whole document when `path` is the root.
///
/// # Examples
///
/// ```
/// use rill_edit::{path, set_at};
/// use serde_json::json;
///
/// let mut doc = json!({});
/// set_at(&mut doc, &path!("a", "b"), json!(1)).unwrap();
/// assert_eq!(doc, json!({"a": {"b": 1}}));
/// ```
pub fn set_at(doc: &mut Value, path: &Path, value: Value) -> EditResult<()> {
    set_segments(doc, path.segments(), value, path)
}

fn set_segments(current: &mut Value, segments: &[Seg], value: Value, path: &Path) -> EditResult<()> {
    match segments {
        [] => {
            *current = value;
            Ok(())
        }
        [Seg::Key(key), rest @ ..] => {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let entry = current
                .as_object_mut()
                .unwrap()
                .entry(key.clone())
                .or_insert(Value::Null);
            set_segments(entry, rest, value, path)
        }
        [Seg::Index(index), rest @ ..] => {
            if !current.is_array() {
                return Err(EditError::type_mismatch(
                    path.clone(),
                    "array",
                    value_type_name(current),
                ));
            }
            let arr = current.as_array_mut().unwrap();
            let len = arr.len();
            let slot = arr
                .get_mut(*index)
                .ok_or_else(|| EditError::index_out_of_bounds(path.clone(), *index, len))?;
            set_segments(slot, rest, value, path)
        }
    }
}

/// Rewrite the value at `path` through `update`. The path must exist.
pub fn update_at(
    doc: &mut Value,
    path: &Path,
    update: impl FnOnce(Value) -> Value,
) -> EditResult<()> {
    let target =
        locate_mut(doc, path.segments()).ok_or_else(|| EditError::path_not_found(path.clone()))?;
    let current = target.take();
    *target = update(current);
    Ok(())
}

/// Remove the value at `path`. Returns whether anything was removed; a
/// missing path is a no-op. Deleting the root resets the document to null.
pub fn delete_at(doc: &mut Value, path: &Path) -> bool {
    match path.segments() {
        [] => {
            *doc = Value::Null;
            true
        }
        segments => delete_segments(doc, segments),
    }
}

fn delete_segments(current: &mut Value, segments: &[Seg]) -> bool {
    match segments {
        [] => false,
        [Seg::Key(key)] => current
            .as_object_mut()
            .map_or(false, |obj| obj.remove(key).is_some()),
        [Seg::Index(index)] => current.as_array_mut().map_or(false, |arr| {
            if *index < arr.len() {
                arr.remove(*index);
                true
            } else {
                false
            }
        }),
        [Seg::Key(key), rest @ ..] => current
            .as_object_mut()
            .and_then(|obj| obj.get_mut(key))
            .map_or(false, |child| delete_segments(child, rest)),
        [Seg::Index(index), rest @ ..] => current
            .as_array_mut()
            .and_then(|arr| arr.get_mut(*index))
            .map_or(false, |child| delete_segments(child, rest)),
    }
}

/// Shallow-merge an object into the object at `path`, overwriting
/// colliding keys. Creates an empty object at the path if nothing (or
/// null) is there.
pub fn merge_at(doc: &mut Value, path: &Path, value: Value) -> EditResult<()> {
    let patch = match value {
        Value::Object(patch) => patch,
        _ => return Err(EditError::merge_requires_object(path.clone())),
    };

    let target = get_or_create(doc, path, 0, || Value::Object(Map::new()))?;
    match target {
        Value::Object(obj) => {
            for (key, value) in patch {
                obj.insert(key, value);
            }
            Ok(())
        }
        other => Err(EditError::type_mismatch(
            path.clone(),
            "object",
            value_type_name(other),
        )),
    }
}

/// Push a value onto the array at `path`. Creates an empty array at the
/// path if nothing (or null) is there.
pub fn append_at(doc: &mut Value, path: &Path, value: Value) -> EditResult<()> {
    let target = get_or_create(doc, path, 0, || Value::Array(Vec::new()))?;
    match target {
        Value::Array(arr) => {
            arr.push(value);
            Ok(())
        }
        other => Err(EditError::type_mismatch(
            path.clone(),
            "array",
            value_type_name(other),
        )),
    }
}

/// Insert a value at `index` in the array at `path`. `index == len`
/// appends.
pub fn insert_at(doc: &mut Value, path: &Path, index: usize, value: Value) -> EditResult<()> {
    let target =
        locate_mut(doc, path.segments()).ok_or_else(|| EditError::path_not_found(path.clone()))?;
    match target {
        Value::Array(arr) => {
            if index > arr.len() {
                return Err(EditError::index_out_of_bounds(path.clone(), index, arr.len()));
            }
            arr.insert(index, value);
            Ok(())
        }
        other => Err(EditError::type_mismatch(
            path.clone(),
            "array",
            value_type_name(other),
        )),
    }
}

/// Remove every element equal to `value` from the array at `path`.
/// No match is a no-op.
pub fn remove_at(doc: &mut Value, path: &Path, value: &Value) -> EditResult<()> {
    let target =
        locate_mut(doc, path.segments()).ok_or_else(|| EditError::path_not_found(path.clone()))?;
    match target {
        Value::Array(arr) => {
            arr.retain(|candidate| candidate != value);
            Ok(())
        }
        other => Err(EditError::type_mismatch(
            path.clone(),
            "array",
            value_type_name(other),
        )),
    }
}

fn locate_mut<'a>(current: &'a mut Value, segments: &[Seg]) -> Option<&'a mut Value> {
    match segments {
        [] => Some(current),
        [Seg::Key(key), rest @ ..] => locate_mut(current.as_object_mut()?.get_mut(key)?, rest),
        [Seg::Index(index), rest @ ..] => {
            locate_mut(current.as_array_mut()?.get_mut(*index)?, rest)
        }
    }
}

/// Walk to `path`, creating missing objects along key segments, and
/// replace a null leaf with `default()`.
fn get_or_create<'a, F>(
    current: &'a mut Value,
    path: &Path,
    consumed: usize,
    default: F,
) -> EditResult<&'a mut Value>
where
    F: Fn() -> Value,
{
    match &path.segments()[consumed..] {
        [] => {
            if current.is_null() {
                *current = default();
            }
            Ok(current)
        }
        [Seg::Key(key), ..] => {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let entry = current
                .as_object_mut()
                .unwrap()
                .entry(key.clone())
                .or_insert(Value::Null);
            get_or_create(entry, path, consumed + 1, default)
        }
        [Seg::Index(index), ..] => {
            // Path up to and including this segment, for error reporting.
            let at = Path::from_segments(path.segments()[..=consumed].to_vec());
            if !current.is_array() {
                return Err(EditError::type_mismatch(
                    at,
                    "array",
                    value_type_name(current),
                ));
            }
            let arr = current.as_array_mut().unwrap();
            let len = arr.len();
            let slot = arr
                .get_mut(*index)
                .ok_or_else(|| EditError::index_out_of_bounds(at, *index, len))?;
            get_or_create(slot, path, consumed + 1, default)
        }
    }
}
