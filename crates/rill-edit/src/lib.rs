//! Path-addressed edits for JSON documents held in state containers.
//!
//! `rill-edit` pairs with `rill-state` for the common case of a container
//! holding a `serde_json::Value` document. It provides:
//!
//! - [`Path`]/[`Seg`] and the [`path!`] macro: explicit, serializable
//!   descriptors of a location in a document.
//! - [`edit`]: pure in-place edit functions (`set_at`, `update_at`,
//!   `merge_at`, array edits) that report failures as [`EditError`].
//! - [`updaters`]: the same edits packaged as owned-input updaters for
//!   `StateContainerExt::update`, plus an apply policy that merges object
//!   values instead of replacing them.
//!
//! Edits touch only the spine of the path they address; sibling subtrees
//! keep their allocations.
//!
//! # Examples
//!
//! ```
//! use rill_edit::{get_at, path, set_at};
//! use serde_json::json;
//!
//! let mut doc = json!({"users": [{"name": "ada"}]});
//! set_at(&mut doc, &path!("users", 0, "age"), json!(36))?;
//! assert_eq!(get_at(&doc, &path!("users", 0, "age")), Some(&json!(36)));
//! # Ok::<(), rill_edit::EditError>(())
//! ```

pub mod edit;
pub mod error;
pub mod path;
pub mod updaters;

pub use edit::{append_at, delete_at, get_at, insert_at, merge_at, remove_at, set_at, update_at};
pub use error::{value_type_name, EditError, EditResult};
pub use path::{Path, Seg};
