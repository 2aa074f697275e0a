//! Reactive state containers with synchronous, replaying change streams.
//!
//! The crate is built around one contract, [`ValueContainer`]: a current
//! value plus a subscription stream that replays that value to every new
//! subscriber and then delivers every subsequent change synchronously, in
//! publish order. [`StateContainer`] adds writing through a pluggable
//! apply policy.
//!
//! Containers compose:
//!
//! - [`State`] owns a value directly.
//! - [`SubState`] projects a slice out of a parent container and writes
//!   back through it.
//! - [`MergedState`] combines two parent containers into one value and
//!   splits writes back to both.
//! - [`AsyncLoadableState`] wraps any state container so `set` also
//!   accepts futures and streams, with load-status tracking.
//!
//! All containers are cheap to clone; clones share the same underlying
//! value and subscriber list.
//!
//! # Examples
//!
//! ```
//! use rill_state::{State, StateContainerExt, SubState, ValueContainer};
//!
//! #[derive(Clone, PartialEq)]
//! struct Settings {
//!     volume: u8,
//!     muted: bool,
//! }
//!
//! let settings = State::new(Settings { volume: 40, muted: false });
//! let volume = SubState::new(
//!     settings.clone(),
//!     |s: &Settings| s.volume,
//!     |s, volume| Settings { volume, ..s.clone() }.into(),
//! );
//!
//! volume.set(80);
//! assert_eq!(settings.value().volume, 80);
//!
//! settings.update(|s| Settings { volume: 15, ..s });
//! assert_eq!(volume.value(), 15);
//! ```

pub mod apply;
pub mod array;
pub mod cell;
pub mod container;
pub mod loadable;
pub mod merged_state;
pub mod state;
pub mod sub_state;

pub use apply::{
    apply_new_value, extend_apply_value, ApplyExtension, ApplyValue, NeedsFeeding, NewValue,
};
pub use cell::{Subscription, ValueCell};
pub use container::{StateContainer, StateContainerExt, ValueContainer};
pub use loadable::{AsyncLoadableState, OverallSetStatus, SetStatus};
pub use merged_state::MergedState;
pub use state::State;
pub use sub_state::SubState;
