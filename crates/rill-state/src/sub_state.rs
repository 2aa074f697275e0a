//! Read/write projection of a slice of a parent state.

use crate::apply::{apply_new_value, ApplyValue, NewValue};
use crate::cell::Subscription;
use crate::container::{StateContainer, ValueContainer};
use std::marker::PhantomData;
use std::sync::Arc;

type Select<V, S> = Arc<dyn Fn(&V) -> S + Send + Sync>;
type Merge<V, S> = Arc<dyn Fn(&V, S) -> NewValue<V> + Send + Sync>;
type Compare<S> = Arc<dyn Fn(&S, &S) -> bool + Send + Sync>;

/// A state that is a projection of a slice of a parent state.
///
/// Reads go through `select`, writes through `merge`; the sub-state has no
/// storage of its own. `select` and `merge` are expected to round-trip
/// (`merge` reconstructing the full parent value for any sub-value `select`
/// can produce); the library does not check this.
///
/// A `SubState` is itself a [`StateContainer`], so projections nest.
///
/// # Examples
///
/// ```
/// use rill_state::{State, SubState, StateContainerExt, ValueContainer, NewValue};
///
/// let point = State::new((3, 4));
/// let x = SubState::new(
///     point.clone(),
///     |p: &(i32, i32)| p.0,
///     |p: &(i32, i32), x| NewValue::value((x, p.1)),
/// );
///
/// assert_eq!(x.value(), 3);
/// x.set(7);
/// assert_eq!(point.value(), (7, 4));
/// ```
pub struct SubState<P, V, S> {
    parent: P,
    select: Select<V, S>,
    merge: Merge<V, S>,
    compare: Option<Compare<S>>,
    apply: ApplyValue<S>,
    _values: PhantomData<fn() -> (V, S)>,
}

impl<P: Clone, V, S> Clone for SubState<P, V, S> {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            select: self.select.clone(),
            merge: self.merge.clone(),
            compare: self.compare.clone(),
            apply: self.apply.clone(),
            _values: PhantomData,
        }
    }
}

impl<P, V, S> SubState<P, V, S>
where
    P: StateContainer<V>,
    V: Clone + Send + 'static,
    S: Clone + Send + 'static,
{
    /// Create a projection of `parent`.
    ///
    /// `select` extracts the sub-value; `merge` rebuilds a parent update from
    /// the current parent value and a new sub-value.
    pub fn new(
        parent: P,
        select: impl Fn(&V) -> S + Send + Sync + 'static,
        merge: impl Fn(&V, S) -> NewValue<V> + Send + Sync + 'static,
    ) -> Self {
        Self {
            parent,
            select: Arc::new(select),
            merge: Arc::new(merge),
            compare: None,
            apply: apply_new_value(),
            _values: PhantomData,
        }
    }

    /// Install a comparison used to drop emissions whose sub-value is
    /// unchanged. Without one, every parent emission is forwarded.
    pub fn with_compare(mut self, compare: impl Fn(&S, &S) -> bool + Send + Sync + 'static) -> Self {
        self.compare = Some(Arc::new(compare));
        self
    }

    /// Drop emissions whose sub-value equals the previous one.
    pub fn deduped(self) -> Self
    where
        S: PartialEq,
    {
        self.with_compare(|previous, current| previous == current)
    }

    /// Replace the apply policy used for incoming sub-value updates.
    pub fn with_apply(mut self, apply: ApplyValue<S>) -> Self {
        self.apply = apply;
        self
    }
}

impl<P, V, S> ValueContainer<S> for SubState<P, V, S>
where
    P: StateContainer<V>,
    V: Clone + Send + 'static,
    S: Clone + Send + 'static,
{
    fn value(&self) -> S {
        (self.select)(&self.parent.value())
    }

    fn subscribe<F>(&self, mut subscriber: F) -> Subscription
    where
        F: FnMut(&S) + Send + 'static,
    {
        let select = Arc::clone(&self.select);
        let compare = self.compare.clone();
        let mut last: Option<S> = None;
        self.parent.subscribe(move |parent_value| {
            let sub_value = select(parent_value);
            if let (Some(compare), Some(last)) = (&compare, &last) {
                if compare(last, &sub_value) {
                    return;
                }
            }
            last = Some(sub_value.clone());
            subscriber(&sub_value);
        })
    }
}

impl<P, V, S> StateContainer<S> for SubState<P, V, S>
where
    P: StateContainer<V>,
    V: Clone + Send + 'static,
    S: Clone + Send + 'static,
{
    fn set_value(&self, new_value: NewValue<S>) {
        let parent_value = self.parent.value();
        let applied = (self.apply)((self.select)(&parent_value), new_value);
        self.parent.set_value((self.merge)(&parent_value, applied));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::StateContainerExt;
    use crate::state::State;
    use std::sync::{Arc as StdArc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    struct Profile {
        name: String,
        age: u32,
    }

    fn name_of(parent: &State<Profile>) -> SubState<State<Profile>, Profile, String> {
        SubState::new(
            parent.clone(),
            |p: &Profile| p.name.clone(),
            |p: &Profile, name| {
                NewValue::value(Profile {
                    name,
                    age: p.age,
                })
            },
        )
    }

    #[test]
    fn test_value_is_selected_from_parent() {
        let parent = State::new(Profile {
            name: "ada".into(),
            age: 36,
        });
        let name = name_of(&parent);
        assert_eq!(name.value(), "ada");
    }

    #[test]
    fn test_set_round_trips_through_parent() {
        let parent = State::new(Profile {
            name: "ada".into(),
            age: 36,
        });
        let name = name_of(&parent);

        name.set("grace".to_string());
        assert_eq!(name.value(), "grace");
        assert_eq!(parent.value().age, 36);
    }

    #[test]
    fn test_update_uses_current_sub_value() {
        let parent = State::new(Profile {
            name: "ada".into(),
            age: 36,
        });
        let name = name_of(&parent);

        name.update(|n| n.to_uppercase());
        assert_eq!(parent.value().name, "ADA");
    }

    #[test]
    fn test_subscribe_dedups_irrelevant_parent_changes() {
        let parent = State::new(Profile {
            name: "ada".into(),
            age: 36,
        });
        let name = name_of(&parent).deduped();

        let seen = StdArc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = name.subscribe(move |n| sink.lock().unwrap().push(n.clone()));

        // Irrelevant to the projection: no emission.
        parent.update(|mut p| {
            p.age = 37;
            p
        });
        // Relevant: one emission.
        parent.update(|mut p| {
            p.name = "grace".into();
            p
        });

        assert_eq!(*seen.lock().unwrap(), vec!["ada".to_string(), "grace".into()]);
    }

    #[test]
    fn test_without_compare_every_parent_emission_forwards() {
        let parent = State::new(Profile {
            name: "ada".into(),
            age: 36,
        });
        let name = name_of(&parent);

        let count = StdArc::new(Mutex::new(0));
        let sink = count.clone();
        let _sub = name.subscribe(move |_| *sink.lock().unwrap() += 1);

        parent.update(|mut p| {
            p.age = 37;
            p
        });
        assert_eq!(*count.lock().unwrap(), 2); // replay + forwarded emission
    }

    #[test]
    fn test_nested_sub_state() {
        let parent = State::new(Profile {
            name: "ada lovelace".into(),
            age: 36,
        });
        let name = name_of(&parent);
        let first = SubState::new(
            name.clone(),
            |n: &String| n.split(' ').next().unwrap_or("").to_string(),
            |n: &String, first| {
                let rest = n.split_once(' ').map(|(_, r)| r.to_string());
                NewValue::value(match rest {
                    Some(rest) => format!("{first} {rest}"),
                    None => first,
                })
            },
        );

        assert_eq!(first.value(), "ada");
        first.set("augusta".to_string());
        assert_eq!(parent.value().name, "augusta lovelace");
    }
}
