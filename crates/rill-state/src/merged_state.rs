//! A state combining two parent states into one value.

use crate::apply::{apply_new_value, ApplyValue, NeedsFeeding, NewValue};
use crate::cell::{Subscription, ValueCell};
use crate::container::{StateContainer, ValueContainer};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type MergeFn<V1, V2, M> = Arc<dyn Fn(&V1, &V2) -> M + Send + Sync>;
type SplitFn<M, V1, V2> = Arc<dyn Fn(M) -> (V1, V2) + Send + Sync>;
type Compare<M> = Arc<dyn Fn(&M, &M) -> bool + Send + Sync>;

/// A state whose value combines exactly two parent states.
///
/// `merge` builds the combined value from the two parents; `split`
/// decomposes a combined value back into per-side values. The two are
/// expected to be mutual inverses for values `merge` can produce; the
/// library does not check this.
///
/// The change stream behaves like a combine-latest of the parents: one
/// emission when both parents have replayed, then one per parent emission,
/// deduplicated through the optional compare function.
///
/// Writes re-read both parent values at set time, apply the policy, split,
/// and feed each side unless that side's needs-feeding guard reports the
/// split value as not worth writing — the knob that breaks feedback loops
/// between interdependent states.
pub struct MergedState<P1, P2, V1, V2, M> {
    first: P1,
    second: P2,
    merge: MergeFn<V1, V2, M>,
    split: SplitFn<M, V1, V2>,
    compare: Option<Compare<M>>,
    apply: ApplyValue<M>,
    feed_first: Option<NeedsFeeding<V1>>,
    feed_second: Option<NeedsFeeding<V2>>,
    _values: PhantomData<fn() -> (V1, V2, M)>,
}

impl<P1: Clone, P2: Clone, V1, V2, M> Clone for MergedState<P1, P2, V1, V2, M> {
    fn clone(&self) -> Self {
        Self {
            first: self.first.clone(),
            second: self.second.clone(),
            merge: self.merge.clone(),
            split: self.split.clone(),
            compare: self.compare.clone(),
            apply: self.apply.clone(),
            feed_first: self.feed_first.clone(),
            feed_second: self.feed_second.clone(),
            _values: PhantomData,
        }
    }
}

impl<P1, P2, V1, V2, M> MergedState<P1, P2, V1, V2, M>
where
    P1: StateContainer<V1> + Clone + Send + Sync + 'static,
    P2: StateContainer<V2> + Clone + Send + Sync + 'static,
    V1: Clone + Send + 'static,
    V2: Clone + Send + 'static,
    M: Clone + Send + 'static,
{
    /// Combine two parent states through a merge/split pair.
    pub fn new(
        first: P1,
        second: P2,
        merge: impl Fn(&V1, &V2) -> M + Send + Sync + 'static,
        split: impl Fn(M) -> (V1, V2) + Send + Sync + 'static,
    ) -> Self {
        Self {
            first,
            second,
            merge: Arc::new(merge),
            split: Arc::new(split),
            compare: None,
            apply: apply_new_value(),
            feed_first: None,
            feed_second: None,
            _values: PhantomData,
        }
    }

    /// Install a comparison used to drop emissions whose merged value is
    /// unchanged. Without one, every parent emission is forwarded.
    pub fn with_compare(mut self, compare: impl Fn(&M, &M) -> bool + Send + Sync + 'static) -> Self {
        self.compare = Some(Arc::new(compare));
        self
    }

    /// Drop emissions whose merged value equals the previous one.
    pub fn deduped(self) -> Self
    where
        M: PartialEq,
    {
        self.with_compare(|previous, current| previous == current)
    }

    /// Replace the apply policy used for incoming merged-value updates.
    pub fn with_apply(mut self, apply: ApplyValue<M>) -> Self {
        self.apply = apply;
        self
    }

    /// Guard writes to the first parent: feed only when the guard returns
    /// `true` for `(current, split value)`.
    pub fn with_needs_feeding_first<F>(mut self, guard: F) -> Self
    where
        F: Fn(&V1, &V1) -> bool + Send + Sync + 'static,
    {
        self.feed_first = Some(Arc::new(guard));
        self
    }

    /// Guard writes to the second parent: feed only when the guard returns
    /// `true` for `(current, split value)`.
    pub fn with_needs_feeding_second<F>(mut self, guard: F) -> Self
    where
        F: Fn(&V2, &V2) -> bool + Send + Sync + 'static,
    {
        self.feed_second = Some(Arc::new(guard));
        self
    }
}

impl<P1, P2, V1, V2, M> ValueContainer<M> for MergedState<P1, P2, V1, V2, M>
where
    P1: StateContainer<V1> + Clone + Send + Sync + 'static,
    P2: StateContainer<V2> + Clone + Send + Sync + 'static,
    V1: Clone + Send + 'static,
    V2: Clone + Send + 'static,
    M: Clone + Send + 'static,
{
    fn value(&self) -> M {
        (self.merge)(&self.first.value(), &self.second.value())
    }

    fn subscribe<F>(&self, subscriber: F) -> Subscription
    where
        F: FnMut(&M) + Send + 'static,
    {
        // Route emissions through a dedicated cell so re-entrant parent
        // writes from inside the subscriber ride the cell's queue instead of
        // recursing into the callback.
        let output = ValueCell::new(self.value());
        let output_sub = output.subscribe(subscriber);

        let started = Arc::new(AtomicBool::new(false));
        let recompute = {
            let first = self.first.clone();
            let second = self.second.clone();
            let merge = Arc::clone(&self.merge);
            let compare = self.compare.clone();
            let started = Arc::clone(&started);
            let output = output.clone();
            move || {
                if !started.load(Ordering::Acquire) {
                    return;
                }
                let merged = merge(&first.value(), &second.value());
                if let Some(compare) = &compare {
                    if compare(&output.value(), &merged) {
                        return;
                    }
                }
                output.publish(merged);
            }
        };

        let first_sub = {
            let recompute = recompute.clone();
            self.first.subscribe(move |_| recompute())
        };
        let second_sub = {
            let recompute = recompute.clone();
            self.second.subscribe(move |_| recompute())
        };
        // Parent replays were absorbed by the seeded output cell; from here
        // on every parent emission recomputes.
        started.store(true, Ordering::Release);

        output_sub.merge(first_sub).merge(second_sub)
    }
}

impl<P1, P2, V1, V2, M> StateContainer<M> for MergedState<P1, P2, V1, V2, M>
where
    P1: StateContainer<V1> + Clone + Send + Sync + 'static,
    P2: StateContainer<V2> + Clone + Send + Sync + 'static,
    V1: Clone + Send + 'static,
    V2: Clone + Send + 'static,
    M: Clone + Send + 'static,
{
    fn set_value(&self, new_value: NewValue<M>) {
        // Re-read both parents here: values captured before the call could
        // be stale if either parent updated in between.
        let current_first = self.first.value();
        let current_second = self.second.value();
        let current = (self.merge)(&current_first, &current_second);
        let applied = (self.apply)(current, new_value);
        let (split_first, split_second) = (self.split)(applied);

        let feed_first = self
            .feed_first
            .as_ref()
            .map_or(true, |guard| guard(&current_first, &split_first));
        let feed_second = self
            .feed_second
            .as_ref()
            .map_or(true, |guard| guard(&current_second, &split_second));

        if feed_first {
            self.first.set_value(NewValue::Value(split_first));
        }
        if feed_second {
            self.second.set_value(NewValue::Value(split_second));
        }
    }
}
