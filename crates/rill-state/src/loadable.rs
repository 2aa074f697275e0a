//! Async-loading wrapper around a state container.
//!
//! `AsyncLoadableState` lets `set` accept futures and streams in addition to
//! immediate values, tracking a per-call load status and an aggregate status
//! across all in-flight calls. Failures never reach the wrapped value; they
//! surface only on the status streams.

use crate::apply::NewValue;
use crate::cell::{Subscription, ValueCell};
use crate::container::{StateContainer, ValueContainer};
use futures::{Future, Stream, StreamExt};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

/// Status of a single async `set` call.
#[derive(Clone, Debug, PartialEq)]
pub struct SetStatus<E> {
    /// True from source acceptance until completion or failure.
    pub is_loading: bool,
    /// The source's error, present on the terminal event of a failed call.
    pub error: Option<E>,
}

impl<E> SetStatus<E> {
    /// Idle status (nothing loading, no error).
    #[inline]
    pub fn idle() -> Self {
        Self {
            is_loading: false,
            error: None,
        }
    }

    /// Loading-start status.
    #[inline]
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            error: None,
        }
    }

    /// Successful terminal status.
    #[inline]
    pub fn done() -> Self {
        Self {
            is_loading: false,
            error: None,
        }
    }

    /// Failed terminal status.
    #[inline]
    pub fn failed(error: E) -> Self {
        Self {
            is_loading: false,
            error: Some(error),
        }
    }
}

/// Aggregate status across all async `set` calls on one container.
///
/// `is_loading` is true while any call is pending. `errors` collects every
/// failure of the current batch — the span from the pending count leaving
/// zero until it returns to zero.
#[derive(Clone, Debug, PartialEq)]
pub struct OverallSetStatus<E> {
    /// True iff at least one async call is pending.
    pub is_loading: bool,
    /// Errors of the current batch, in failure order.
    pub errors: Vec<E>,
}

impl<E> OverallSetStatus<E> {
    /// Idle aggregate (no pending calls, no errors).
    #[inline]
    pub fn idle() -> Self {
        Self {
            is_loading: false,
            errors: Vec::new(),
        }
    }
}

struct Aggregate<E> {
    pending: usize,
    errors: Vec<E>,
    last_emitted: OverallSetStatus<E>,
}

/// A state container whose `set` also accepts futures and streams.
///
/// Immediate values and updaters pass straight through to the wrapped
/// container with no status change. Async sources go through
/// [`set_from_future`]/[`set_from_stream`], which publish a loading-start
/// status synchronously at call time and return a future the caller drives
/// (awaits or spawns); the library spawns no tasks itself.
///
/// There is no cancellation primitive: dropping an un-driven load future
/// leaves the pending count raised for good, so source lifecycle is the
/// caller's responsibility.
///
/// [`set_from_future`]: AsyncLoadableState::set_from_future
/// [`set_from_stream`]: AsyncLoadableState::set_from_stream
pub struct AsyncLoadableState<S, T, E> {
    inner: S,
    set_status: ValueCell<SetStatus<E>>,
    overall: ValueCell<OverallSetStatus<E>>,
    aggregate: Arc<Mutex<Aggregate<E>>>,
    _value: PhantomData<fn() -> T>,
}

impl<S: Clone, T, E> Clone for AsyncLoadableState<S, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            set_status: self.set_status.clone(),
            overall: self.overall.clone(),
            aggregate: Arc::clone(&self.aggregate),
            _value: PhantomData,
        }
    }
}

impl<S, T, E> AsyncLoadableState<S, T, E>
where
    S: StateContainer<T> + Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: Clone + PartialEq + Send + 'static,
{
    /// Wrap a state container.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            set_status: ValueCell::new(SetStatus::idle()),
            overall: ValueCell::new(OverallSetStatus::idle()),
            aggregate: Arc::new(Mutex::new(Aggregate {
                pending: 0,
                errors: Vec::new(),
                last_emitted: OverallSetStatus::idle(),
            })),
            _value: PhantomData,
        }
    }

    /// The wrapped container.
    #[inline]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Set from a future source.
    ///
    /// A loading-start status is published before this returns. The returned
    /// future, once driven, forwards the resolved value to the wrapped
    /// container and publishes the terminal status. A failed source leaves
    /// the wrapped value untouched.
    pub fn set_from_future<Fut>(&self, source: Fut) -> impl Future<Output = ()> + Send + 'static
    where
        Fut: Future<Output = Result<NewValue<T>, E>> + Send + 'static,
    {
        self.publish_status(SetStatus::loading());
        tracing::trace!("async set: future source accepted");
        let this = self.clone();
        async move {
            match source.await {
                Ok(new_value) => {
                    this.inner.set_value(new_value);
                    tracing::trace!("async set: future source resolved");
                    this.publish_status(SetStatus::done());
                }
                Err(error) => {
                    tracing::debug!("async set: future source failed");
                    this.publish_status(SetStatus::failed(error));
                }
            }
        }
    }

    /// Set from a stream source.
    ///
    /// Every `Ok` item is forwarded to the wrapped container individually;
    /// the first `Err` ends the load with that error. A source producing no
    /// items before completing is a successful (empty) load. Exactly one
    /// loading-start and one terminal status are published per call.
    pub fn set_from_stream<St>(&self, source: St) -> impl Future<Output = ()> + Send + 'static
    where
        St: Stream<Item = Result<NewValue<T>, E>> + Send + 'static,
    {
        self.publish_status(SetStatus::loading());
        tracing::trace!("async set: stream source accepted");
        let this = self.clone();
        async move {
            futures::pin_mut!(source);
            while let Some(item) = source.next().await {
                match item {
                    Ok(new_value) => this.inner.set_value(new_value),
                    Err(error) => {
                        tracing::debug!("async set: stream source failed");
                        this.publish_status(SetStatus::failed(error));
                        return;
                    }
                }
            }
            tracing::trace!("async set: stream source completed");
            this.publish_status(SetStatus::done());
        }
    }

    /// Current per-call status (last published).
    #[inline]
    pub fn set_status(&self) -> SetStatus<E> {
        self.set_status.value()
    }

    /// Current aggregate status.
    #[inline]
    pub fn overall_status(&self) -> OverallSetStatus<E> {
        self.overall.value()
    }

    /// True while any async `set` call is pending.
    #[inline]
    pub fn is_loading(&self) -> bool {
        self.overall_status().is_loading
    }

    /// Subscribe to per-call statuses (replays the current one).
    pub fn subscribe_set_status<F>(&self, subscriber: F) -> Subscription
    where
        F: FnMut(&SetStatus<E>) + Send + 'static,
    {
        self.set_status.subscribe(subscriber)
    }

    /// Subscribe to the aggregate status (replays the current one).
    ///
    /// Redundant identical aggregate states are not re-emitted.
    pub fn subscribe_overall_status<F>(&self, subscriber: F) -> Subscription
    where
        F: FnMut(&OverallSetStatus<E>) + Send + 'static,
    {
        self.overall.subscribe(subscriber)
    }

    /// Resolve once no async `set` call is pending.
    pub async fn settled(&self) {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _sub = self.subscribe_overall_status(move |status| {
            let _ = tx.send(status.is_loading);
        });
        while let Some(is_loading) = rx.recv().await {
            if !is_loading {
                return;
            }
        }
    }

    /// Fold one per-call status event into the aggregate and publish both.
    ///
    /// Batch rule: the error log clears when the pending count leaves zero
    /// and when a successful terminal event returns it to zero; a failing
    /// terminal event keeps the accumulated errors visible.
    fn publish_status(&self, status: SetStatus<E>) {
        let overall = {
            let mut aggregate = self.aggregate.lock().unwrap();
            if status.is_loading {
                if aggregate.pending == 0 {
                    aggregate.errors.clear();
                }
                aggregate.pending += 1;
            } else {
                aggregate.pending = aggregate.pending.saturating_sub(1);
                match &status.error {
                    Some(error) => aggregate.errors.push(error.clone()),
                    None => {
                        if aggregate.pending == 0 {
                            aggregate.errors.clear();
                        }
                    }
                }
            }
            let overall = OverallSetStatus {
                is_loading: aggregate.pending > 0,
                errors: aggregate.errors.clone(),
            };
            if aggregate.last_emitted == overall {
                None
            } else {
                aggregate.last_emitted = overall.clone();
                Some(overall)
            }
        };

        self.set_status.publish(status);
        if let Some(overall) = overall {
            self.overall.publish(overall);
        }
    }
}

impl<S, T, E> ValueContainer<T> for AsyncLoadableState<S, T, E>
where
    S: StateContainer<T> + Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: Clone + PartialEq + Send + 'static,
{
    #[inline]
    fn value(&self) -> T {
        self.inner.value()
    }

    fn subscribe<F>(&self, subscriber: F) -> Subscription
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.inner.subscribe(subscriber)
    }
}

impl<S, T, E> StateContainer<T> for AsyncLoadableState<S, T, E>
where
    S: StateContainer<T> + Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: Clone + PartialEq + Send + 'static,
{
    /// Immediate values and updaters pass straight through; no status change.
    fn set_value(&self, new_value: NewValue<T>) {
        self.inner.set_value(new_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::StateContainerExt;
    use crate::state::State;

    type Testee = AsyncLoadableState<State<i32>, i32, &'static str>;

    fn testee(initial: i32) -> Testee {
        AsyncLoadableState::new(State::new(initial))
    }

    #[test]
    fn test_sync_set_passes_through_without_status() {
        let state = testee(0);
        state.set(1);
        state.update(|v| v + 1);
        assert_eq!(state.value(), 2);
        assert_eq!(state.set_status(), SetStatus::idle());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_future_source_sets_value() {
        let state = testee(0);
        state
            .set_from_future(async { Ok(NewValue::value(5)) })
            .await;
        assert_eq!(state.value(), 5);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_future_source_with_updater() {
        let state = testee(10);
        state
            .set_from_future(async { Ok(NewValue::compute(|v: i32| v * 2)) })
            .await;
        assert_eq!(state.value(), 20);
    }

    #[tokio::test]
    async fn test_loading_starts_before_future_is_driven() {
        let state = testee(0);
        let (_tx, rx) = tokio::sync::oneshot::channel::<Result<NewValue<i32>, &'static str>>();
        let load = state.set_from_future(async move { rx.await.unwrap() });

        // Loading is visible although the future has not been polled.
        assert!(state.is_loading());
        drop(load);
    }

    #[tokio::test]
    async fn test_failed_future_leaves_value_untouched() {
        let state = testee(7);
        state
            .set_from_future(async { Err("boom") })
            .await;
        assert_eq!(state.value(), 7);
        assert_eq!(state.set_status(), SetStatus::failed("boom"));
        assert_eq!(state.overall_status().errors, vec!["boom"]);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_stream_source_forwards_each_item() {
        let state = testee(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = state.subscribe(move |v| sink.lock().unwrap().push(*v));

        let source = futures::stream::iter(vec![
            Ok(NewValue::value(1)),
            Ok(NewValue::value(2)),
            Ok(NewValue::value(3)),
        ]);
        state.set_from_stream(source).await;

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(state.set_status(), SetStatus::done());
    }

    #[tokio::test]
    async fn test_empty_stream_is_successful_load() {
        let state = testee(4);
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let sink = statuses.clone();
        let _sub = state.subscribe_set_status(move |s| sink.lock().unwrap().push(s.clone()));

        state
            .set_from_stream(futures::stream::empty::<Result<NewValue<i32>, &'static str>>())
            .await;

        assert_eq!(state.value(), 4);
        assert_eq!(
            *statuses.lock().unwrap(),
            vec![SetStatus::idle(), SetStatus::loading(), SetStatus::done()]
        );
    }

    #[tokio::test]
    async fn test_stream_error_ends_load_and_keeps_earlier_items() {
        let state = testee(0);
        let source = async_stream::stream! {
            yield Ok(NewValue::value(1));
            yield Err("late failure");
        };
        state.set_from_stream(source).await;

        assert_eq!(state.value(), 1);
        assert_eq!(state.set_status(), SetStatus::failed("late failure"));
    }

    #[tokio::test]
    async fn test_overlapping_failures_accumulate_in_resolution_order() {
        let state = testee(0);
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let sink = statuses.clone();
        let _sub = state.subscribe_overall_status(move |s| sink.lock().unwrap().push(s.clone()));

        let (tx1, rx1) = tokio::sync::oneshot::channel();
        let (tx2, rx2) = tokio::sync::oneshot::channel();
        let first = tokio::spawn(state.set_from_future(async move { rx1.await.unwrap() }));
        let second = tokio::spawn(state.set_from_future(async move { rx2.await.unwrap() }));

        tx1.send(Err("e1")).unwrap();
        first.await.unwrap();
        tx2.send(Err("e2")).unwrap();
        second.await.unwrap();

        let expected = vec![
            OverallSetStatus::idle(),
            OverallSetStatus {
                is_loading: true,
                errors: vec![],
            },
            OverallSetStatus {
                is_loading: true,
                errors: vec!["e1"],
            },
            OverallSetStatus {
                is_loading: false,
                errors: vec!["e1", "e2"],
            },
        ];
        assert_eq!(*statuses.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_errors_reset_once_batch_settles_successfully() {
        let state = testee(0);

        let (tx1, rx1) = tokio::sync::oneshot::channel();
        let (tx2, rx2) = tokio::sync::oneshot::channel();
        let failing = tokio::spawn(state.set_from_future(async move { rx1.await.unwrap() }));
        let succeeding = tokio::spawn(state.set_from_future(async move { rx2.await.unwrap() }));

        tx1.send(Err("e")).unwrap();
        failing.await.unwrap();
        assert_eq!(state.overall_status().errors, vec!["e"]);
        assert!(state.is_loading());

        tx2.send(Ok(NewValue::value(1))).unwrap();
        succeeding.await.unwrap();
        assert_eq!(state.overall_status(), OverallSetStatus::idle());
    }

    #[tokio::test]
    async fn test_new_batch_clears_previous_errors() {
        let state = testee(0);
        state.set_from_future(async { Err("old") }).await;
        assert_eq!(state.overall_status().errors, vec!["old"]);

        let (tx, rx) = tokio::sync::oneshot::channel::<Result<NewValue<i32>, &'static str>>();
        let load = tokio::spawn(state.set_from_future(async move { rx.await.unwrap() }));
        assert_eq!(
            state.overall_status(),
            OverallSetStatus {
                is_loading: true,
                errors: vec![],
            }
        );
        tx.send(Ok(NewValue::value(1))).unwrap();
        load.await.unwrap();
    }

    #[tokio::test]
    async fn test_settled_waits_for_pending_loads() {
        let state = testee(0);
        let (tx, rx) = tokio::sync::oneshot::channel();
        let load = tokio::spawn(state.set_from_future(async move { rx.await.unwrap() }));

        let waiter = {
            let state = state.clone();
            tokio::spawn(async move { state.settled().await })
        };
        tx.send(Ok(NewValue::value(9))).unwrap();
        load.await.unwrap();
        waiter.await.unwrap();
        assert_eq!(state.value(), 9);
    }

    #[tokio::test]
    async fn test_settled_returns_immediately_when_idle() {
        let state = testee(0);
        state.settled().await;
    }
}
