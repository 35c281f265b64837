//! Observable trait and the operator extension trait.
//!
//! An observable is a lazy description of a stream: nothing happens until an
//! observer is handed to [`Observable::actual_subscribe`]. Operators are plain
//! structs wrapping their upstream, built through [`ObservableExt`].

use std::{marker::PhantomData, time::Duration};

use crate::{
  observer::Observer,
  ops::{
    delay::DelaySubscriptionOp,
    sample::{Latest, OnChange, SampleOp},
    take_time::TakeTimeOp,
    throttle::ThrottleOp,
  },
  subscription::{Subscription, SubscriptionWrapper},
};

pub mod interval;
pub mod observable_all;
pub mod subscribe_item;

pub use interval::{interval, IntervalObservable};
pub use observable_all::ObserverAll;
pub use subscribe_item::ObserverItem;

/// A stream producer that can be subscribed by an observer of type `O`.
///
/// Subscribing never fails. Problems are reported through
/// [`Observer::error`], and the producer delivers at most one terminal
/// notification to each observer.
pub trait Observable<Item, Err, O>
where
  O: Observer<Item, Err>,
{
  /// A type implementing [`Subscription`]
  type Unsub: Subscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

pub trait ObservableExt<Item, Err>: Sized {
  /// Emits a value only after `duration` has passed without another value
  /// arriving (trailing-edge debounce). A pending value is flushed when the
  /// source completes and discarded when it errors.
  ///
  /// ```
  /// use rxtime::prelude::*;
  ///
  /// let scheduler = TestScheduler::default();
  /// let xs = scheduler.hot::<i32, ()>(vec![next(210, 1), next(215, 2), completed(300)]);
  /// let s = scheduler.clone();
  /// let res = scheduler.start(move || xs.throttle(Duration::from_millis(20), s));
  /// assert_eq!(res, vec![next(235, 2), completed(300)]);
  /// ```
  fn throttle<SD>(self, duration: Duration, scheduler: SD) -> ThrottleOp<Self, SD> {
    ThrottleOp { source: self, scheduler, duration }
  }

  /// Emits the most recent source value each time `sampler` emits, but only
  /// if the source produced something new since the previous sample.
  fn sample<N, NItem>(self, sampler: N) -> SampleOp<Self, N, OnChange, NItem>
  where
    N: ObservableExt<NItem, Err>,
  {
    SampleOp::new(self, sampler, OnChange)
  }

  /// Like [`ObservableExt::sample`] without the change gate: every sampler
  /// tick repeats the latest value once one has been received.
  fn sample_latest<N, NItem>(self, sampler: N) -> SampleOp<Self, N, Latest, NItem>
  where
    N: ObservableExt<NItem, Err>,
  {
    SampleOp::new(self, sampler, Latest)
  }

  /// Mirrors the source until `duration` elapses, then completes.
  fn take_time<SD>(self, duration: Duration, scheduler: SD) -> TakeTimeOp<Self, SD> {
    TakeTimeOp { source: self, duration, scheduler }
  }

  /// Subscribes to the source only after `delay`.
  fn delay_subscription<SD>(self, delay: Duration, scheduler: SD) -> DelaySubscriptionOp<Self, SD> {
    DelaySubscriptionOp { source: self, delay, scheduler }
  }

  /// Invokes an execution of an Observable and registers a handler for its
  /// values. Errors are dropped; use [`ObservableExt::subscribe_err`] to see
  /// them.
  fn subscribe<N>(
    self,
    next: N,
  ) -> SubscriptionWrapper<<Self as Observable<Item, Err, ObserverItem<N>>>::Unsub>
  where
    N: FnMut(Item),
    Self: Observable<Item, Err, ObserverItem<N>>,
  {
    SubscriptionWrapper(self.actual_subscribe(ObserverItem::new(next)))
  }

  /// Like [`ObservableExt::subscribe`], with an error handler.
  #[allow(clippy::type_complexity)]
  fn subscribe_err<N, E>(
    self,
    next: N,
    error: E,
  ) -> SubscriptionWrapper<<Self as Observable<Item, Err, ObserverAll<N, E, fn()>>>::Unsub>
  where
    N: FnMut(Item),
    E: FnOnce(Err),
    Self: Observable<Item, Err, ObserverAll<N, E, fn()>>,
  {
    let complete: fn() = || {};
    SubscriptionWrapper(self.actual_subscribe(ObserverAll::new(next, error, complete)))
  }

  /// Invokes an execution of an Observable and registers Observer handlers for
  /// notifications it will emit.
  ///
  /// * `error`: A handler for a terminal event resulting from an error.
  /// * `complete`: A handler for a terminal event resulting from successful
  ///   completion.
  fn subscribe_all<N, E, C>(
    self,
    next: N,
    error: E,
    complete: C,
  ) -> SubscriptionWrapper<<Self as Observable<Item, Err, ObserverAll<N, E, C>>>::Unsub>
  where
    N: FnMut(Item),
    E: FnOnce(Err),
    C: FnOnce(),
    Self: Observable<Item, Err, ObserverAll<N, E, C>>,
  {
    SubscriptionWrapper(self.actual_subscribe(ObserverAll::new(next, error, complete)))
  }
}

/// Marker used by operators that carry the item type of a secondary stream.
pub(crate) type ItemMarker<T> = PhantomData<fn() -> T>;
