//! Recording harness for virtual-time tests.
//!
//! Scripted [`HotObservable`] and [`ColdObservable`] sources feed a pipeline,
//! a [`TestObserver`] records what comes out, and the `start*` drivers on
//! [`TestScheduler`] run the whole thing on the virtual clock:
//!
//! ```
//! use rxtime::prelude::*;
//!
//! let scheduler = TestScheduler::default();
//! let xs = scheduler.cold::<i32, ()>(vec![next(50, 42), completed(70)]);
//! let (c_xs, s) = (xs.clone(), scheduler.clone());
//! let res = scheduler.start(move || c_xs.delay_subscription(Duration::from_millis(30), s));
//!
//! assert_eq!(res, vec![next(280, 42), completed(300)]);
//! assert_eq!(xs.subscriptions(), vec![SubscriptionInterval::new(230, 300)]);
//! ```

use tracing::debug;

use crate::{
  observable::Observable,
  rc::{MutArc, RcDerefMut},
  scheduler::{TestScheduler, VirtualTime},
  subscription::Subscription,
};

pub mod cold_observable;
pub mod hot_observable;
pub mod recorded;
pub mod test_observer;

pub use cold_observable::{ColdObservable, ColdSubscription};
pub use hot_observable::{HotObservable, HotSubscription};
pub use recorded::{completed, error, next, Notification, Recorded, SubscriptionInterval};
pub use test_observer::TestObserver;

/// Virtual instants used by [`TestScheduler::start_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartTimes {
  /// The factory runs here.
  pub created: VirtualTime,
  /// The recording observer subscribes here.
  pub subscribed: VirtualTime,
  /// The subscription is disposed here.
  pub disposed: VirtualTime,
}

impl Default for StartTimes {
  fn default() -> Self { StartTimes { created: 100, subscribed: 200, disposed: 1000 } }
}

impl TestScheduler {
  /// A hot source. Messages are scheduled at their absolute times right away;
  /// those already in the past are dropped.
  pub fn hot<Item, Err>(&self, messages: Vec<Recorded<Item, Err>>) -> HotObservable<Item, Err>
  where
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    HotObservable::new(self, messages)
  }

  /// A cold source. Message times are offsets from each subscription.
  pub fn cold<Item, Err>(&self, messages: Vec<Recorded<Item, Err>>) -> ColdObservable<Item, Err> {
    ColdObservable::new(self, messages)
  }

  pub fn create_observer<Item, Err>(&self) -> TestObserver<Item, Err> {
    TestObserver::new(self.clone())
  }

  /// Runs `create` at tick 100, subscribes at 200, disposes at 1000, then
  /// drains the queue and returns what the observer recorded.
  ///
  /// # Panics
  ///
  /// Panics if the clock is already past tick 100.
  pub fn start<Item, Err, S, F>(&self, create: F) -> Vec<Recorded<Item, Err>>
  where
    F: FnOnce() -> S + Send + 'static,
    S: Observable<Item, Err, TestObserver<Item, Err>> + Send + 'static,
    S::Unsub: Send + 'static,
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    self.start_with(StartTimes::default(), create)
  }

  /// [`TestScheduler::start`] with an explicit dispose tick.
  pub fn start_with_dispose<Item, Err, S, F>(
    &self,
    disposed: VirtualTime,
    create: F,
  ) -> Vec<Recorded<Item, Err>>
  where
    F: FnOnce() -> S + Send + 'static,
    S: Observable<Item, Err, TestObserver<Item, Err>> + Send + 'static,
    S::Unsub: Send + 'static,
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    self.start_with(StartTimes { disposed, ..Default::default() }, create)
  }

  pub fn start_with<Item, Err, S, F>(
    &self,
    times: StartTimes,
    create: F,
  ) -> Vec<Recorded<Item, Err>>
  where
    F: FnOnce() -> S + Send + 'static,
    S: Observable<Item, Err, TestObserver<Item, Err>> + Send + 'static,
    S::Unsub: Send + 'static,
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    debug!(?times, "start virtual run");
    let observer = self.create_observer();
    let source: MutArc<Option<S>> = MutArc::own(None);
    let subscription: MutArc<Option<S::Unsub>> = MutArc::own(None);

    let c_source = source.clone();
    self.schedule_at(times.created, move || {
      *c_source.rc_deref_mut() = Some(create());
    });

    let c_observer = observer.clone();
    let c_subscription = subscription.clone();
    self.schedule_at(times.subscribed, move || {
      let source = source.rc_deref_mut().take();
      if let Some(source) = source {
        let unsub = source.actual_subscribe(c_observer);
        *c_subscription.rc_deref_mut() = Some(unsub);
      }
    });

    self.schedule_at(times.disposed, move || subscription.unsubscribe());

    self.flush();
    observer.messages()
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn late_subscription_records_nothing() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.hot::<i32, ()>(vec![next(150, 1), next(250, 2)]);
    let c_xs = xs.clone();
    let times = StartTimes { created: 100, subscribed: 300, disposed: 400 };
    let res = scheduler.start_with(times, move || c_xs);

    assert_eq!(res, vec![]);
    assert_eq!(xs.subscriptions(), vec![SubscriptionInterval::new(300, 400)]);
  }

  #[test]
  #[should_panic]
  fn start_after_creation_time_panics() {
    let scheduler = TestScheduler::new(150);
    let xs = scheduler.cold::<i32, ()>(vec![]);
    scheduler.start(move || xs);
  }
}
