use std::time::Duration;

use tracing::trace;

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, RcDerefMut},
  scheduler::{Scheduler, TaskHandle},
  subscription::{Subscription, ZipSubscription},
};

#[derive(Clone)]
pub struct ThrottleOp<S, SD> {
  pub(crate) source: S,
  pub(crate) scheduler: SD,
  pub(crate) duration: Duration,
}

type RcHandler = MutArc<Option<TaskHandle>>;

impl<Item, Err, O, S, SD> Observable<Item, Err, O> for ThrottleOp<S, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  S: Observable<Item, Err, ThrottleObserver<O, SD, Item>>,
  SD: Scheduler,
  Item: Send + 'static,
{
  type Unsub = ZipSubscription<S::Unsub, RcHandler>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Self { source, scheduler, duration } = self;
    let task_handler = MutArc::own(None);
    let observer = ThrottleObserver {
      observer: MutArc::own(Some(observer)),
      delay: duration,
      scheduler,
      trailing: MutArc::own(Trailing { value: None, generation: 0 }),
      task_handler: task_handler.clone(),
    };
    let u = source.actual_subscribe(observer);
    ZipSubscription::new(u, task_handler)
  }
}

impl<Item, Err, S, SD> ObservableExt<Item, Err> for ThrottleOp<S, SD> where
  S: ObservableExt<Item, Err>
{
}

/// The pending value, tagged with the `next` that stored it. A timer only
/// emits the value of its own generation.
struct Trailing<Item> {
  value: Option<Item>,
  generation: usize,
}

pub struct ThrottleObserver<O, SD, Item> {
  observer: MutArc<Option<O>>,
  scheduler: SD,
  delay: Duration,
  trailing: MutArc<Trailing<Item>>,
  task_handler: RcHandler,
}

impl<O, SD, Item> ThrottleObserver<O, SD, Item> {
  fn cancel_timer(&self) { self.task_handler.unsubscribe(); }
}

impl<Item, Err, O, SD> Observer<Item, Err> for ThrottleObserver<O, SD, Item>
where
  O: Observer<Item, Err> + Send + 'static,
  SD: Scheduler,
  Item: Send + 'static,
{
  fn next(&mut self, value: Item) {
    self.cancel_timer();
    let generation = {
      let mut trailing = self.trailing.rc_deref_mut();
      trailing.generation = trailing.generation.wrapping_add(1);
      trailing.value = Some(value);
      trailing.generation
    };

    let mut observer = self.observer.clone();
    let trailing = self.trailing.clone();
    let handler = self.scheduler.schedule_after(self.delay, move || {
      // Held while emitting, so a concurrent `complete` cannot overtake.
      let mut trailing = trailing.rc_deref_mut();
      if trailing.generation != generation {
        trace!(generation, "stale throttle timer");
        return;
      }
      if let Some(value) = trailing.value.take() {
        trace!(generation, "throttle timer fired");
        observer.next(value);
      }
    });
    *self.task_handler.rc_deref_mut() = Some(handler);
  }

  fn error(self, err: Err) {
    self.cancel_timer();
    self.trailing.rc_deref_mut().value = None;
    self.observer.error(err);
  }

  fn complete(mut self) {
    self.cancel_timer();
    let mut trailing = self.trailing.rc_deref_mut();
    if let Some(value) = trailing.value.take() {
      self.observer.next(value);
    }
    self.observer.complete();
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{observable::ObserverItem, prelude::*};

  fn ms(v: u64) -> Duration { Duration::from_millis(v) }

  #[test]
  fn burst_collapses_to_last_value() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.hot::<i32, ()>(vec![
      next(210, 1),
      next(215, 2),
      next(219, 3),
      next(300, 4),
      completed(400),
    ]);
    let (c_xs, s) = (xs.clone(), scheduler.clone());
    let res = scheduler.start(move || c_xs.throttle(ms(10), s));

    assert_eq!(res, vec![next(229, 3), next(310, 4), completed(400)]);
    assert_eq!(xs.subscriptions(), vec![SubscriptionInterval::new(200, 400)]);
  }

  #[test]
  fn error_discards_pending_value() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.hot(vec![next(210, 1), error(215, "boom")]);
    let s = scheduler.clone();
    let res = scheduler.start(move || xs.throttle(ms(10), s));

    assert_eq!(res, vec![error(215, "boom")]);
    assert!(scheduler.is_empty());
  }

  #[test]
  fn dispose_cancels_timer() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.hot::<i32, ()>(vec![next(210, 1)]);
    let s = scheduler.clone();
    let res = scheduler.start_with_dispose(215, move || xs.throttle(ms(10), s));

    assert_eq!(res, vec![]);
    assert!(scheduler.is_empty());
  }

  /// Runs a task only when asked, cancelled or not, like a worker thread that
  /// picked the task up before its handle was cancelled.
  #[derive(Clone, Default)]
  struct ManualScheduler(MutArc<Vec<Option<Box<dyn FnOnce() + Send>>>>);

  impl ManualScheduler {
    fn run(&self, index: usize) {
      let task = self.0.rc_deref_mut()[index].take();
      if let Some(task) = task {
        task();
      }
    }
  }

  impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration { Duration::ZERO }

    fn schedule<F>(&self, task: F, _: Option<Duration>) -> TaskHandle
    where
      F: FnOnce() + Send + 'static,
    {
      self.0.rc_deref_mut().push(Some(Box::new(task)));
      TaskHandle::new()
    }

    fn schedule_periodic<F>(&self, _: Duration, _: F) -> TaskHandle
    where
      F: FnMut() + Send + 'static,
    {
      TaskHandle::new()
    }

    fn min_resolution(&self) -> Duration { ms(1) }
  }

  /// Hands its observer out, so the test can push values by hand.
  struct Capture(MutArc<Option<BoxedObserver<i32, ()>>>);

  impl<O> Observable<i32, (), O> for Capture
  where
    O: Observer<i32, ()> + Send + 'static,
  {
    type Unsub = ();

    fn actual_subscribe(self, observer: O) -> Self::Unsub {
      *self.0.rc_deref_mut() = Some(Box::new(observer));
    }
  }

  #[test]
  fn stale_timer_leaves_newer_value_alone() {
    let scheduler = ManualScheduler::default();
    let upstream = MutArc::own(None);
    let seen = MutArc::own(vec![]);

    let c_seen = seen.clone();
    let op = ThrottleOp {
      source: Capture(upstream.clone()),
      scheduler: scheduler.clone(),
      duration: ms(10),
    };
    let observer = ObserverItem::new(move |v: i32| c_seen.rc_deref_mut().push(v));
    let _sub = <ThrottleOp<_, _> as Observable<i32, (), _>>::actual_subscribe(op, observer);

    let mut source = upstream.rc_deref_mut().take().unwrap();
    source.next(1);
    source.next(2);

    // the first timer was already running when the second value cancelled it
    scheduler.run(0);
    assert!(seen.rc_deref().is_empty());
    scheduler.run(1);
    assert_eq!(*seen.rc_deref(), vec![2]);
  }

  #[cfg(all(feature = "futures-scheduler", feature = "timer", not(target_arch = "wasm32")))]
  #[test]
  fn thread_pool_bursts_stay_ordered() {
    use std::sync::mpsc;

    let pool = ThreadPoolScheduler::new().unwrap();
    let (tx, rx) = mpsc::channel();
    let c_tx = tx.clone();
    let _sub = interval(ms(1), pool.clone())
      .take_time(ms(60), pool.clone())
      .throttle(ms(2), pool)
      .subscribe_all(
        move |v| {
          let _ = c_tx.send(Some(v));
        },
        |_| {},
        move || {
          let _ = tx.send(None);
        },
      );

    let mut values = vec![];
    while let Some(v) = rx.recv_timeout(Duration::from_secs(5)).unwrap() {
      values.push(v);
    }
    assert!(!values.is_empty());
    // every value at most once, never ahead of a later one
    assert!(values.windows(2).all(|w| w[0] < w[1]));
  }
}
