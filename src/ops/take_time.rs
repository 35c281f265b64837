use std::time::Duration;

use tracing::trace;

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutArc,
  scheduler::{Scheduler, TaskHandle},
  subscription::{SharedSubscription, Subscription},
};

#[derive(Clone)]
pub struct TakeTimeOp<S, SD> {
  pub(crate) source: S,
  pub(crate) duration: Duration,
  pub(crate) scheduler: SD,
}

impl<Item, Err, O, S, SD> Observable<Item, Err, O> for TakeTimeOp<S, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  S: Observable<Item, Err, TakeTimeObserver<O, SD>>,
  S::Unsub: Send + 'static,
  SD: Scheduler,
{
  type Unsub = SharedSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Self { source, duration, scheduler } = self;
    let observer = MutArc::own(Some(observer));
    let subscription = SharedSubscription::default();
    // The timer never fires sooner than one resolution step.
    let deadline = scheduler.now() + duration.max(scheduler.min_resolution());

    let c_observer = observer.clone();
    let c_subscription = subscription.clone();
    let timer = scheduler.schedule_after(duration, move || {
      trace!("take_time deadline reached");
      <MutArc<Option<O>> as Observer<Item, Err>>::complete(c_observer);
      c_subscription.unsubscribe();
    });
    subscription.add(timer.clone());

    let observer = TakeTimeObserver {
      observer,
      timer,
      scheduler,
      deadline,
      subscription: subscription.clone(),
    };
    subscription.add(source.actual_subscribe(observer));
    subscription
  }
}

impl<Item, Err, S, SD> ObservableExt<Item, Err> for TakeTimeOp<S, SD> where
  S: ObservableExt<Item, Err>
{
}

pub struct TakeTimeObserver<O, SD> {
  observer: MutArc<Option<O>>,
  timer: TaskHandle,
  scheduler: SD,
  deadline: Duration,
  subscription: SharedSubscription,
}

impl<O, SD: Scheduler> TakeTimeObserver<O, SD> {
  /// A notification due on the deadline instant loses to the deadline, even
  /// when it was queued ahead of the timer.
  fn expired(&self) -> bool { self.scheduler.now() >= self.deadline }

  fn complete_at_deadline<Item, Err>(self)
  where
    O: Observer<Item, Err>,
  {
    trace!("take_time notification at the deadline");
    <MutArc<Option<O>> as Observer<Item, Err>>::complete(self.observer);
    self.subscription.unsubscribe();
  }
}

impl<Item, Err, O, SD> Observer<Item, Err> for TakeTimeObserver<O, SD>
where
  O: Observer<Item, Err>,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) {
    if self.expired() {
      trace!("take_time notification at the deadline");
      <MutArc<Option<O>> as Observer<Item, Err>>::complete(self.observer.clone());
      self.subscription.unsubscribe();
    } else {
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) {
    if self.expired() {
      self.complete_at_deadline::<Item, Err>();
    } else {
      self.timer.unsubscribe();
      self.observer.error(err);
    }
  }

  fn complete(self) {
    if self.expired() {
      self.complete_at_deadline::<Item, Err>();
    } else {
      self.timer.unsubscribe();
      self.observer.complete();
    }
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
