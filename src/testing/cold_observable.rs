use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use tracing::debug;

use super::recorded::{Notification, Recorded, SubscriptionInterval};
use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  scheduler::TestScheduler,
  subscription::{SharedSubscription, Subscription},
};

/// Scripted source that replays its messages for every subscriber, with
/// times taken as offsets from the subscription instant.
pub struct ColdObservable<Item, Err> {
  scheduler: TestScheduler,
  messages: Arc<Vec<Recorded<Item, Err>>>,
  subscriptions: MutArc<Vec<SubscriptionInterval>>,
}

impl<Item, Err> Clone for ColdObservable<Item, Err> {
  fn clone(&self) -> Self {
    ColdObservable {
      scheduler: self.scheduler.clone(),
      messages: self.messages.clone(),
      subscriptions: self.subscriptions.clone(),
    }
  }
}

impl<Item, Err> ColdObservable<Item, Err> {
  pub(crate) fn new(scheduler: &TestScheduler, messages: Vec<Recorded<Item, Err>>) -> Self {
    ColdObservable {
      scheduler: scheduler.clone(),
      messages: Arc::new(messages),
      subscriptions: MutArc::own(vec![]),
    }
  }

  /// Every subscription this source has seen, in subscription order.
  pub fn subscriptions(&self) -> Vec<SubscriptionInterval> { self.subscriptions.rc_deref().clone() }
}

impl<Item, Err, O> Observable<Item, Err, O> for ColdObservable<Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Unsub = ColdSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Self { scheduler, messages, subscriptions } = self;
    let now = scheduler.clock();
    let log_index = {
      let mut log = subscriptions.rc_deref_mut();
      log.push(SubscriptionInterval::open(now));
      log.len() - 1
    };
    debug!(clock = now, "cold source subscribed");

    let observer = MutArc::own(Some(observer));
    let closed = Arc::new(AtomicBool::new(false));
    let tasks = SharedSubscription::default();
    let weak_tasks = tasks.downgrade();
    for Recorded { time, value } in messages.iter().cloned() {
      let mut observer = observer.clone();
      let closed = closed.clone();
      let log = subscriptions.clone();
      let s = scheduler.clone();
      let weak_tasks = weak_tasks.clone();
      let handle = scheduler.schedule_at(now + time, move || match value {
        Notification::Next(v) => {
          if !closed.load(Ordering::Acquire) {
            observer.next(v);
          }
        }
        terminal => {
          if closed.swap(true, Ordering::AcqRel) {
            return;
          }
          log.rc_deref_mut()[log_index].close(s.clock());
          // nothing scripted after a terminal may fire
          weak_tasks.unsubscribe();
          match terminal {
            Notification::Error(err) => observer.error(err),
            _ => observer.complete(),
          }
        }
      });
      tasks.add(handle);
    }

    ColdSubscription { scheduler, tasks, closed, subscriptions, log_index }
  }
}

impl<Item, Err> ObservableExt<Item, Err> for ColdObservable<Item, Err> {}

pub struct ColdSubscription {
  scheduler: TestScheduler,
  tasks: SharedSubscription,
  closed: Arc<AtomicBool>,
  subscriptions: MutArc<Vec<SubscriptionInterval>>,
  log_index: usize,
}

impl Subscription for ColdSubscription {
  fn unsubscribe(&self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let now = self.scheduler.clock();
    self.subscriptions.rc_deref_mut()[self.log_index].close(now);
    debug!(clock = now, "cold source unsubscribed");
    self.tasks.unsubscribe();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn terminal_cancels_later_messages() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.cold::<i32, ()>(vec![next(10, 1), completed(20), next(30, 2)]);
    let observer = scheduler.create_observer();
    let _sub = xs.actual_subscribe(observer.clone());

    scheduler.advance_to(20);
    assert!(scheduler.is_empty());
    scheduler.flush();
    assert_eq!(observer.messages(), vec![next(10, 1), completed(20)]);
  }

  #[test]
  fn every_subscription_replays_from_its_start() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.cold::<char, ()>(vec![next(0, 'a'), next(5, 'b'), completed(10)]);
    let first = scheduler.create_observer();
    let second = scheduler.create_observer();

    xs.clone().actual_subscribe(first.clone());
    scheduler.advance_to(3);
    let sub = xs.clone().actual_subscribe(second.clone());
    scheduler.advance_to(6);
    sub.unsubscribe();
    scheduler.flush();

    assert_eq!(first.messages(), vec![next(0, 'a'), next(5, 'b'), completed(10)]);
    assert_eq!(second.messages(), vec![next(3, 'a')]);
    assert_eq!(
      xs.subscriptions(),
      vec![SubscriptionInterval::new(0, 10), SubscriptionInterval::new(3, 6)]
    );
  }
}
