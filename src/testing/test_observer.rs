use super::recorded::{Notification, Recorded};
use crate::{
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  scheduler::TestScheduler,
};

/// Observer that records every notification with the virtual time it arrived.
///
/// Clones share one log. Nothing is filtered: a notification after a terminal
/// shows up in [`TestObserver::messages`], which is how contract violations
/// become visible in assertions.
pub struct TestObserver<Item, Err> {
  scheduler: TestScheduler,
  messages: MutArc<Vec<Recorded<Item, Err>>>,
}

impl<Item, Err> Clone for TestObserver<Item, Err> {
  fn clone(&self) -> Self {
    TestObserver { scheduler: self.scheduler.clone(), messages: self.messages.clone() }
  }
}

impl<Item, Err> TestObserver<Item, Err> {
  pub fn new(scheduler: TestScheduler) -> Self {
    TestObserver { scheduler, messages: MutArc::own(vec![]) }
  }

  pub fn messages(&self) -> Vec<Recorded<Item, Err>>
  where
    Item: Clone,
    Err: Clone,
  {
    self.messages.rc_deref().clone()
  }

  fn record(&self, value: Notification<Item, Err>) {
    let time = self.scheduler.clock();
    self.messages.rc_deref_mut().push(Recorded::new(time, value));
  }
}

impl<Item, Err> Observer<Item, Err> for TestObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.record(Notification::Next(value)); }

  fn error(self, err: Err) { self.record(Notification::Error(err)); }

  fn complete(self) { self.record(Notification::Completed); }

  #[inline]
  fn is_finished(&self) -> bool { false }
}
