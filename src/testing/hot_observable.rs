use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::recorded::{Notification, Recorded, SubscriptionInterval};
use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, Observer},
  rc::{MutArc, RcDeref, RcDerefMut},
  scheduler::TestScheduler,
  subscription::Subscription,
};

/// Scripted source that emits on the absolute virtual clock, whether or not
/// anyone listens. Late subscribers only see what is still to come.
pub struct HotObservable<Item, Err> {
  scheduler: TestScheduler,
  inner: MutArc<HotInner<Item, Err>>,
}

impl<Item, Err> Clone for HotObservable<Item, Err> {
  fn clone(&self) -> Self {
    HotObservable { scheduler: self.scheduler.clone(), inner: self.inner.clone() }
  }
}

struct HotEntry<Item, Err> {
  id: usize,
  observer: MutArc<Option<BoxedObserver<Item, Err>>>,
  closed: Arc<AtomicBool>,
  log_index: usize,
}

impl<Item, Err> Clone for HotEntry<Item, Err> {
  fn clone(&self) -> Self {
    HotEntry {
      id: self.id,
      observer: self.observer.clone(),
      closed: self.closed.clone(),
      log_index: self.log_index,
    }
  }
}

struct HotInner<Item, Err> {
  observers: SmallVec<[HotEntry<Item, Err>; 2]>,
  subscriptions: Vec<SubscriptionInterval>,
  next_id: usize,
}

impl<Item, Err> HotObservable<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub(crate) fn new(scheduler: &TestScheduler, messages: Vec<Recorded<Item, Err>>) -> Self {
    let hot = HotObservable {
      scheduler: scheduler.clone(),
      inner: MutArc::own(HotInner {
        observers: SmallVec::new(),
        subscriptions: vec![],
        next_id: 0,
      }),
    };
    for Recorded { time, value } in messages {
      let c_hot = hot.clone();
      if let Err(err) = scheduler.try_schedule_at(time, move || c_hot.deliver(value)) {
        trace!(%err, "hot message dropped");
      }
    }
    hot
  }

  fn deliver(&self, notification: Notification<Item, Err>) {
    // Snapshot, so observers may subscribe or unsubscribe while we deliver.
    let entries = self.inner.rc_deref().observers.clone();
    match notification {
      Notification::Next(value) => {
        for mut entry in entries {
          if !entry.closed.load(Ordering::Acquire) {
            entry.observer.next(value.clone());
          }
        }
      }
      terminal => {
        let now = self.scheduler.clock();
        for entry in entries {
          if entry.closed.swap(true, Ordering::AcqRel) {
            continue;
          }
          {
            let mut inner = self.inner.rc_deref_mut();
            inner.subscriptions[entry.log_index].close(now);
            inner.observers.retain(|e| e.id != entry.id);
          }
          let observer = entry.observer.rc_deref_mut().take();
          match (observer, &terminal) {
            (Some(observer), Notification::Error(err)) => observer.error(err.clone()),
            (Some(observer), _) => observer.complete(),
            (None, _) => {}
          }
        }
      }
    }
  }
}

impl<Item, Err> HotObservable<Item, Err> {
  /// Every subscription this source has seen, in subscription order.
  pub fn subscriptions(&self) -> Vec<SubscriptionInterval> {
    self.inner.rc_deref().subscriptions.clone()
  }
}

impl<Item, Err, O> Observable<Item, Err, O> for HotObservable<Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: 'static,
  Err: 'static,
{
  type Unsub = HotSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let now = self.scheduler.clock();
    let closed = Arc::new(AtomicBool::new(false));
    let boxed: BoxedObserver<Item, Err> = Box::new(observer);
    let mut inner = self.inner.rc_deref_mut();
    let id = inner.next_id;
    inner.next_id += 1;
    let log_index = inner.subscriptions.len();
    inner.subscriptions.push(SubscriptionInterval::open(now));
    inner.observers.push(HotEntry {
      id,
      observer: MutArc::own(Some(boxed)),
      closed: closed.clone(),
      log_index,
    });
    drop(inner);
    debug!(id, clock = now, "hot source subscribed");

    HotSubscription { scheduler: self.scheduler, inner: self.inner, id, closed, log_index }
  }
}

impl<Item, Err> ObservableExt<Item, Err> for HotObservable<Item, Err> {}

pub struct HotSubscription<Item, Err> {
  scheduler: TestScheduler,
  inner: MutArc<HotInner<Item, Err>>,
  id: usize,
  closed: Arc<AtomicBool>,
  log_index: usize,
}

impl<Item, Err> Subscription for HotSubscription<Item, Err> {
  fn unsubscribe(&self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let now = self.scheduler.clock();
    let removed = {
      let mut inner = self.inner.rc_deref_mut();
      inner.subscriptions[self.log_index].close(now);
      let pos = inner.observers.iter().position(|e| e.id == self.id);
      pos.map(|pos| inner.observers.remove(pos))
    };
    debug!(id = self.id, clock = now, "hot source unsubscribed");
    drop(removed);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}
