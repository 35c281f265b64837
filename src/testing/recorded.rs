use std::fmt::{Display, Formatter};

use crate::scheduler::VirtualTime;

/// One notification, as recorded or as scripted for a test source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Completed,
}

impl<Item, Err> Notification<Item, Err> {
  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }
}

/// A notification stamped with the virtual time it happened at.
///
/// For a cold source the time is an offset from the subscription instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded<Item, Err> {
  pub time: VirtualTime,
  pub value: Notification<Item, Err>,
}

impl<Item, Err> Recorded<Item, Err> {
  pub fn new(time: VirtualTime, value: Notification<Item, Err>) -> Self { Recorded { time, value } }
}

pub fn next<Item, Err>(time: VirtualTime, value: Item) -> Recorded<Item, Err> {
  Recorded::new(time, Notification::Next(value))
}

pub fn error<Item, Err>(time: VirtualTime, err: Err) -> Recorded<Item, Err> {
  Recorded::new(time, Notification::Error(err))
}

pub fn completed<Item, Err>(time: VirtualTime) -> Recorded<Item, Err> {
  Recorded::new(time, Notification::Completed)
}

/// When a test source was subscribed, and when that subscription ended.
/// `unsubscribe` is `None` while the subscription is still active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionInterval {
  pub subscribe: VirtualTime,
  pub unsubscribe: Option<VirtualTime>,
}

impl SubscriptionInterval {
  pub fn new(subscribe: VirtualTime, unsubscribe: VirtualTime) -> Self {
    SubscriptionInterval { subscribe, unsubscribe: Some(unsubscribe) }
  }

  pub fn open(subscribe: VirtualTime) -> Self {
    SubscriptionInterval { subscribe, unsubscribe: None }
  }

  /// Records the end, keeping an earlier one.
  pub(crate) fn close(&mut self, at: VirtualTime) { self.unsubscribe.get_or_insert(at); }
}

impl Display for SubscriptionInterval {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.unsubscribe {
      Some(end) => write!(f, "({}, {end})", self.subscribe),
      None => write!(f, "({}, ...)", self.subscribe),
    }
  }
}
