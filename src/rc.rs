use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::{observer::Observer, subscription::Subscription};

pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a>;
}

pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a>;
}

/// Shared, thread-safe mutable cell used for operator state that is touched
/// both by the upstream observer and by scheduled timer tasks.
///
/// A poisoned lock is recovered rather than propagated.
#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  /// A non-owning handle, for tasks that must reach this cell without keeping
  /// it alive.
  #[inline]
  pub fn downgrade(&self) -> WeakArc<T> { WeakArc(Arc::downgrade(&self.0)) }
}

pub struct WeakArc<T>(Weak<Mutex<T>>);

impl<T> WeakArc<T> {
  #[inline]
  pub fn upgrade(&self) -> Option<MutArc<T>> { self.0.upgrade().map(MutArc) }
}

impl<T> Clone for WeakArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> RcDeref for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T> RcDerefMut for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

/// Shared ownership observer. Terminal notifications take the inner observer
/// out of the cell first, so every clone sees a finished observer afterwards
/// and the lock is not held while the downstream finishes.
impl<O, Item, Err> Observer<Item, Err> for MutArc<Option<O>>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self.rc_deref_mut().as_mut() {
      inner.next(value);
    }
  }

  fn error(self, err: Err) {
    let inner = self.rc_deref_mut().take();
    if let Some(inner) = inner {
      inner.error(err);
    }
  }

  fn complete(self) {
    let inner = self.rc_deref_mut().take();
    if let Some(inner) = inner {
      inner.complete();
    }
  }

  fn is_finished(&self) -> bool { self.rc_deref().as_ref().is_none_or(O::is_finished) }
}

/// A shared slot holding at most one subscription. Unsubscribing takes the
/// value out before releasing it, so a re-entrant unsubscribe is a no-op.
impl<T: Subscription> Subscription for MutArc<Option<T>> {
  fn unsubscribe(&self) {
    let inner = self.rc_deref_mut().take();
    if let Some(inner) = inner {
      inner.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.rc_deref().as_ref().is_none_or(T::is_closed) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scheduler::TaskHandle;

  struct Counter(MutArc<Vec<i32>>);

  impl Observer<i32, ()> for Counter {
    fn next(&mut self, value: i32) { self.0.rc_deref_mut().push(value); }
    fn error(self, _: ()) { self.0.rc_deref_mut().push(-1); }
    fn complete(self) { self.0.rc_deref_mut().push(0); }
    fn is_finished(&self) -> bool { false }
  }

  #[test]
  fn shared_observer_terminal_once() {
    let log = MutArc::own(vec![]);
    let mut a = MutArc::own(Some(Counter(log.clone())));
    let b = a.clone();
    a.next(1);
    a.clone().complete();
    assert!(b.is_finished());
    b.error(());
    a.next(2);
    assert_eq!(*log.rc_deref(), vec![1, 0]);
  }

  #[test]
  fn subscription_slot_releases_once() {
    let handle = TaskHandle::new();
    let slot = MutArc::own(Some(handle.clone()));
    assert!(!slot.is_closed());
    slot.unsubscribe();
    slot.unsubscribe();
    assert!(handle.is_closed());
    assert!(slot.is_closed());
  }
}
