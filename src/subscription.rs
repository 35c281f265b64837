use std::{
  fmt::{Debug, Formatter},
  mem,
};

use smallvec::SmallVec;

use crate::rc::{MutArc, RcDeref, RcDerefMut, WeakArc};

/// Subscription returns from `Observable.actual_subscribe` to allow
/// unsubscribing.
///
/// `unsubscribe` is idempotent: the first call releases the resource, every
/// later call is a no-op. It may be called re-entrantly, from inside the
/// release of a related subscription.
pub trait Subscription {
  /// This allows deregistering an stream before it has finished receiving all
  /// events (i.e. before onCompleted is called).
  fn unsubscribe(&self);

  fn is_closed(&self) -> bool;
}

/// Type-erased subscription that can be released from any thread.
pub type BoxSubscription = Box<dyn Subscription + Send>;

impl Subscription for () {
  #[inline]
  fn unsubscribe(&self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<T: ?Sized + Subscription> Subscription for Box<T> {
  #[inline]
  fn unsubscribe(&self) { (**self).unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

impl<T: Subscription> Subscription for Option<T> {
  #[inline]
  fn unsubscribe(&self) {
    if let Some(inner) = self {
      inner.unsubscribe()
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.as_ref().is_none_or(T::is_closed) }
}

impl Debug for BoxSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BoxSubscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

/// Two subscriptions released together, e.g. an upstream subscription and the
/// timer an operator owns.
#[derive(Clone, Debug)]
pub struct ZipSubscription<A, B> {
  a: A,
  b: B,
}

impl<A, B> ZipSubscription<A, B> {
  pub fn new(a: A, b: B) -> Self { Self { a, b } }
}

impl<A: Subscription, B: Subscription> Subscription for ZipSubscription<A, B> {
  fn unsubscribe(&self) {
    self.a.unsubscribe();
    self.b.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.a.is_closed() && self.b.is_closed() }
}

// ==================== Composite ====================

struct Inner {
  closed: bool,
  next_id: usize,
  teardown: SmallVec<[(usize, BoxSubscription); 2]>,
}

impl Default for Inner {
  fn default() -> Self { Inner { closed: false, next_id: 0, teardown: SmallVec::new() } }
}

/// Composite subscription: owns an ordered set of children and releases every
/// one of them exactly once, in insertion order, when it is unsubscribed.
///
/// Children added after the composite is closed are released immediately.
#[derive(Clone, Default)]
pub struct SharedSubscription(MutArc<Inner>);

impl SharedSubscription {
  /// Adds a child and returns an id that can later detach it with
  /// [`SharedSubscription::remove`].
  pub fn add<S: Subscription + Send + 'static>(&self, subscription: S) -> usize {
    let mut inner = self.0.rc_deref_mut();
    let id = inner.next_id;
    inner.next_id += 1;
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      inner.teardown.push((id, Box::new(subscription)));
    }
    id
  }

  /// Detaches a child without releasing it.
  pub fn remove(&self, id: usize) -> Option<BoxSubscription> {
    let mut inner = self.0.rc_deref_mut();
    let pos = inner.teardown.iter().position(|(i, _)| *i == id)?;
    Some(inner.teardown.remove(pos).1)
  }

  pub fn teardown_size(&self) -> usize { self.0.rc_deref().teardown.len() }

  /// A handle that lets scheduled work reach this composite without owning
  /// it.
  pub fn downgrade(&self) -> WeakSubscription { WeakSubscription(self.0.downgrade()) }
}

impl Subscription for SharedSubscription {
  fn unsubscribe(&self) {
    let teardown = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      mem::take(&mut inner.teardown)
    };
    for (_, child) in teardown {
      child.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

impl Debug for SharedSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.rc_deref();
    f.debug_struct("SharedSubscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardown.len())
      .finish()
  }
}

/// Non-owning reference to a [`SharedSubscription`].
#[derive(Clone)]
pub struct WeakSubscription(WeakArc<Inner>);

impl WeakSubscription {
  pub fn upgrade(&self) -> Option<SharedSubscription> { self.0.upgrade().map(SharedSubscription) }

  /// Unsubscribes the composite if it is still alive.
  pub fn unsubscribe(&self) {
    if let Some(subscription) = self.upgrade() {
      subscription.unsubscribe();
    }
  }
}

// ==================== RAII ====================

/// Wrapper around a subscription which provides the
/// `unsubscribe_when_dropped()` method.
pub struct SubscriptionWrapper<T: Subscription>(pub(crate) T);

impl<T: Subscription> SubscriptionWrapper<T> {
  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<T> { SubscriptionGuard(self.0) }

  /// Consumes this wrapper and returns the underlying subscription.
  pub fn into_inner(self) -> T { self.0 }
}

impl<T: Subscription> Subscription for SubscriptionWrapper<T> {
  #[inline]
  fn unsubscribe(&self) { self.0.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(pub(crate) T);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(subscription) }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}
