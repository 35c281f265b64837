use crate::observer::Observer;

/// Observer built from a single `next` closure. Error and completion
/// notifications are dropped.
#[derive(Clone)]
pub struct ObserverItem<N> {
  next: N,
}

impl<N> ObserverItem<N> {
  #[inline(always)]
  pub fn new(next: N) -> Self { ObserverItem { next } }
}

impl<Item, Err, N> Observer<Item, Err> for ObserverItem<N>
where
  N: FnMut(Item),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value); }

  #[inline]
  fn error(self, _err: Err) {}

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_finished(&self) -> bool { false }
}
