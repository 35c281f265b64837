use crate::observer::Observer;

/// Observer built from `next`, `error` and `complete` closures. The terminal
/// handlers are `FnOnce`: the observer is consumed by whichever runs.
#[derive(Clone)]
pub struct ObserverAll<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

impl<N, E, C> ObserverAll<N, E, C> {
  #[inline(always)]
  pub fn new(next: N, error: E, complete: C) -> Self { ObserverAll { next, error, complete } }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for ObserverAll<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline(always)]
  fn next(&mut self, value: Item) { (self.next)(value); }

  #[inline(always)]
  fn error(self, err: Err) { (self.error)(err); }

  #[inline(always)]
  fn complete(self) { (self.complete)(); }

  #[inline]
  fn is_finished(&self) -> bool { false }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[test]
  fn routes_every_notification() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.cold::<i32, &str>(vec![next(5, 1), next(6, 2), error(7, "boom")]);
    let log = Arc::new(Mutex::new(vec![]));

    let (n, e, c) = (log.clone(), log.clone(), log.clone());
    xs.subscribe_all(
      move |v| n.lock().unwrap().push(format!("next {v}")),
      move |err| e.lock().unwrap().push(format!("error {err}")),
      move || c.lock().unwrap().push("complete".to_string()),
    );
    scheduler.flush();

    assert_eq!(*log.lock().unwrap(), vec!["next 1", "next 2", "error boom"]);
  }

  #[test]
  fn subscribe_err_sees_the_error() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.hot::<i32, &str>(vec![next(10, 1), error(20, "late")]);
    let err = Arc::new(Mutex::new(None));
    let c_err = err.clone();
    let sub = xs.clone().subscribe_err(|_| {}, move |e| *c_err.lock().unwrap() = Some(e));
    scheduler.flush();

    assert_eq!(*err.lock().unwrap(), Some("late"));
    assert!(sub.is_closed());
  }
}
