use std::{convert::Infallible, time::Duration};

use tracing::trace;

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  scheduler::{Scheduler, TaskHandle},
};

/// Creates an observable which will fire at `period` time into the future,
/// and will repeat every `period` interval after.
///
/// Values count up from `0`. The stream never completes and never fails;
/// unsubscribe to stop it. A zero period is replaced by the scheduler's
/// minimum resolution.
pub fn interval<SD>(period: Duration, scheduler: SD) -> IntervalObservable<SD> {
  IntervalObservable { scheduler, period }
}

#[derive(Clone)]
pub struct IntervalObservable<SD> {
  scheduler: SD,
  period: Duration,
}

impl<O, SD> Observable<usize, Infallible, O> for IntervalObservable<SD>
where
  O: Observer<usize, Infallible> + Send + 'static,
  SD: Scheduler,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    let Self { scheduler, period } = self;
    let mut seq = 0;
    scheduler.schedule_periodic(period, move || {
      if !observer.is_finished() {
        trace!(seq, "interval tick");
        observer.next(seq);
        seq += 1;
      }
    })
  }
}

impl<SD> ObservableExt<usize, Infallible> for IntervalObservable<SD> {}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::prelude::*;

  #[test]
  fn counts_from_zero_until_disposed() {
    let scheduler = TestScheduler::default();
    let s = scheduler.clone();
    let res: Vec<Recorded<usize, Infallible>> =
      scheduler.start_with_dispose(450, move || interval(Duration::from_millis(100), s));
    assert_eq!(res, vec![next(300, 0), next(400, 1)]);
    assert!(scheduler.is_empty());
  }

  #[cfg(all(feature = "futures-scheduler", feature = "timer", not(target_arch = "wasm32")))]
  #[test]
  fn thread_pool_ticks() {
    use std::sync::mpsc;

    let scheduler = ThreadPoolScheduler::new().unwrap();
    let (tx, rx) = mpsc::channel();
    let sub = interval(Duration::from_millis(2), scheduler)
      .subscribe(move |v: usize| {
        let _ = tx.send(v);
      })
      .unsubscribe_when_dropped();

    let first: Vec<usize> = (0..3)
      .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
      .collect();
    drop(sub);
    assert_eq!(first, vec![0, 1, 2]);
  }
}
