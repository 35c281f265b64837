use std::time::{Duration, Instant};

use futures::executor::ThreadPool;
use futures_time::task::sleep;
use tracing::trace;

use super::{effective_period, Scheduler, TaskHandle};
use crate::{error::SchedulerError, subscription::Subscription};

/// Real-time scheduler backed by a `futures` thread pool, with timers from
/// `futures-time`.
///
/// Tasks may run on any worker thread. Operators guard their state with
/// locks, so two tasks of one pipeline never observe each other half done.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
  epoch: Instant,
}

impl ThreadPoolScheduler {
  pub fn new() -> Result<Self, SchedulerError> { Ok(Self::with_pool(ThreadPool::new()?)) }

  pub fn with_pool(pool: ThreadPool) -> Self { Self { pool, epoch: Instant::now() } }
}

impl Scheduler for ThreadPoolScheduler {
  fn now(&self) -> Duration { self.epoch.elapsed() }

  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    self.pool.spawn_ok(async move {
      if let Some(delay) = delay {
        sleep(delay.into()).await;
      }
      if !c_handle.is_closed() {
        task();
        c_handle.mark_finished();
      }
    });
    handle
  }

  fn schedule_periodic<F>(&self, period: Duration, mut task: F) -> TaskHandle
  where
    F: FnMut() + Send + 'static,
  {
    let period = effective_period(period, self.min_resolution());
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    self.pool.spawn_ok(async move {
      let mut due = Instant::now() + period;
      loop {
        sleep(due.saturating_duration_since(Instant::now()).into()).await;
        if c_handle.is_closed() {
          break;
        }
        task();
        due += period;
      }
      trace!("periodic task stopped");
    });
    handle
  }

  fn min_resolution(&self) -> Duration { Duration::from_millis(1) }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc, Arc,
  };

  use super::*;

  #[test]
  fn delayed_task_runs_once() {
    let scheduler = ThreadPoolScheduler::new().unwrap();
    let (tx, rx) = mpsc::channel();
    let start = scheduler.now();
    let s = scheduler.clone();
    let handle =
      scheduler.schedule(move || tx.send(s.now()).unwrap(), Some(Duration::from_millis(20)));

    let ran_at = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(ran_at >= start + Duration::from_millis(20));
    std::thread::sleep(Duration::from_millis(10));
    assert!(handle.is_closed());
    assert!(!handle.is_cancelled());
  }

  #[test]
  fn cancelled_task_never_runs() {
    let scheduler = ThreadPoolScheduler::new().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let handle = scheduler.schedule_after(Duration::from_millis(50), move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    });
    handle.unsubscribe();
    std::thread::sleep(Duration::from_millis(120));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn periodic_stops_after_cancel() {
    let scheduler = ThreadPoolScheduler::new().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let handle = scheduler.schedule_periodic(Duration::from_millis(10), move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    });
    std::thread::sleep(Duration::from_millis(80));
    handle.unsubscribe();
    std::thread::sleep(Duration::from_millis(30));
    let seen = hits.load(Ordering::SeqCst);
    assert!(seen >= 1);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(hits.load(Ordering::SeqCst), seen);
  }
}
