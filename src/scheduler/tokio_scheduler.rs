use std::time::Duration;

use tokio::{
  runtime::Handle,
  time::{sleep, sleep_until, Instant},
};

use super::{effective_period, Scheduler, TaskHandle};
use crate::{error::SchedulerError, subscription::Subscription};

/// Real-time scheduler that spawns onto a tokio runtime.
#[derive(Clone)]
pub struct TokioScheduler {
  handle: Handle,
  epoch: Instant,
}

impl TokioScheduler {
  pub fn new(handle: Handle) -> Self { Self { handle, epoch: Instant::now() } }

  /// Uses the runtime the caller is running on.
  pub fn current() -> Result<Self, SchedulerError> { Ok(Self::new(Handle::try_current()?)) }
}

impl Scheduler for TokioScheduler {
  fn now(&self) -> Duration { self.epoch.elapsed() }

  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    self.handle.spawn(async move {
      if let Some(delay) = delay {
        sleep(delay).await;
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
    self.handle.spawn(async move {
      let mut due = Instant::now() + period;
      loop {
        sleep_until(due).await;
        if c_handle.is_closed() {
          break;
        }
        task();
        due += period;
      }
    });
    handle
  }

  fn min_resolution(&self) -> Duration { Duration::from_millis(1) }
}
