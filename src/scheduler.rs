//! Scheduling abstraction shared by every time-based operator.
//!
//! Operators never touch threads or clocks directly. They ask a [`Scheduler`]
//! to run a task now, after a delay, or periodically, and keep the returned
//! [`TaskHandle`] to cancel it.
use std::sync::{
  atomic::{AtomicU8, Ordering},
  Arc,
};

pub use std::time::Duration;

use crate::subscription::Subscription;

pub mod test_scheduler;
#[cfg(all(feature = "futures-scheduler", feature = "timer", not(target_arch = "wasm32")))]
pub mod thread_pool_scheduler;
#[cfg(feature = "tokio-scheduler")]
pub mod tokio_scheduler;

pub use test_scheduler::{TestScheduler, TestSchedulerConfig, VirtualTime};
#[cfg(all(feature = "futures-scheduler", feature = "timer", not(target_arch = "wasm32")))]
pub use thread_pool_scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A Scheduler is an object to order task and schedule their execution.
///
/// Implementations must run one task to completion before running another
/// task that observes the same state, and must never run a task whose handle
/// was unsubscribed before the task started.
pub trait Scheduler: Clone + Send + Sync + 'static {
  /// Time elapsed on this scheduler's clock since its epoch.
  fn now(&self) -> Duration;

  /// Runs `task` once, as soon as possible when `delay` is `None`, otherwise
  /// after `delay`.
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static;

  /// Runs `task` every `period`, the first time one period from now. A zero
  /// period is replaced by [`Scheduler::min_resolution`].
  fn schedule_periodic<F>(&self, period: Duration, task: F) -> TaskHandle
  where
    F: FnMut() + Send + 'static;

  /// Smallest delay this scheduler can tell apart from "now".
  fn min_resolution(&self) -> Duration;

  #[inline]
  fn schedule_after<F>(&self, delay: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule(task, Some(delay))
  }
}

const PENDING: u8 = 0;
const FINISHED: u8 = 1;
const CANCELLED: u8 = 2;

/// Cancellation handle for a scheduled task.
///
/// The scheduler keeps ownership of the task itself; the handle only flips a
/// shared state flag, so cancelling never has to reach into the scheduler's
/// queue.
#[derive(Clone, Default)]
pub struct TaskHandle(Arc<AtomicU8>);

impl TaskHandle {
  pub fn new() -> Self { Self::default() }

  /// Marks a one-shot task as run. A handle cancelled while its task was
  /// running stays cancelled.
  pub fn mark_finished(&self) {
    let _ = self
      .0
      .compare_exchange(PENDING, FINISHED, Ordering::AcqRel, Ordering::Acquire);
  }

  pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Acquire) == CANCELLED }
}

impl Subscription for TaskHandle {
  fn unsubscribe(&self) {
    let _ = self
      .0
      .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.load(Ordering::Acquire) != PENDING }
}

impl std::fmt::Debug for TaskHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = match self.0.load(Ordering::Acquire) {
      PENDING => "pending",
      FINISHED => "finished",
      _ => "cancelled",
    };
    f.debug_tuple("TaskHandle").field(&state).finish()
  }
}

/// Replaces a zero period with the scheduler's resolution.
#[inline]
pub(crate) fn effective_period(period: Duration, min_resolution: Duration) -> Duration {
  if period.is_zero() {
    min_resolution
  } else {
    period
  }
}
