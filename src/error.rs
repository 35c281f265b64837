use thiserror::Error;

use crate::scheduler::VirtualTime;

/// Failures reported by schedulers.
///
/// Notifications flowing through a pipeline carry the user's own error type;
/// this type only covers misuse of, or failure to build, a scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
  /// Absolute scheduling on a virtual clock that has already passed `at`.
  #[error("cannot schedule at tick {at}: clock is already at {now}")]
  ScheduledInPast { at: VirtualTime, now: VirtualTime },

  /// The worker threads of a real-time scheduler could not be started.
  #[error("failed to start the scheduler thread pool")]
  ThreadPool(#[from] std::io::Error),

  /// No tokio runtime is running on the calling thread.
  #[cfg(feature = "tokio-scheduler")]
  #[error("no tokio runtime available")]
  NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
