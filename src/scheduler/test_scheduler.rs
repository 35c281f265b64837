//! Test Scheduler for deterministic testing of time-based operators.
//!
//! Provides virtual time that only advances when explicitly instructed,
//! enabling deterministic testing of `throttle`, `sample`, `interval`, etc.
//!
//! # Features
//!
//! - **Virtual Time**: an integer tick counter that only the run loop moves
//! - **Owned Queue**: every `TestScheduler` (and its clones) owns one queue;
//!   two schedulers never see each other's work
//! - **Synchronous Execution**: tasks execute one after another, to
//!   completion, on the thread that advances the clock
//! - **FIFO ties**: tasks due on the same tick run in the order they were
//!   scheduled
//!
//! # Usage
//!
//! ```rust
//! use rxtime::prelude::*;
//!
//! let scheduler = TestScheduler::default();
//! let seen = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! let s = scheduler.clone();
//! scheduler.schedule_after(Duration::from_millis(5), move || {
//!   c_seen.lock().unwrap().push(s.clock());
//! });
//!
//! scheduler.advance_by(Duration::from_millis(5));
//! assert_eq!(*seen.lock().unwrap(), vec![5]);
//! ```

use std::{cmp::Ordering, collections::BinaryHeap, time::Duration};

use tracing::{debug, trace};

use super::{effective_period, Scheduler, TaskHandle};
use crate::{
  error::SchedulerError,
  rc::{MutArc, RcDeref, RcDerefMut},
  subscription::Subscription,
};

/// A point on the virtual clock, in ticks.
pub type VirtualTime = u64;

/// Construction parameters of a [`TestScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestSchedulerConfig {
  /// Clock value before anything runs.
  pub initial_clock: VirtualTime,
  /// Length of one tick. `Duration` arguments are rounded up to whole ticks.
  pub resolution: Duration,
}

impl Default for TestSchedulerConfig {
  fn default() -> Self { Self { initial_clock: 0, resolution: Duration::from_millis(1) } }
}

// ==================== Internal State ====================

enum Work {
  Once(Box<dyn FnOnce() + Send>),
  Periodic { period: VirtualTime, task: Box<dyn FnMut() + Send> },
}

struct ScheduledTask {
  due: VirtualTime,
  task_id: usize,
  work: Work,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.task_id == other.task_id }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

struct TestSchedulerState {
  clock: VirtualTime,
  queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
  resolution: Duration,
}

impl TestSchedulerState {
  fn push(&mut self, due: VirtualTime, work: Work, handle: TaskHandle) {
    let task_id = self.next_task_id;
    self.next_task_id += 1;
    self.queue.push(ScheduledTask { due, task_id, work, handle });
  }

  fn to_ticks(&self, duration: Duration) -> VirtualTime {
    let res = self.resolution.as_nanos();
    let ticks = duration.as_nanos().div_ceil(res);
    VirtualTime::try_from(ticks).unwrap_or(VirtualTime::MAX)
  }

  /// Due tick of a relative request. `None` means "now"; an explicit delay
  /// always lands at least one tick ahead.
  fn relative(&self, delay: Option<Duration>) -> VirtualTime {
    match delay {
      None => self.clock,
      Some(delay) => self.clock.saturating_add(self.to_ticks(delay).max(1)),
    }
  }
}

// ==================== TestScheduler ====================

/// A virtual time scheduler for deterministic testing.
///
/// Cloning is cheap and every clone drives the same clock and queue.
#[derive(Clone)]
pub struct TestScheduler {
  state: MutArc<TestSchedulerState>,
}

impl Default for TestScheduler {
  fn default() -> Self { Self::with_config(TestSchedulerConfig::default()) }
}

impl TestScheduler {
  pub fn new(initial_clock: VirtualTime) -> Self {
    Self::with_config(TestSchedulerConfig { initial_clock, ..Default::default() })
  }

  /// # Panics
  ///
  /// Panics if `config.resolution` is zero.
  pub fn with_config(config: TestSchedulerConfig) -> Self {
    assert!(!config.resolution.is_zero(), "TestScheduler resolution must be non-zero");
    let state = TestSchedulerState {
      clock: config.initial_clock,
      queue: BinaryHeap::new(),
      next_task_id: 0,
      resolution: config.resolution,
    };
    TestScheduler { state: MutArc::own(state) }
  }

  /// Current virtual time in ticks.
  pub fn clock(&self) -> VirtualTime { self.state.rc_deref().clock }

  /// Converts a duration to ticks, rounding up.
  pub fn to_ticks(&self, duration: Duration) -> VirtualTime {
    self.state.rc_deref().to_ticks(duration)
  }

  /// Number of tasks still waiting to run. Cancelled tasks are not counted.
  pub fn pending_count(&self) -> usize {
    self
      .state
      .rc_deref()
      .queue
      .iter()
      .filter(|t| !t.handle.is_closed())
      .count()
  }

  pub fn is_empty(&self) -> bool { self.pending_count() == 0 }

  /// Schedules `task` at the absolute tick `at`.
  ///
  /// Scheduling in the past is a contract violation and is reported as
  /// [`SchedulerError::ScheduledInPast`]; `at` equal to the current clock is
  /// allowed and runs after the work already queued for this tick.
  pub fn try_schedule_at<F>(&self, at: VirtualTime, task: F) -> Result<TaskHandle, SchedulerError>
  where
    F: FnOnce() + Send + 'static,
  {
    let mut state = self.state.rc_deref_mut();
    if at < state.clock {
      return Err(SchedulerError::ScheduledInPast { at, now: state.clock });
    }
    let handle = TaskHandle::new();
    state.push(at, Work::Once(Box::new(task)), handle.clone());
    Ok(handle)
  }

  /// Like [`TestScheduler::try_schedule_at`].
  ///
  /// # Panics
  ///
  /// Panics if `at` is earlier than the current clock.
  pub fn schedule_at<F>(&self, at: VirtualTime, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    match self.try_schedule_at(at, task) {
      Ok(handle) => handle,
      Err(err) => panic!("{err}"),
    }
  }

  fn pop_due(&self, limit: Option<VirtualTime>) -> Option<ScheduledTask> {
    let mut state = self.state.rc_deref_mut();
    loop {
      let head = state.queue.peek()?;
      if limit.is_some_and(|limit| head.due > limit) {
        return None;
      }
      let task = state.queue.pop()?;
      if task.handle.is_closed() {
        continue;
      }
      debug_assert!(task.due >= state.clock, "virtual clock moved backwards");
      state.clock = task.due;
      return Some(task);
    }
  }

  fn execute_tasks_until(&self, limit: Option<VirtualTime>) {
    // The queue lock is released before a task runs, so tasks are free to
    // schedule more work, including work for the current tick.
    while let Some(ScheduledTask { due, task_id, work, handle }) = self.pop_due(limit) {
      trace!(clock = due, task_id, "run virtual task");
      match work {
        Work::Once(task) => {
          task();
          handle.mark_finished();
        }
        Work::Periodic { period, mut task } => {
          task();
          if !handle.is_closed() {
            // Keeps its sequence number: periodic ties follow schedule order.
            let work = Work::Periodic { period, task };
            let next = ScheduledTask { due: due.saturating_add(period), task_id, work, handle };
            self.state.rc_deref_mut().queue.push(next);
          }
        }
      }
    }
  }

  /// Runs every task due at or before `bound`. The clock stops at the last
  /// executed task.
  pub fn run_until(&self, bound: VirtualTime) { self.execute_tasks_until(Some(bound)); }

  /// Runs every task due at or before `target`, then moves the clock to
  /// `target` if it is still behind.
  pub fn advance_to(&self, target: VirtualTime) {
    self.run_until(target);
    let mut state = self.state.rc_deref_mut();
    if state.clock < target {
      state.clock = target;
    }
  }

  /// Advance virtual time by the specified duration and execute due tasks.
  pub fn advance_by(&self, duration: Duration) {
    let target = {
      let state = self.state.rc_deref();
      state.clock.saturating_add(state.to_ticks(duration))
    };
    self.advance_to(target);
  }

  /// Execute all pending tasks by advancing time to each task's scheduled
  /// time.
  ///
  /// Periodic tasks keep running until they are cancelled, so a pipeline with
  /// a live interval never drains.
  pub fn flush(&self) {
    debug!(clock = self.clock(), "flush virtual scheduler");
    self.execute_tasks_until(None);
  }
}

impl Scheduler for TestScheduler {
  fn now(&self) -> Duration {
    let state = self.state.rc_deref();
    let nanos = state.resolution.as_nanos() * u128::from(state.clock);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
  }

  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let mut state = self.state.rc_deref_mut();
    let due = state.relative(delay);
    let handle = TaskHandle::new();
    state.push(due, Work::Once(Box::new(task)), handle.clone());
    handle
  }

  fn schedule_periodic<F>(&self, period: Duration, task: F) -> TaskHandle
  where
    F: FnMut() + Send + 'static,
  {
    let mut state = self.state.rc_deref_mut();
    let period = state.to_ticks(effective_period(period, state.resolution)).max(1);
    let due = state.clock.saturating_add(period);
    let handle = TaskHandle::new();
    let work = Work::Periodic { period, task: Box::new(task) };
    state.push(due, work, handle.clone());
    handle
  }

  fn min_resolution(&self) -> Duration { self.state.rc_deref().resolution }
}
