//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

pub use crate::{
  error::SchedulerError,
  observable::{interval, IntervalObservable, Observable, ObservableExt},
  observer::{BoxedObserver, Observer},
  ops::{
    delay::DelaySubscriptionOp,
    sample::{Latest, OnChange, SampleOp},
    take_time::TakeTimeOp,
    throttle::ThrottleOp,
  },
  rc::{MutArc, RcDeref, RcDerefMut},
  scheduler::{
    Duration, Scheduler, TaskHandle, TestScheduler, TestSchedulerConfig, VirtualTime,
  },
  subscription::*,
  testing::{
    completed, error, next, ColdObservable, HotObservable, HotSubscription, Notification,
    Recorded, StartTimes, SubscriptionInterval, TestObserver,
  },
};
#[cfg(all(feature = "futures-scheduler", feature = "timer", not(target_arch = "wasm32")))]
pub use crate::scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
