//! # rxtime: time-based reactive streams
//!
//! A push-based reactive-stream engine whose every notion of time goes through
//! a [`Scheduler`](scheduler::Scheduler). Swap in the virtual-time
//! [`TestScheduler`](scheduler::TestScheduler) and a pipeline of timers runs in
//! zero wall-clock time with an exact, reproducible event order.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxtime::prelude::*;
//!
//! let scheduler = TestScheduler::default();
//! let xs = scheduler.hot::<i32, ()>(vec![
//!   next(210, 1),
//!   next(240, 2),
//!   next(250, 3),
//!   next(280, 4),
//!   completed(300),
//! ]);
//! let s = scheduler.clone();
//! let res = scheduler.start(move || xs.throttle(Duration::from_millis(20), s));
//!
//! assert_eq!(res, vec![next(230, 1), next(270, 3), next(300, 4), completed(300)]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`](observable::Observable) | A producer subscribed by an observer |
//! | [`Observer`](observer::Observer) | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`](subscription::Subscription) | Handle to cancel an active subscription |
//! | [`Scheduler`](scheduler::Scheduler) | Runs tasks now, later, or periodically |
//!
//! ## Features
//!
//! - `futures-scheduler` + `timer` (default): `ThreadPoolScheduler` on a futures
//!   thread pool
//! - `tokio-scheduler`: `TokioScheduler` on a tokio runtime

pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subscription;
pub mod testing;
