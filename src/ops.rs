//! Time-based operators. Each operator is a struct holding its upstream and
//! parameters; the behaviour lives in the observer it installs on subscribe.
pub mod delay;
pub mod sample;
pub mod take_time;
pub mod throttle;
