//! Glide Animation Primitives
//!
//! Easing curves and the tick scheduler that drives timed animations.
//!
//! # Features
//!
//! - **Easing Table**: closed set of polynomial curves (quad through quint)
//!   with in, out and in-out variants, plus linear
//! - **Tick Scheduler**: deferred, delayed and periodic tasks over a
//!   millisecond clock, pumped manually or from a background thread
//! - **Weak Handles**: components schedule through a handle that never keeps
//!   the scheduler alive

pub mod easing;
pub mod scheduler;

pub use easing::{ease, Easing, EasingFn, UnknownEasing};
pub use scheduler::{SchedulerHandle, TaskCallback, TaskControl, TaskId, TickScheduler};
