//! Prioritized render-job queues, the pressure heuristic and the fallback timer.

/// Job classes and coalescing job lists.
pub mod job;
/// The render scheduler.
pub mod queue;
/// Fallback timer and pressure tracking.
pub mod timer;

pub use job::{JobClass, JobList, RenderJob};
pub use queue::{PassReport, RenderScheduler, SchedulerStats};
pub use timer::{FallbackTimer, PressureTracker};
