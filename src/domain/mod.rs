pub mod clock;
pub mod task;

pub use clock::{Clock, SystemClock};
pub use task::{span_seconds, ClosedRun, RunToggle, Task, TaskError, TaskList};

#[cfg(test)]
pub use clock::ManualClock;
