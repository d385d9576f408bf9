use chrono::{DateTime, Local};

/// Wall-clock time source. Injectable so the timer logic is testable
/// with a steerable fake instead of the real clock.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Settable clock for tests. Shared via `Rc` so a test can advance time
/// while the engine holds the same clock.
#[cfg(test)]
pub struct ManualClock {
    now: std::cell::Cell<DateTime<Local>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: std::cell::Cell::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        self.now.set(now);
    }

    pub fn advance(&self, delta: chrono::Duration) {
        self.now.set(self.now.get() + delta);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}
