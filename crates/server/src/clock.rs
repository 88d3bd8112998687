use chrono::{DateTime, Utc};
#[cfg(test)]
use std::sync::atomic::{AtomicI32, Ordering};

/// Source of "now" for anything that validates or stamps against the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant; for deterministic tests
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Advances by `step` on every reading, so successive writes get distinct stamps
#[cfg(test)]
#[derive(Debug)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    step: chrono::Duration,
    ticks: AtomicI32,
}

#[cfg(test)]
impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: chrono::Duration) -> Self {
        Self {
            start,
            step,
            ticks: AtomicI32::new(0),
        }
    }
}

#[cfg(test)]
impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        self.start + self.step * self.ticks.fetch_add(1, Ordering::SeqCst)
    }
}
