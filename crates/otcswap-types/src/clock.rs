//! Deadline clock.
//!
//! Offers never expire proactively: expiry is detected lazily whenever a
//! guarded operation compares the caller-observed time against the offer's
//! deadline.

use chrono::{DateTime, Duration, Utc};

/// Source of the current time for deadline checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `true` once strictly more than `deadline_seconds` have elapsed since
/// `created_at`.
#[must_use]
pub fn has_deadline_passed(
    created_at: DateTime<Utc>,
    deadline_seconds: u64,
    now: DateTime<Utc>,
) -> bool {
    let Ok(secs) = i64::try_from(deadline_seconds) else {
        return false;
    };
    now.signed_duration_since(created_at) > Duration::seconds(secs)
}

/// A clock that only moves when told to. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    /// Move the clock forward by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().expect("manual clock poisoned");
        *now += Duration::seconds(secs);
    }

    /// Jump to an absolute instant (may move backwards).
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().expect("manual clock poisoned") = instant;
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("manual clock poisoned")
    }
}
