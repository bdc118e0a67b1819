//! Wall-clock sources and per-replica version generation.

use crate::id::Version;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default increment applied when the clock has not moved past the last
/// issued version.
pub const DEFAULT_VERSION_EPSILON: f64 = 0.001;

/// A source of millisecond timestamps. Expected to be non-decreasing.
pub trait Clock {
    fn now_millis(&self) -> f64;
}

/// Reads the system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> f64 {
        Utc::now().timestamp_millis() as f64
    }
}

/// A settable clock for deterministic tests and simulations.
///
/// Clones share the same underlying time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_millis: f64) -> Self {
        ManualClock {
            millis: Arc::new(AtomicU64::new(start_millis.to_bits())),
        }
    }

    pub fn set(&self, millis: f64) {
        self.millis.store(millis.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, delta_millis: f64) {
        let now = self.now_millis();
        self.set(now + delta_millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> f64 {
        f64::from_bits(self.millis.load(Ordering::SeqCst))
    }
}

/// Issues strictly increasing versions for one replica.
///
/// `next(now)` is `max(now, last_issued + epsilon)`, computed directly.
#[derive(Clone, Debug)]
pub struct VersionGenerator {
    last_issued: Version,
    epsilon: f64,
}

impl VersionGenerator {
    pub fn new(epsilon: f64) -> Self {
        VersionGenerator {
            last_issued: Version::ZERO,
            epsilon,
        }
    }

    pub fn last_issued(&self) -> Version {
        self.last_issued
    }

    /// Never issue a version at or below `floor` from now on.
    pub fn advance_to(&mut self, floor: Version) {
        if floor > self.last_issued {
            self.last_issued = floor;
        }
    }

    /// Issue the next version given the current clock reading.
    pub fn next(&mut self, now_millis: f64) -> Version {
        let next = match Version::new(now_millis) {
            Ok(now) if now > self.last_issued => now,
            // A clock that is behind, stalled or broken still yields a
            // strictly greater version.
            _ => self.last_issued.bumped(self.epsilon),
        };
        self.last_issued = next;
        next
    }
}

impl Default for VersionGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_EPSILON)
    }
}
