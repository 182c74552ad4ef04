//! Abstractions for providing the current time.
//!
//! The stack never sleeps. Timeouts are expressed as "time elapsed since an
//! instant", where instants come from a monotonic millisecond tick provided by
//! an `Env`. On a microcontroller this is typically a SysTick counter.

use core::fmt::Debug;
use core::ops::{
    Add,
    AddAssign,
};
use core::time::Duration;

/// A point in time, in milliseconds since some arbitrary epoch (usually boot).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    millis: u64,
}

impl Instant {
    pub fn from_millis(millis: u64) -> Instant {
        Instant { millis }
    }

    pub fn millis(&self) -> u64 {
        self.millis
    }

    /// Returns the time elapsed from an earlier instant to this one, or zero if
    /// the earlier instant is actually later.
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration::from_millis(self.millis.saturating_sub(earlier.millis))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, duration: Duration) -> Instant {
        let millis = duration.as_secs() * 1000 + duration.subsec_millis() as u64;
        Instant::from_millis(self.millis.saturating_add(millis))
    }
}

impl AddAssign<Duration> for Instant {
    fn add_assign(&mut self, duration: Duration) {
        *self = *self + duration;
    }
}

/// An environment that provides the current time.
pub trait Env: Clone + Debug {
    /// Returns an instant corresponding to "now".
    fn now_instant(&self) -> Instant;
}

/// An environment that provides system based time.
#[cfg(feature = "std")]
#[derive(Clone, Debug)]
pub struct SystemEnv {
    epoch: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemEnv {
    pub fn new() -> SystemEnv {
        SystemEnv {
            epoch: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Env for SystemEnv {
    fn now_instant(&self) -> Instant {
        let elapsed = self.epoch.elapsed();
        Instant::from_millis(elapsed.as_secs() * 1000 + elapsed.subsec_millis() as u64)
    }
}

/// An environment that provides a configurable time.
#[derive(Clone, Debug)]
pub struct MockEnv {
    pub now: Instant,
}

impl MockEnv {
    pub fn new() -> MockEnv {
        MockEnv {
            now: Instant::from_millis(0),
        }
    }
}

impl Env for MockEnv {
    fn now_instant(&self) -> Instant {
        self.now
    }
}
