//! Wall-clock budget shared by all search workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Source of elapsed time since the search started.
pub trait Clock: Send + Sync {
    fn elapsed(&self) -> Duration;
}

/// Monotonic clock anchored at construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Optional time limit plus a sticky stop flag.
///
/// Workers poll [`Deadline::expired`] between nodes. The first worker to see
/// the limit pass raises the flag, and every later poll returns true without
/// consulting the clock.
pub struct Deadline<'a> {
    clock: &'a dyn Clock,
    limit: Option<Duration>,
    stopped: AtomicBool,
}

impl<'a> Deadline<'a> {
    pub fn new(clock: &'a dyn Clock, limit: Option<Duration>) -> Self {
        Self {
            clock,
            limit,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn expired(&self) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        match self.limit {
            Some(limit) if self.clock.elapsed() >= limit => {
                self.stopped.store(true, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    /// True once any poll has observed expiry.
    pub fn was_hit(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use super::*;
    use std::sync::atomic::AtomicU64;

    /// Clock that advances one millisecond every time it is read.
    #[derive(Default)]
    pub struct StepClock {
        ticks: AtomicU64,
    }

    impl Clock for StepClock {
        fn elapsed(&self) -> Duration {
            Duration::from_millis(self.ticks.fetch_add(1, Ordering::Relaxed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::StepClock;
    use super::*;

    #[test]
    fn test_unbounded_never_expires() {
        let clock = StepClock::default();
        let deadline = Deadline::new(&clock, None);
        for _ in 0..100 {
            assert!(!deadline.expired());
        }
        assert!(!deadline.was_hit());
    }

    #[test]
    fn test_expiry_is_sticky() {
        let clock = StepClock::default();
        let deadline = Deadline::new(&clock, Some(Duration::from_millis(3)));
        // reads 0, 1, 2 are within the limit
        assert!(!deadline.expired());
        assert!(!deadline.expired());
        assert!(!deadline.expired());
        assert!(deadline.expired());
        assert!(deadline.was_hit());
        assert!(deadline.expired());
    }

    #[test]
    fn test_zero_limit_expires_immediately() {
        let clock = SystemClock::start();
        let deadline = Deadline::new(&clock, Some(Duration::ZERO));
        assert!(deadline.expired());
    }
}
