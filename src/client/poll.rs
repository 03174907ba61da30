// ABOUTME: Monotonic clock abstraction and the deadline polling policy used by every wait loop
// ABOUTME: All suspension in the driver goes through a Clock so waits stay bounded and testable

use std::fmt::Debug;
use std::thread;
use std::time::{Duration, Instant};

/// Source of monotonic time and blocking sleeps
///
/// The driver never reads the clock or sleeps directly; it goes through the
/// session's `Clock` so every wait is bounded by a deadline computed from
/// the same source.
pub trait Clock: Debug {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// `Clock` backed by `std::time::Instant` and `std::thread::sleep`
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Retry policy for "poll until something arrives or the deadline passes"
///
/// Shared by the confirmation protocol and every workflow wait loop. The
/// deadline is fixed when polling starts and never extended.
///
/// # Example
///
/// ```rust
/// use sim800::client::{PollPolicy, SystemClock};
/// use std::time::Duration;
///
/// let policy = PollPolicy::new(Duration::from_millis(1), Duration::from_millis(20));
/// let mut attempts = 0;
/// let found = policy.run(&SystemClock, || {
///     attempts += 1;
///     Ok::<_, ()>((attempts == 3).then_some(attempts))
/// });
/// assert_eq!(found, Ok(Some(3)));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between attempts
    pub interval: Duration,
    /// Total time allowed, measured from the first attempt
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Call `attempt` until it yields a value or the deadline passes.
    ///
    /// Returns `Ok(None)` on timeout. Errors from `attempt` stop polling
    /// immediately.
    pub fn run<C, T, E, F>(&self, clock: &C, mut attempt: F) -> Result<Option<T>, E>
    where
        C: Clock + ?Sized,
        F: FnMut() -> Result<Option<T>, E>,
    {
        let deadline = clock.now() + self.timeout;
        loop {
            if let Some(value) = attempt()? {
                return Ok(Some(value));
            }
            if clock.now() >= deadline {
                return Ok(None);
            }
            clock.sleep(self.interval);
        }
    }
}
