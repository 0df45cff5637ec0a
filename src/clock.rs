//! Monotonic clock and scoped timing helper.
//!
//! Timestamps are nanoseconds since a process-wide anchor taken on first use,
//! so they are only comparable within one process.

use crate::types::{Duration, Timestamp};
use std::sync::OnceLock;
use std::time::Instant;

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Current monotonic time.
#[inline]
pub fn now() -> Timestamp {
    let anchor = *ANCHOR.get_or_init(Instant::now);
    Timestamp::new(Duration::from(anchor.elapsed()).get())
}

/// Writes the elapsed time into a caller-owned slot when dropped.
///
/// The write happens on every exit path of the enclosing scope,
/// including early returns, `?` and unwinding panics.
///
/// ```
/// use arb_core::clock::ScopedTimer;
/// use arb_core::Duration;
///
/// let mut elapsed = Duration::default();
/// {
///     let _timer = ScopedTimer::new(&mut elapsed);
///     std::hint::black_box((0..100u64).sum::<u64>());
/// }
/// println!("took {elapsed}");
/// ```
#[must_use = "the timer measures until it is dropped"]
pub struct ScopedTimer<'a> {
    out: &'a mut Duration,
    start: Timestamp,
}

impl<'a> ScopedTimer<'a> {
    #[inline]
    pub fn new(out: &'a mut Duration) -> Self {
        Self { out, start: now() }
    }
}

impl Drop for ScopedTimer<'_> {
    #[inline]
    fn drop(&mut self) {
        *self.out = now() - self.start;
    }
}

/// Human-readable nanosecond count, e.g. `"250 ns"`
pub fn nanos_to_string(time: Duration) -> String {
    format!("{} ns", time.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_monotonic() {
        let a = now();
        let b = now();
        assert!(b >= a);
    }

    #[test]
    fn test_scoped_timer_writes_on_drop() {
        let mut elapsed = Duration::default();
        {
            let _timer = ScopedTimer::new(&mut elapsed);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert!(elapsed.get() >= 2_000_000, "elapsed = {}", elapsed);
    }

    #[test]
    fn test_scoped_timer_early_return() {
        fn timed(out: &mut Duration, bail: bool) -> Option<u32> {
            let _timer = ScopedTimer::new(out);
            if bail {
                return None;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
            Some(1)
        }

        let mut elapsed = Duration::new(u64::MAX);
        assert_eq!(timed(&mut elapsed, true), None);
        assert!(elapsed.get() < u64::MAX);

        let mut elapsed = Duration::default();
        assert_eq!(timed(&mut elapsed, false), Some(1));
        assert!(elapsed.get() >= 1_000_000);
    }

    #[test]
    fn test_scoped_timer_on_panic() {
        let mut elapsed = Duration::new(u64::MAX);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _timer = ScopedTimer::new(&mut elapsed);
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(elapsed.get() < u64::MAX);
    }

    #[test]
    fn test_nanos_to_string() {
        assert_eq!(nanos_to_string(Duration::new(250)), "250 ns");
    }
}
