use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// A source of monotonically non-decreasing time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The production clock, backed by [`tokio::time::Instant`].
///
/// When tokio's clock is paused (in tests), this follows the paused time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can hand one clone to a
/// [`Window`](crate::Window) and advance another.
#[derive(Debug, Clone)]
pub struct ManualClock(Arc<Mutex<Instant>>);

// === impl TokioClock ===

impl Clock for TokioClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// === impl ManualClock ===

impl ManualClock {
    /// Returns a new `ManualClock` stopped at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        ManualClock(Arc::new(Mutex::new(start)))
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.0.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new();
        let start = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_millis(6));
        assert_eq!(clock.now(), start + Duration::from_millis(6));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        other.advance(Duration::from_secs(3));
        assert_eq!(clock.now(), other.now());
    }

    #[test]
    fn shared_clock_drives_a_window() {
        let clock = Arc::new(ManualClock::new());
        let window = crate::Window::new(Duration::from_millis(10), 2, clock.clone(), 0).unwrap();
        window.fail();
        clock.advance(Duration::from_millis(11));
        window.success();
        assert_eq!(window.failures(), 0);
        assert_eq!(window.successes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock;
        let start = clock.now();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
    }
}
