//! Rolling success/failure counts over a sliding time window, for circuit
//! breakers to poll.
//!
//! ```
//! use rolling_window::{clock::ManualClock, Window};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let window = Window::new(Duration::from_secs(10), 10, clock.clone(), 0)?;
//! window.fail();
//! window.success();
//! assert_eq!(window.error_rate(), 0.5);
//!
//! // once the whole window has passed, old events no longer count.
//! clock.advance(Duration::from_secs(11));
//! window.success();
//! assert_eq!(window.error_rate(), 0.0);
//! # Ok::<(), rolling_window::Error>(())
//! ```
pub mod clock;
mod error;
pub mod service;
mod window;

pub use self::{
    clock::Clock,
    error::Error,
    service::Recorded,
    window::{Counts, Window},
};
use tokio::time::Duration;

/// The default time covered by a window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// The default number of buckets a window is divided into.
pub const DEFAULT_BUCKETS: usize = 10;

/// Configures a [`Window`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// The total time covered by the window.
    pub window: Duration,
    /// How many buckets the window is divided into. Each bucket covers
    /// `window / buckets`.
    pub buckets: usize,
    /// The most failures a single bucket will count, or 0 for no limit.
    pub failure_cap: u64,
}

// === impl Config ===

impl Config {
    pub fn with_window(self, window: Duration) -> Self {
        Self { window, ..self }
    }

    pub fn with_buckets(self, buckets: usize) -> Self {
        Self { buckets, ..self }
    }

    pub fn with_failure_cap(self, failure_cap: u64) -> Self {
        Self {
            failure_cap,
            ..self
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            window: DEFAULT_WINDOW,
            buckets: DEFAULT_BUCKETS,
            failure_cap: 0,
        }
    }
}
