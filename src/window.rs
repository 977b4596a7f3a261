use crate::{
    clock::{Clock, TokioClock},
    Config, Error,
};
use parking_lot::Mutex;
use tokio::time::{Duration, Instant};

mod bucket;
use bucket::Bucket;

/// Rolling success and failure counts over a sliding time window.
///
/// The window is a ring of buckets, each covering `window / buckets` of time.
/// Recording an event first moves the ring forward past any buckets whose
/// time has lapsed, zeroing them, and then increments the current bucket.
/// There is no background timer: stale buckets are cleared lazily, on the
/// next write.
///
/// Writers take a short lock to find the current bucket; the increment
/// itself and all queries are plain atomic operations. Queries may therefore
/// see some buckets before a concurrent rotation and some after it.
#[derive(Debug)]
pub struct Window<C = TokioClock> {
    buckets: Box<[Bucket]>,
    bucket_time: Duration,
    cursor: Mutex<Cursor>,
    /// Maximum failures counted per bucket. 0 means unbounded.
    failure_cap: u64,
    clock: C,
}

/// A snapshot of counters, for one bucket or summed over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub successes: u64,
    pub failures: u64,
    /// Failures dropped because a bucket had reached its failure cap. These
    /// are not included in `failures`.
    pub limited: u64,
}

#[derive(Debug)]
struct Cursor {
    index: usize,
    last_access: Instant,
}

// === impl Window ===

impl<C: Clock> Window<C> {
    /// Returns a window covering `window`, divided into `buckets` buckets.
    ///
    /// A `failure_cap` of 0 leaves every bucket unbounded; otherwise each
    /// bucket counts at most `failure_cap` failures, and tracks the rest as
    /// [limited](Counts::limited).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] if `buckets` is 0 or does not fit in a
    /// `u32`.
    pub fn new(
        window: Duration,
        buckets: usize,
        clock: C,
        failure_cap: u64,
    ) -> Result<Self, Error> {
        if buckets == 0 {
            return Err(Error::InvalidConfiguration(
                "a window must have at least one bucket".into(),
            ));
        }
        let divisor = u32::try_from(buckets).map_err(|_| {
            Error::InvalidConfiguration(format!("too many buckets ({buckets})"))
        })?;
        let bucket_time = window / divisor;

        tracing::debug!(?window, buckets, ?bucket_time, failure_cap, "new window");
        let last_access = clock.now();
        Ok(Window {
            buckets: (0..buckets).map(|_| Bucket::default()).collect(),
            bucket_time,
            cursor: Mutex::new(Cursor {
                index: 0,
                last_access,
            }),
            failure_cap,
            clock,
        })
    }

    pub fn from_config(config: &Config, clock: C) -> Result<Self, Error> {
        Self::new(config.window, config.buckets, clock, config.failure_cap)
    }

    /// Records a failure in the current bucket.
    pub fn fail(&self) {
        let bucket = self.current_bucket();
        if self.failure_cap == 0 {
            bucket.fail();
        } else {
            bucket.fail_limited(self.failure_cap);
        }
    }

    /// Records a success in the current bucket.
    pub fn success(&self) {
        self.current_bucket().success();
    }

    /// Returns the number of failures in the window.
    pub fn failures(&self) -> u64 {
        self.buckets.iter().map(Bucket::failures).sum()
    }

    /// Returns the number of successes in the window.
    pub fn successes(&self) -> u64 {
        self.buckets.iter().map(Bucket::successes).sum()
    }

    /// Returns the number of failures dropped by the per-bucket cap.
    pub fn limited(&self) -> u64 {
        self.buckets.iter().map(Bucket::limited).sum()
    }

    /// Returns the number of successes and (counted) failures in the window.
    pub fn total(&self) -> u64 {
        self.counts().total()
    }

    /// Returns the fraction of events in the window that were failures, from
    /// 0.0 to 1.0. An empty window has an error rate of 0.0.
    pub fn error_rate(&self) -> f64 {
        self.counts().error_rate()
    }

    /// Sums every counter across the window in a single pass.
    pub fn counts(&self) -> Counts {
        self.buckets
            .iter()
            .map(Bucket::counts)
            .fold(Counts::default(), |acc, c| Counts {
                successes: acc.successes + c.successes,
                failures: acc.failures + c.failures,
                limited: acc.limited + c.limited,
            })
    }

    /// Returns the counts of each bucket, in ring order.
    pub fn bucket_counts(&self) -> impl Iterator<Item = Counts> + '_ {
        self.buckets.iter().map(Bucket::counts)
    }

    /// Zeroes every bucket. Does not move the ring.
    pub fn reset(&self) {
        for bucket in self.buckets.iter() {
            bucket.reset();
        }
    }

    /// Returns the number of buckets in the window.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_time(&self) -> Duration {
        self.bucket_time
    }

    pub fn failure_cap(&self) -> u64 {
        self.failure_cap
    }

    /// Returns the current bucket, first advancing past (and zeroing) any
    /// buckets whose time has lapsed since the last rotation.
    fn current_bucket(&self) -> &Bucket {
        let n = self.buckets.len();
        let mut cursor = self.cursor.lock();
        let now = self.clock.now();
        let mut elapsed = now.saturating_duration_since(cursor.last_access);

        if elapsed > self.bucket_time {
            // Zero each bucket passed over since the last rotation, but never
            // go around the ring more than once.
            let mut advanced = 0;
            while advanced < n {
                cursor.index = (cursor.index + 1) % n;
                self.buckets[cursor.index].reset();
                advanced += 1;
                elapsed -= self.bucket_time;
                if elapsed < self.bucket_time {
                    break;
                }
            }
            cursor.last_access = now;
            tracing::trace!(advanced, index = cursor.index, "rotated window");
        }

        &self.buckets[cursor.index]
    }
}

// === impl Counts ===

impl Counts {
    /// Successes plus counted failures.
    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }

    pub fn error_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.failures as f64 / total as f64
    }
}
