use super::Counts;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// Counts for one time slice of a [`Window`](super::Window).
///
/// Every counter is independently atomic. A reset racing with increments may
/// leave a mix of pre- and post-reset counters, but never a torn value.
#[derive(Debug, Default)]
pub(super) struct Bucket {
    successes: AtomicU64,
    failures: AtomicU64,
    /// Failures that arrived after `failures` reached the cap.
    limited: AtomicU64,
}

impl Bucket {
    pub(super) fn reset(&self) {
        self.successes.store(0, Relaxed);
        self.failures.store(0, Relaxed);
        self.limited.store(0, Relaxed);
    }

    pub(super) fn success(&self) {
        self.successes.fetch_add(1, Relaxed);
    }

    pub(super) fn fail(&self) {
        self.failures.fetch_add(1, Relaxed);
    }

    /// Records a failure, unless this bucket already holds `cap` failures, in
    /// which case the event is counted as limited instead.
    ///
    /// A `cap` of 0 means no cap. Returns `false` if the failure was limited.
    pub(super) fn fail_limited(&self, cap: u64) -> bool {
        if cap == 0 {
            self.fail();
            return true;
        }

        let counted = self
            .failures
            .fetch_update(Relaxed, Relaxed, |n| (n < cap).then_some(n + 1))
            .is_ok();
        if !counted && self.limited.fetch_add(1, Relaxed) == 0 {
            tracing::trace!(cap, "bucket saturated; limiting further failures");
        }
        counted
    }

    pub(super) fn successes(&self) -> u64 {
        self.successes.load(Relaxed)
    }

    pub(super) fn failures(&self) -> u64 {
        self.failures.load(Relaxed)
    }

    pub(super) fn limited(&self) -> u64 {
        self.limited.load(Relaxed)
    }

    pub(super) fn counts(&self) -> Counts {
        Counts {
            successes: self.successes.load(Relaxed),
            failures: self.failures.load(Relaxed),
            limited: self.limited.load(Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_resets() {
        let bucket = Bucket::default();
        bucket.fail();
        bucket.fail();
        bucket.success();
        assert_eq!(
            bucket.counts(),
            Counts {
                successes: 1,
                failures: 2,
                limited: 0
            }
        );

        bucket.reset();
        assert_eq!(bucket.counts(), Counts::default());
    }

    #[test]
    fn fail_limited_caps_failures() {
        let bucket = Bucket::default();
        for _ in 0..3 {
            assert!(bucket.fail_limited(3));
        }
        assert!(!bucket.fail_limited(3));
        assert!(!bucket.fail_limited(3));

        let counts = bucket.counts();
        assert_eq!(counts.failures, 3);
        assert_eq!(counts.limited, 2);

        bucket.reset();
        assert_eq!(bucket.counts(), Counts::default());
        assert!(bucket.fail_limited(3));
        assert_eq!(bucket.failures(), 1);
        assert_eq!(bucket.limited(), 0);
        assert_eq!(bucket.successes(), 0);
    }

    #[test]
    fn zero_cap_is_unbounded() {
        let bucket = Bucket::default();
        for _ in 0..1000 {
            assert!(bucket.fail_limited(0));
        }
        assert_eq!(bucket.counts().failures, 1000);
        assert_eq!(bucket.counts().limited, 0);
    }

    #[test]
    fn concurrent_fail_limited_never_passes_cap() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 500;
        const CAP: u64 = 1024;

        let bucket = Bucket::default();
        std::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..PER_THREAD {
                        bucket.fail_limited(CAP);
                    }
                });
            }
        });

        let counts = bucket.counts();
        assert_eq!(counts.failures, CAP);
        assert_eq!(counts.failures + counts.limited, THREADS * PER_THREAD);
    }
}
