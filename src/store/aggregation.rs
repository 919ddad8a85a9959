// Bucketing: pure fold from a time-sorted sample slice to per-bucket averages.
// Locking and retention stay in store::mod / store::history.

use chrono::{DateTime, Utc};

use crate::models::{BucketAverage, Sample, WindowAverages, WindowSpec};

/// Running sums for the bucket currently being filled.
#[derive(Debug, Default)]
struct BucketAccumulator {
    count: usize,
    cpu_sum: f64,
    mem_sum: f64,
}

impl BucketAccumulator {
    fn add(&mut self, sample: &Sample) {
        self.count += 1;
        self.cpu_sum += sample.cpu;
        self.mem_sum += sample.mem;
    }

    /// Emits the average for a bucket that received samples and resets the sums.
    fn take(&mut self, bucket_start: DateTime<Utc>) -> Option<BucketAverage> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let avg = BucketAverage {
            bucket_start,
            samples: self.count,
            cpu_average: self.cpu_sum / n,
            mem_average: self.mem_sum / n,
        };
        *self = Self::default();
        Some(avg)
    }
}

/// Averages `samples` (ascending by timestamp) into the buckets of `window` ending at `now`.
///
/// Bucket j (1 = most recent) covers `[now - j*w, now - (j-1)*w)`. Samples before
/// `now - length` or at/after `now` are ignored. Only buckets with samples are
/// returned, most recent first.
pub fn bucket_averages(
    samples: &[Sample],
    now: DateTime<Utc>,
    window: &WindowSpec,
) -> WindowAverages {
    let width = window.bucket_width();
    let window_start = now
        .checked_sub_signed(window.length())
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let first = samples.partition_point(|s| s.timestamp < window_start);
    let end = samples.partition_point(|s| s.timestamp < now).max(first);
    let in_window = &samples[first..end];

    let mut buckets = Vec::new();
    let mut acc = BucketAccumulator::default();
    let mut bucket_start = now.checked_sub_signed(width).unwrap_or(window_start);

    for sample in in_window.iter().rev() {
        while sample.timestamp < bucket_start {
            buckets.extend(acc.take(bucket_start));
            bucket_start = bucket_start
                .checked_sub_signed(width)
                .unwrap_or(window_start);
        }
        acc.add(sample);
    }
    buckets.extend(acc.take(bucket_start));

    WindowAverages {
        window: *window,
        buckets,
    }
}
