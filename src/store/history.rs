// Per-server sample log, kept sorted by timestamp.

use chrono::{DateTime, Utc};

use super::aggregation;
use crate::models::{Sample, WindowAverages, WindowSpec};

#[derive(Debug, Clone, Default)]
pub struct SampleHistory {
    samples: Vec<Sample>,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample. Late arrivals are inserted at their timestamp position,
    /// after any samples with the same timestamp.
    pub(crate) fn push(&mut self, sample: Sample) {
        match self.samples.last() {
            Some(last) if sample.timestamp < last.timestamp => {
                let idx = self
                    .samples
                    .partition_point(|s| s.timestamp <= sample.timestamp);
                self.samples.insert(idx, sample);
            }
            _ => self.samples.push(sample),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All samples, oldest first.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Drops samples older than `cutoff`; returns how many were removed.
    pub(crate) fn retain_since(&mut self, cutoff: DateTime<Utc>) -> usize {
        let stale = self.samples.partition_point(|s| s.timestamp < cutoff);
        if stale > 0 {
            self.samples.drain(..stale);
            if self.samples.capacity() > 4 * self.samples.len().max(16) {
                self.samples.shrink_to_fit();
            }
        }
        stale
    }

    pub fn averages(&self, now: DateTime<Utc>, window: &WindowSpec) -> WindowAverages {
        aggregation::bucket_averages(&self.samples, now, window)
    }
}

impl FromIterator<Sample> for SampleHistory {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let mut history = Self::new();
        for sample in iter {
            history.push(sample);
        }
        history
    }
}
