// Computed averages: one row per non-empty bucket, grouped per window and per server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::WindowSpec;

/// Mean load over the samples that fell into one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAverage {
    /// Inclusive lower edge of the bucket.
    pub bucket_start: DateTime<Utc>,
    pub samples: usize,
    pub cpu_average: f64,
    pub mem_average: f64,
}

/// Buckets for one window, most recent first. Buckets without samples are omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAverages {
    pub window: WindowSpec,
    pub buckets: Vec<BucketAverage>,
}

impl WindowAverages {
    pub fn empty(window: WindowSpec) -> Self {
        Self {
            window,
            buckets: Vec::new(),
        }
    }

    /// CPU averages aligned with `mem()`: position n in both is the same bucket.
    pub fn cpu(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.cpu_average).collect()
    }

    pub fn mem(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.mem_average).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Result of one averages query for a known server.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityAverages {
    pub entity: String,
    /// Samples currently held for the server (all ages).
    pub samples: usize,
    pub windows: Vec<WindowAverages>,
}

impl EntityAverages {
    /// Server is known but has nothing stored (e.g. everything was swept by retention).
    pub fn is_empty_history(&self) -> bool {
        self.samples == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub name: String,
    pub samples: usize,
    pub latest: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub entities: usize,
    pub samples: usize,
}
