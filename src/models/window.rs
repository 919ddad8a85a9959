// Query window: how far back to look and how wide each bucket is

use std::time::Duration;

use chrono::TimeDelta;

use crate::error::{CoreError, Result};

/// A validated (length, bucket width) pair where length is a whole number of buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    length: TimeDelta,
    bucket_width: TimeDelta,
    bucket_count: u32,
}

impl WindowSpec {
    /// Last 60 minutes, one bucket per minute.
    pub const LAST_HOUR_BY_MINUTE: WindowSpec = WindowSpec {
        length: TimeDelta::minutes(60),
        bucket_width: TimeDelta::minutes(1),
        bucket_count: 60,
    };

    /// Last 24 hours, one bucket per hour.
    pub const LAST_DAY_BY_HOUR: WindowSpec = WindowSpec {
        length: TimeDelta::hours(24),
        bucket_width: TimeDelta::hours(1),
        bucket_count: 24,
    };

    pub fn new(length: Duration, bucket_width: Duration) -> Result<Self> {
        if bucket_width.is_zero() {
            return Err(CoreError::InvalidInput(
                "bucket width must be greater than zero".into(),
            ));
        }
        if length.is_zero() {
            return Err(CoreError::InvalidInput(
                "window length must be greater than zero".into(),
            ));
        }
        if length.as_nanos() % bucket_width.as_nanos() != 0 {
            return Err(CoreError::InvalidInput(format!(
                "window length {:?} is not a multiple of bucket width {:?}",
                length, bucket_width
            )));
        }
        let bucket_count = u32::try_from(length.as_nanos() / bucket_width.as_nanos())
            .map_err(|_| CoreError::InvalidInput(format!("too many buckets in {:?}", length)))?;
        let length = TimeDelta::from_std(length)
            .map_err(|e| CoreError::InvalidInput(format!("window length out of range: {}", e)))?;
        let bucket_width = TimeDelta::from_std(bucket_width)
            .map_err(|e| CoreError::InvalidInput(format!("bucket width out of range: {}", e)))?;
        Ok(Self {
            length,
            bucket_width,
            bucket_count,
        })
    }

    pub fn from_secs(length_secs: u64, bucket_secs: u64) -> Result<Self> {
        Self::new(
            Duration::from_secs(length_secs),
            Duration::from_secs(bucket_secs),
        )
    }

    /// The two windows served by GET /get/{server}.
    pub fn defaults() -> Vec<WindowSpec> {
        vec![Self::LAST_HOUR_BY_MINUTE, Self::LAST_DAY_BY_HOUR]
    }

    pub fn length(&self) -> TimeDelta {
        self.length
    }

    pub fn bucket_width(&self) -> TimeDelta {
        self.bucket_width
    }

    pub fn bucket_count(&self) -> u32 {
        self.bucket_count
    }
}
