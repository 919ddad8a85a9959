// Shared test helpers

#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serverload::models::Sample;

/// Fixed reference instant so bucket edges are deterministic.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn secs(n: i64) -> TimeDelta {
    TimeDelta::seconds(n)
}

pub fn mins(n: i64) -> TimeDelta {
    TimeDelta::minutes(n)
}

pub fn hours(n: i64) -> TimeDelta {
    TimeDelta::hours(n)
}

pub fn sample(timestamp: DateTime<Utc>, cpu: f64, mem: f64) -> Sample {
    Sample::new(cpu, mem, timestamp)
}
