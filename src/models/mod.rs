// Domain models

mod average;
mod sample;
mod window;

pub use average::{BucketAverage, EntityAverages, EntitySummary, StoreStats, WindowAverages};
pub use sample::{Sample, SamplePayload};
pub use window::WindowSpec;
