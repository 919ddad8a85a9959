// Wire format for averages (GET /get/{server} and WS /ws/get/{server}).

use serde::{Deserialize, Serialize};

use crate::models::{BucketAverage, EntityAverages, WindowAverages};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowReport {
    pub length_secs: i64,
    pub bucket_secs: i64,
    /// Non-empty buckets, most recent first.
    pub buckets: Vec<BucketAverage>,
    /// Same order as `buckets`.
    pub cpu: Vec<f64>,
    pub mem: Vec<f64>,
}

impl From<&WindowAverages> for WindowReport {
    fn from(w: &WindowAverages) -> Self {
        Self {
            length_secs: w.window.length().num_seconds(),
            bucket_secs: w.window.bucket_width().num_seconds(),
            buckets: w.buckets.clone(),
            cpu: w.cpu(),
            mem: w.mem(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub server: String,
    pub samples: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub windows: Vec<WindowReport>,
}

impl From<&EntityAverages> for LoadReport {
    fn from(a: &EntityAverages) -> Self {
        let message = a
            .is_empty_history()
            .then(|| format!("No update information for server {} found.", a.entity));
        Self {
            server: a.entity.clone(),
            samples: a.samples,
            message,
            windows: a.windows.iter().map(WindowReport::from).collect(),
        }
    }
}
