// Load samples: stored form and inbound JSON payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation for a server. The owning history is keyed by server name,
/// so the name is not repeated here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub cpu: f64,
    pub mem: f64,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(cpu: f64, mem: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            cpu,
            mem,
            timestamp,
        }
    }
}

/// Body of POST /update. `time` is RFC 3339; when absent the receive time is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplePayload {
    pub name: String,
    pub cpu: f64,
    pub mem: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

impl SamplePayload {
    /// Splits the payload into the server name and the sample to store.
    pub fn into_sample(self, received_at: DateTime<Utc>) -> (String, Sample) {
        let timestamp = self.time.unwrap_or(received_at);
        (self.name, Sample::new(self.cpu, self.mem, timestamp))
    }
}
