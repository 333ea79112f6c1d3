use serde::{Deserialize, Serialize};

/// The sensor last streamed from; lets the next start skip discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub address: String,
    #[serde(rename = "fw_number")]
    pub firmware_version: String,
}
