//! # Snapshot Wire Format
//!
//! What a device publishes to, and reads from, a cloud slot.
//!
//! ## Shape
//! ```json
//! {
//!   "timestamp": 1718000000000,
//!   "deviceId": "5b0e...",
//!   "payload": {
//!     "categories": [...], "products": [...], "batches": [...],
//!     "customers": [...], "sales": [...], "saleDetails": [...]
//!   }
//! }
//! ```
//!
//! A push carries all six collections. A pull applies every collection
//! except `categories`. A payload that omits a collection reads it as empty.

use chrono::Utc;
use frigo_core::Dataset;
use serde::{Deserialize, Serialize};

/// One published dataset snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSnapshot {
    /// Publish time, epoch milliseconds. Compared against the watermark.
    pub timestamp: i64,

    /// Device that published it.
    pub device_id: String,

    pub payload: Dataset,
}

impl CloudSnapshot {
    /// Wraps a dataset for publishing, stamped with the current time.
    pub fn capture(payload: Dataset, device_id: impl Into<String>) -> Self {
        CloudSnapshot {
            timestamp: Utc::now().timestamp_millis(),
            device_id: device_id.into(),
            payload,
        }
    }

    /// Whether this snapshot should replace local data under `watermark`.
    pub fn is_newer_than(&self, watermark: i64) -> bool {
        self.timestamp > watermark
    }
}
