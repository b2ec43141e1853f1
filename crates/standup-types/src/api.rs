use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ContactId;

// Read-surface response shapes. Rendering is the client's concern; the
// service only serves the ordered data.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    pub received_at: DateTime<Utc>,
    pub body: String,
}

/// One contact's slice of the overview: newest first, capped.
#[derive(Debug, Serialize, Deserialize)]
pub struct OverviewGroup {
    pub contact: ContactId,
    pub messages: Vec<StatusEntry>,
}

/// Full history for one contact, newest first, unrestricted by age.
#[derive(Debug, Serialize, Deserialize)]
pub struct ContactHistory {
    pub contact: ContactId,
    pub messages: Vec<StatusEntry>,
}
