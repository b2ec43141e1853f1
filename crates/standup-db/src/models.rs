//! Database row types mapping directly to SQLite rows.
//! Distinct from the shared models to keep the DB layer self-contained.

pub struct ContactRow {
    pub id: String,
    pub subscription: String,
    /// 0 when the contact has no message history yet.
    pub last_message_epoch: i64,
}

pub struct OverviewRow {
    pub contact_id: String,
    pub received_at: i64,
    pub body: String,
}

pub struct HistoryRow {
    pub received_at: i64,
    pub body: String,
}
