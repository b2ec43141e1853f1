use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use standup_types::models::{ContactId, DayType, SubscriptionState};

/// Trailing window for the activity-pattern query, in days.
pub const TRAILING_DAYS: i64 = 9;
/// Time-of-day tolerance for the activity-pattern query, in seconds.
pub const TOLERANCE_SECS: i64 = 90 * 60;
/// Silence threshold after which a contact is reminder-eligible at every
/// tick until they respond, in days.
pub const STALE_DAYS: i64 = 7;

/// Durable history and contact rows, as seen by the core.
///
/// The scheduler heuristic is expressed as two named queries with their
/// parameters fixed here, so it can be exercised against a canned store
/// without SQLite anywhere near the tests.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// All durable contacts with their latest message timestamp
    /// (0 when a contact has no history yet).
    async fn load_contacts(&self) -> Result<Vec<(ContactId, SubscriptionState, i64)>>;

    async fn upsert_contact(&self, id: &ContactId, state: SubscriptionState) -> Result<()>;

    /// Drop the contact row only; message history is retained.
    async fn remove_contact(&self, id: &ContactId) -> Result<()>;

    async fn insert_message(&self, id: &ContactId, body: &str, received_at: i64) -> Result<()>;

    /// Contacts that wrote within [`TOLERANCE_SECS`] of `now`'s time-of-day,
    /// on a day of the same type, within the trailing [`TRAILING_DAYS`].
    async fn working_set(&self, day_type: DayType, now: i64) -> Result<HashSet<ContactId>>;

    /// Contacts whose newest message is older than [`STALE_DAYS`].
    async fn stale_set(&self, now: i64) -> Result<HashSet<ContactId>>;
}
