use std::collections::HashSet;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::task;

use standup_core::store::StatusStore;
use standup_types::models::{ContactId, DayType, SubscriptionState};

use crate::Database;

// rusqlite connections must not be touched from the async executor, so
// every trait method hops onto the blocking pool with a cloned handle.
#[async_trait]
impl StatusStore for Database {
    async fn load_contacts(&self) -> Result<Vec<(ContactId, SubscriptionState, i64)>> {
        let db = self.clone();
        let rows = task::spawn_blocking(move || db.load_contacts()).await??;

        rows.into_iter()
            .map(|row| {
                let state = SubscriptionState::parse(&row.subscription)
                    .ok_or_else(|| anyhow!("unknown subscription state: {}", row.subscription))?;
                Ok((ContactId::new(&row.id), state, row.last_message_epoch))
            })
            .collect()
    }

    async fn upsert_contact(&self, id: &ContactId, state: SubscriptionState) -> Result<()> {
        let db = self.clone();
        let id = id.as_str().to_owned();
        task::spawn_blocking(move || db.upsert_contact(&id, state.as_str())).await?
    }

    async fn remove_contact(&self, id: &ContactId) -> Result<()> {
        let db = self.clone();
        let id = id.as_str().to_owned();
        task::spawn_blocking(move || db.remove_contact(&id)).await?
    }

    async fn insert_message(&self, id: &ContactId, body: &str, received_at: i64) -> Result<()> {
        let db = self.clone();
        let id = id.as_str().to_owned();
        let body = body.to_owned();
        task::spawn_blocking(move || db.insert_message(&id, received_at, &body)).await?
    }

    async fn working_set(&self, day_type: DayType, now: i64) -> Result<HashSet<ContactId>> {
        let db = self.clone();
        let ids = task::spawn_blocking(move || db.working_set(day_type, now)).await??;
        Ok(ids.iter().map(|id| ContactId::new(id)).collect())
    }

    async fn stale_set(&self, now: i64) -> Result<HashSet<ContactId>> {
        let db = self.clone();
        let ids = task::spawn_blocking(move || db.stale_set(now)).await??;
        Ok(ids.iter().map(|id| ContactId::new(id)).collect())
    }
}
