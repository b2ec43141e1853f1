//! Adaptive reminder scheduler.
//!
//! A fixed global cadence is wrong for a distributed team, so each tick
//! asks the store who is normally active around this hour on this kind of
//! day, learned from their own history. The stale escalation guarantees
//! nobody is permanently skipped just because they never matched the
//! time-of-day bucket.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use standup_types::models::{ContactId, DayType, SubscriptionState};

use crate::service::Service;
use crate::store::StatusStore;

/// Tick cadence, aligned to the wall clock.
pub const TICK_SECS: i64 = 30 * 60;
/// Never remind the same contact twice inside one interval.
pub const RATE_LIMIT_SECS: i64 = 30 * 60;

pub const REMINDER_TEXT: &str = "What are you doing?";

/// Delay until the next wall-clock multiple of the tick interval, so the
/// first tick lands on a boundary rather than a full interval after start.
pub fn first_tick_delay(now_epoch: i64) -> Duration {
    let rem = now_epoch.rem_euclid(TICK_SECS);
    Duration::from_secs((TICK_SECS - rem) as u64)
}

impl<S: StatusStore> Service<S> {
    /// One scheduler tick at `now` (epoch seconds): compute the working set
    /// and nudge the quiet contacts in it. Never fatal.
    pub async fn on_tick(&mut self, now: i64) {
        let day_type = DayType::of_epoch(now);
        let working = self.tick_working_set(day_type, now).await;
        debug!("tick: {} contacts in working set", working.len());

        let due: Vec<ContactId> = self
            .directory
            .iter()
            .filter(|c| c.state == SubscriptionState::Both)
            .filter(|c| now - c.quiet_since() >= RATE_LIMIT_SECS)
            .filter(|c| working.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();

        for id in due {
            info!("reminding {}", id);
            self.channel.send_chat(&id, REMINDER_TEXT);
            if let Some(contact) = self.directory.get_mut(&id) {
                contact.last_reminder = now;
            }
        }
    }

    /// A failed query degrades this tick to an empty working set; the next
    /// tick queries again.
    async fn tick_working_set(&self, day_type: DayType, now: i64) -> HashSet<ContactId> {
        let mut set = match self.store.working_set(day_type, now).await {
            Ok(set) => set,
            Err(e) => {
                warn!("working-set query failed: {:#}", e);
                return HashSet::new();
            }
        };
        match self.store.stale_set(now).await {
            Ok(stale) => set.extend(stale),
            Err(e) => {
                warn!("stale-set query failed: {:#}", e);
                return HashSet::new();
            }
        }
        set
    }
}
