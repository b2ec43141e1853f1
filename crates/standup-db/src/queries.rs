use std::collections::HashSet;

use anyhow::Result;
use rusqlite::{OptionalExtension, params};

use standup_core::store::{STALE_DAYS, TOLERANCE_SECS, TRAILING_DAYS};
use standup_types::models::DayType;

use crate::Database;
use crate::models::{ContactRow, HistoryRow, OverviewRow};

/// Overview window and per-contact cap.
pub const OVERVIEW_DAYS: i64 = 3;
pub const OVERVIEW_LIMIT: usize = 5;

const DAY_SECS: i64 = 86_400;

impl Database {
    // -- Contacts --

    pub fn load_contacts(&self) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.subscription, COALESCE(MAX(m.received_at), 0)
                 FROM contacts c
                 LEFT JOIN messages m ON m.contact_id = c.id
                 GROUP BY c.id",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(ContactRow {
                        id: row.get(0)?,
                        subscription: row.get(1)?,
                        last_message_epoch: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn upsert_contact(&self, id: &str, subscription: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contacts (id, subscription) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET subscription = excluded.subscription",
                params![id, subscription],
            )?;
            Ok(())
        })
    }

    /// Drops the contact row only; message history stays.
    pub fn remove_contact(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM contacts WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn contact_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM contacts WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Messages --

    pub fn insert_message(&self, contact_id: &str, received_at: i64, body: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (contact_id, received_at, body) VALUES (?1, ?2, ?3)",
                params![contact_id, received_at, body],
            )?;
            Ok(())
        })
    }

    pub fn has_history(&self, contact_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM messages WHERE contact_id = ?1 LIMIT 1",
                    [contact_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Scheduler heuristic --

    /// Contacts that wrote within the time-of-day tolerance of `now`, on a
    /// day of the same type, inside the trailing window. The time-of-day
    /// distance wraps at midnight.
    pub fn working_set(&self, day_type: DayType, now: i64) -> Result<HashSet<String>> {
        let is_weekend = matches!(day_type, DayType::Weekend) as i64;
        let time_of_day = now.rem_euclid(DAY_SECS);

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT contact_id FROM messages
                 WHERE received_at > ?1
                   AND (CASE WHEN strftime('%w', received_at, 'unixepoch') IN ('0', '6')
                             THEN 1 ELSE 0 END) = ?2
                   AND MIN(ABS((received_at % 86400) - ?3),
                           86400 - ABS((received_at % 86400) - ?3)) <= ?4",
            )?;

            let rows = stmt
                .query_map(
                    params![
                        now - TRAILING_DAYS * DAY_SECS,
                        is_weekend,
                        time_of_day,
                        TOLERANCE_SECS
                    ],
                    |row| row.get::<_, String>(0),
                )?
                .collect::<std::result::Result<HashSet<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Contacts whose newest message is older than the stale threshold.
    pub fn stale_set(&self, now: i64) -> Result<HashSet<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT contact_id FROM messages
                 GROUP BY contact_id
                 HAVING MAX(received_at) < ?1",
            )?;

            let rows = stmt
                .query_map(params![now - STALE_DAYS * DAY_SECS], |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<std::result::Result<HashSet<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Read model --

    /// Trailing-window messages from mutual contacts, ordered for the
    /// overview: contact ascending, newest first within a contact.
    pub fn overview(&self, now: i64) -> Result<Vec<OverviewRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.contact_id, m.received_at, m.body
                 FROM messages m
                 JOIN contacts c ON c.id = m.contact_id
                 WHERE c.subscription = 'both' AND m.received_at > ?1
                 ORDER BY m.contact_id ASC, m.received_at DESC",
            )?;

            let rows = stmt
                .query_map(params![now - OVERVIEW_DAYS * DAY_SECS], |row| {
                    Ok(OverviewRow {
                        contact_id: row.get(0)?,
                        received_at: row.get(1)?,
                        body: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Full history for one contact, newest first, unrestricted by age.
    pub fn history(&self, contact_id: &str) -> Result<Vec<HistoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT received_at, body FROM messages
                 WHERE contact_id = ?1
                 ORDER BY received_at DESC",
            )?;

            let rows = stmt
                .query_map([contact_id], |row| {
                    Ok(HistoryRow {
                        received_at: row.get(0)?,
                        body: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}
