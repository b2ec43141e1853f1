use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

/// Bare identity on the presence channel (`user@domain`).
///
/// Construction normalizes: lowercase, any `/resource` suffix stripped.
/// Two addresses that differ only in case or resource are the same contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    pub fn new(raw: &str) -> Self {
        let bare = raw.split('/').next().unwrap_or(raw);
        Self(bare.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ContactId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Mutual-opt-in presence relationship between the service and a contact.
/// Only `Both` contacts are reminder-eligible and listed in the overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    None,
    PendingOut,
    PendingIn,
    Both,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PendingOut => "pending_out",
            Self::PendingIn => "pending_in",
            Self::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "pending_out" => Some(Self::PendingOut),
            "pending_in" => Some(Self::PendingIn),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// A roster contact as held in memory during the process lifetime.
#[derive(Debug, Clone)]
pub struct Contact {
    pub id: ContactId,
    pub state: SubscriptionState,
    /// Epoch seconds of the most recent accepted status update; 0 = never.
    pub last_activity: i64,
    /// Epoch seconds of the most recent reminder; process-lifetime only,
    /// never persisted.
    pub last_reminder: i64,
}

impl Contact {
    pub fn new(id: ContactId, state: SubscriptionState) -> Self {
        Self {
            id,
            state,
            last_activity: 0,
            last_reminder: 0,
        }
    }

    /// The later of last activity and last reminder; reminders are
    /// rate-limited against this.
    pub fn quiet_since(&self) -> i64 {
        self.last_activity.max(self.last_reminder)
    }
}

/// Weekday/weekend bucket used to match historical activity against a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub fn of_epoch(epoch: i64) -> Self {
        let dt = chrono::DateTime::from_timestamp(epoch, 0).unwrap_or_default();
        match dt.weekday() {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }
}

/// Who may submit status updates: anyone who writes to us, or only
/// mutually subscribed contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionPolicy {
    Permissive,
    Strict,
}

impl FromStr for AdmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown admission policy '{other}' (expected 'permissive' or 'strict')"
            )),
        }
    }
}

/// What a steady-state store failure does: reply to the requester, or
/// terminate the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorPolicy {
    Report,
    Fatal,
}

impl FromStr for StoreErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report" => Ok(Self::Report),
            "fatal" => Ok(Self::Fatal),
            other => Err(format!(
                "unknown store error policy '{other}' (expected 'report' or 'fatal')"
            )),
        }
    }
}
