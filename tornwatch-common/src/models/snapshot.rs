use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// A regenerating bar (life, energy, nerve, happiness).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    #[serde(default)]
    pub current: i64,
    #[serde(default)]
    pub maximum: i64,
    /// Seconds until the bar is full. Absent when the API omits it.
    #[serde(default, rename = "fulltime")]
    pub seconds_to_full: Option<i64>,
}

/// Seconds remaining on each item cooldown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooldowns {
    #[serde(default)]
    pub drug: Option<i64>,
    #[serde(default)]
    pub medical: Option<i64>,
    #[serde(default)]
    pub booster: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Refills {
    #[serde(default)]
    pub energy_refill_used: bool,
    #[serde(default)]
    pub nerve_refill_used: bool,
    #[serde(default)]
    pub token_refill_used: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationCounts {
    #[serde(default)]
    pub messages: i64,
    #[serde(default)]
    pub events: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Travel {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default, rename = "time_left")]
    pub seconds_remaining: i64,
    /// Epoch seconds of arrival.
    #[serde(default, rename = "timestamp")]
    pub arrival_timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalStats {
    #[serde(default)]
    pub boosters_max_cooldown_hours: Option<f64>,
}

/// Point-in-time read of the account's primary status.
///
/// Built once from a response body and never mutated; a successful poll
/// replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryStatusSnapshot {
    #[serde(default)]
    pub life: Option<Bar>,
    #[serde(default)]
    pub energy: Option<Bar>,
    #[serde(default)]
    pub nerve: Option<Bar>,
    #[serde(default, rename = "happy")]
    pub happiness: Option<Bar>,
    #[serde(default)]
    pub cooldowns: Option<Cooldowns>,
    #[serde(default)]
    pub refills: Option<Refills>,
    #[serde(default)]
    pub notifications: Option<NotificationCounts>,
    #[serde(default)]
    pub travel: Option<Travel>,
    #[serde(default)]
    pub personalstats: Option<PersonalStats>,
}

impl PrimaryStatusSnapshot {
    /// Decodes a response body, reporting the offending field path on failure.
    pub fn from_json(value: Value) -> Result<Self, Error> {
        serde_path_to_error::deserialize(value).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Account-level booster maximum, falling back to `default_seconds`.
    pub fn booster_max_cooldown_seconds(&self, default_seconds: u64) -> u64 {
        self.personalstats
            .as_ref()
            .and_then(|p| p.boosters_max_cooldown_hours)
            .filter(|hours| hours.is_finite() && *hours > 0.0)
            .map(|hours| (hours * 3600.0).round() as u64)
            .unwrap_or(default_seconds)
    }

    /// True when either daily refill is still available.
    pub fn has_unused_refill(&self) -> bool {
        self.refills
            .as_ref()
            .map(|r| !r.energy_refill_used || !r.nerve_refill_used)
            .unwrap_or(false)
    }

    pub fn travel_destination(&self) -> Option<&str> {
        self.travel.as_ref().and_then(|t| t.destination.as_deref())
    }
}
