use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceStatus {
    Scheduled,
    Starting,
    Active,
    InProgress,
    #[serde(alias = "ended")]
    Finished,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSchedule {
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub track_id: i64,
    pub status: RaceStatus,
    #[serde(default)]
    pub schedule: RaceSchedule,
}

/// Where a race stands relative to a given wall-clock second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacePhase {
    StartsIn(u64),
    EndsIn(u64),
    Hidden,
}

impl RaceRecord {
    pub fn phase_at(&self, now_epoch: i64) -> RacePhase {
        let starting = self.status == RaceStatus::Starting
            || (self.status == RaceStatus::Scheduled && self.schedule.start > now_epoch);
        if starting {
            let remaining = self.schedule.start - now_epoch;
            return if remaining < 0 {
                RacePhase::Hidden
            } else {
                RacePhase::StartsIn(remaining as u64)
            };
        }

        match self.status {
            RaceStatus::Active | RaceStatus::InProgress => {
                let remaining = self.schedule.end - now_epoch;
                if remaining < 0 {
                    RacePhase::Hidden
                } else {
                    RacePhase::EndsIn(remaining as u64)
                }
            }
            _ => RacePhase::Hidden,
        }
    }
}

/// Most recent race record, as returned by the races resource (newest first, limit 1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    #[serde(default)]
    pub races: Vec<RaceRecord>,
}

impl RaceSnapshot {
    pub fn from_json(value: Value) -> Result<Self, Error> {
        serde_path_to_error::deserialize(value).map_err(|e| Error::Parse(e.to_string()))
    }

    pub fn latest(&self) -> Option<&RaceRecord> {
        self.races.first()
    }
}
