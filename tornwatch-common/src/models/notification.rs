use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Every condition the engine can announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyCondition {
    EnergyFull,
    NerveFull,
    HappinessFull,
    BoosterReady,
    MedicalReady,
    DrugReady,
    TravelArrived,
    RaceStarted,
    RaceFinished,
    NewDayApproaching,
    NewDayReached,
    RefillReminder,
}

impl NotifyCondition {
    pub const ALL: [NotifyCondition; 12] = [
        NotifyCondition::EnergyFull,
        NotifyCondition::NerveFull,
        NotifyCondition::HappinessFull,
        NotifyCondition::BoosterReady,
        NotifyCondition::MedicalReady,
        NotifyCondition::DrugReady,
        NotifyCondition::TravelArrived,
        NotifyCondition::RaceStarted,
        NotifyCondition::RaceFinished,
        NotifyCondition::NewDayApproaching,
        NotifyCondition::NewDayReached,
        NotifyCondition::RefillReminder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyCondition::EnergyFull => "energy_full",
            NotifyCondition::NerveFull => "nerve_full",
            NotifyCondition::HappinessFull => "happiness_full",
            NotifyCondition::BoosterReady => "booster_ready",
            NotifyCondition::MedicalReady => "medical_ready",
            NotifyCondition::DrugReady => "drug_ready",
            NotifyCondition::TravelArrived => "travel_arrived",
            NotifyCondition::RaceStarted => "race_started",
            NotifyCondition::RaceFinished => "race_finished",
            NotifyCondition::NewDayApproaching => "new_day_approaching",
            NotifyCondition::NewDayReached => "new_day_reached",
            NotifyCondition::RefillReminder => "refill_reminder",
        }
    }
}

impl fmt::Display for NotifyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyChannel {
    Push,
    Voice,
}

impl fmt::Display for NotifyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyChannel::Push => f.write_str("push"),
            NotifyChannel::Voice => f.write_str("voice"),
        }
    }
}

/// A rendered alert, ready to hand to a `Notifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub condition: NotifyCondition,
    pub title: String,
    pub body: String,
}

/// Per-condition and per-channel toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub push_enabled: bool,
    pub voice_enabled: bool,
    pub disabled: BTreeSet<NotifyCondition>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            push_enabled: true,
            voice_enabled: false,
            disabled: BTreeSet::new(),
        }
    }
}

impl NotificationSettings {
    pub fn is_enabled(&self, condition: NotifyCondition) -> bool {
        !self.disabled.contains(&condition)
    }

    /// Channels a transition of `condition` should be delivered on. May be empty.
    pub fn channels(&self, condition: NotifyCondition) -> Vec<NotifyChannel> {
        if !self.is_enabled(condition) {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(2);
        if self.push_enabled {
            out.push(NotifyChannel::Push);
        }
        if self.voice_enabled {
            out.push(NotifyChannel::Voice);
        }
        out
    }
}
