//! Edge-triggered notification gate.
//!
//! One flag per `NotifyCondition`. A flag is set on the false→true edge and
//! cleared as soon as the condition reads false, so each continuous true episode
//! produces exactly one delivery decision.

use std::collections::HashSet;

use tracing::debug;

use tornwatch_common::models::{NotificationSettings, NotifyChannel, NotifyCondition};

#[derive(Debug, Default)]
pub struct NotificationDedup {
    flags: HashSet<NotifyCondition>,
    settings: NotificationSettings,
}

impl NotificationDedup {
    pub fn new(settings: NotificationSettings) -> Self {
        Self {
            flags: HashSet::new(),
            settings,
        }
    }

    /// True only on the false→true transition of an enabled condition.
    ///
    /// Disabled conditions are not tracked at all: their flag stays clear, so
    /// re-enabling mid-episode announces the episode once.
    pub fn evaluate(&mut self, condition: NotifyCondition, is_true: bool) -> bool {
        if !self.settings.is_enabled(condition) {
            self.flags.remove(&condition);
            return false;
        }
        if is_true {
            self.flags.insert(condition)
        } else {
            if self.flags.remove(&condition) {
                debug!("Re-armed notification for {}", condition);
            }
            false
        }
    }

    /// Evaluates the edge and returns the channels to deliver on.
    /// Channel toggles never affect edge tracking.
    pub fn channels_for(&mut self, condition: NotifyCondition, is_true: bool) -> Vec<NotifyChannel> {
        if self.evaluate(condition, is_true) {
            self.settings.channels(condition)
        } else {
            Vec::new()
        }
    }

    pub fn set_condition_enabled(&mut self, condition: NotifyCondition, enabled: bool) {
        if enabled {
            self.settings.disabled.remove(&condition);
        } else {
            self.settings.disabled.insert(condition);
            self.flags.remove(&condition);
        }
    }

    pub fn update_settings(&mut self, settings: NotificationSettings) {
        for condition in &settings.disabled {
            self.flags.remove(condition);
        }
        self.settings = settings;
    }

    pub fn is_flagged(&self, condition: NotifyCondition) -> bool {
        self.flags.contains(&condition)
    }

    pub fn reset(&mut self) {
        self.flags.clear();
    }
}
