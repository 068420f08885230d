// src/config.rs

use std::path::Path;
use std::time::Duration;

use tornwatch_common::models::NotificationSettings;

use crate::Error;

pub const DEFAULT_API_BASE: &str = "https://api.torn.com/";
pub const DEFAULT_REQUEST_COMMENT: &str = concat!("TornWatch_v", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_RELEASES_URL: &str = "https://api.github.com/repos/gnsc4/Torn-Widget/releases/latest";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_DWELL: Duration = Duration::from_secs(10);
pub const DEFAULT_NEW_DAY_WARNING: Duration = Duration::from_secs(3600);
pub const DEFAULT_BOOSTER_MAX_COOLDOWN: Duration = Duration::from_secs(48 * 3600);
pub const DEFAULT_MEDICAL_MAX_COOLDOWN: Duration = Duration::from_secs(6 * 3600);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_base: String,
    /// Sent as `comment=` so requests are identifiable in the account's API log.
    pub request_comment: String,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    /// How long an arrival or race finish stays on screen before clearing.
    pub dwell: Duration,
    pub new_day_warning: Duration,
    pub default_booster_max_cooldown: Duration,
    pub default_medical_max_cooldown: Duration,
    pub notifications: NotificationSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_comment: DEFAULT_REQUEST_COMMENT.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            dwell: DEFAULT_DWELL,
            new_day_warning: DEFAULT_NEW_DAY_WARNING,
            default_booster_max_cooldown: DEFAULT_BOOSTER_MAX_COOLDOWN,
            default_medical_max_cooldown: DEFAULT_MEDICAL_MAX_COOLDOWN,
            notifications: NotificationSettings::default(),
        }
    }
}

/// Reads notification toggles from a JSON file. Missing fields keep their defaults.
pub fn load_notification_settings(path: &Path) -> Result<NotificationSettings, Error> {
    let raw = std::fs::read_to_string(path)?;
    let settings = serde_json::from_str(&raw)?;
    Ok(settings)
}
