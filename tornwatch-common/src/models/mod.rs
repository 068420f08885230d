pub mod credential;
pub mod notification;
pub mod race;
pub mod resource;
pub mod snapshot;

pub use credential::ApiKey;
pub use notification::{Notification, NotificationSettings, NotifyChannel, NotifyCondition};
pub use race::{RacePhase, RaceRecord, RaceSchedule, RaceSnapshot, RaceStatus};
pub use resource::{DataSource, Freshness, ResourceKey};
pub use snapshot::{
    Bar, Cooldowns, NotificationCounts, PersonalStats, PrimaryStatusSnapshot, Refills, Travel,
};
