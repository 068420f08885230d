use std::collections::HashMap;

use tracing::{debug, info, warn};

use tornwatch_common::models::{Bar, DataSource, Freshness, PrimaryStatusSnapshot, RaceSnapshot, ResourceKey};
use tornwatch_common::traits::DisplayProjector;
use tornwatch_core::utils::time::format_hms;

/// Renders the widget state as log lines.
///
/// Ticks go out at debug level; only the first tick after a restart and the
/// terminal tick are logged at info so the default filter stays readable.
#[derive(Default)]
pub struct LogProjector {
    last_seen: HashMap<ResourceKey, u64>,
}

impl LogProjector {
    pub fn new() -> Self {
        Self::default()
    }

    fn bar_line(snapshot: &PrimaryStatusSnapshot) -> String {
        let bar = |name: &str, value: &Option<Bar>| match value {
            Some(b) => format!("{} {}/{}", name, b.current, b.maximum),
            None => format!("{} n/a", name),
        };
        [
            bar("life", &snapshot.life),
            bar("energy", &snapshot.energy),
            bar("nerve", &snapshot.nerve),
            bar("happy", &snapshot.happiness),
        ]
        .join(", ")
    }
}

impl DisplayProjector for LogProjector {
    fn on_snapshot_updated(&mut self, snapshot: &PrimaryStatusSnapshot, freshness: Freshness) {
        match freshness {
            Freshness::Fresh => info!("Status: {}", Self::bar_line(snapshot)),
            Freshness::Stale => info!("Status (cached): {}", Self::bar_line(snapshot)),
        }
        if let Some(counts) = &snapshot.notifications {
            if counts.messages > 0 || counts.events > 0 {
                info!("Unread: {} messages, {} events", counts.messages, counts.events);
            }
        }
    }

    fn on_race_updated(&mut self, snapshot: &RaceSnapshot, freshness: Freshness) {
        match snapshot.latest() {
            Some(race) => debug!("Race '{}' is {:?} ({:?})", race.title, race.status, freshness),
            None => debug!("No races on record ({:?})", freshness),
        }
    }

    fn on_resource_tick(&mut self, key: ResourceKey, seconds_remaining: u64, is_terminal: bool) {
        let shown = format_hms(seconds_remaining as i64);
        let previous = self.last_seen.insert(key, seconds_remaining);
        if is_terminal {
            info!("{}: {} (done)", key, shown);
        } else if previous.map_or(true, |p| seconds_remaining > p) {
            info!("{}: {}", key, shown);
        } else {
            debug!("{}: {}", key, shown);
        }
    }

    fn on_resource_hidden(&mut self, key: ResourceKey) {
        if self.last_seen.remove(&key).is_some() {
            debug!("{}: hidden", key);
        }
    }

    fn on_resource_unavailable(&mut self, key: ResourceKey) {
        self.last_seen.remove(&key);
        debug!("{}: {}", key, format_hms(-1));
    }

    fn on_error_indicator(&mut self, source: DataSource, message: Option<&str>) {
        match message {
            Some(msg) => warn!("{} data: {}", source, msg),
            None => debug!("{} data: ok", source),
        }
    }

    fn on_source_unavailable(&mut self, source: DataSource) {
        warn!("{} data unavailable and nothing cached", source);
    }

    fn on_needs_setup(&mut self, reason: Option<&str>) {
        self.last_seen.clear();
        match reason {
            Some(r) => warn!("Setup required: {}. Pass --api-key or set TORN_API_KEY.", r),
            None => info!("Setup required. Pass --api-key or set TORN_API_KEY."),
        }
    }
}
