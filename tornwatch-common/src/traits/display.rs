use crate::models::{DataSource, Freshness, PrimaryStatusSnapshot, RaceSnapshot, ResourceKey};

/// Receives everything the engine wants shown. The engine owns exactly one
/// projector and calls it from its own task, so implementations need no locking.
pub trait DisplayProjector: Send {
    fn on_snapshot_updated(&mut self, snapshot: &PrimaryStatusSnapshot, freshness: Freshness);

    fn on_race_updated(&mut self, snapshot: &RaceSnapshot, freshness: Freshness);

    /// Called once per second per live countdown, and once more on the terminal tick.
    fn on_resource_tick(&mut self, key: ResourceKey, seconds_remaining: u64, is_terminal: bool);

    /// The resource has nothing to show (dwell elapsed, no active travel, no race).
    fn on_resource_hidden(&mut self, key: ResourceKey);

    /// No data has ever arrived for this resource.
    fn on_resource_unavailable(&mut self, key: ResourceKey);

    /// `Some(message)` shows a non-blocking error for `source`, `None` clears it.
    fn on_error_indicator(&mut self, source: DataSource, message: Option<&str>);

    fn on_source_unavailable(&mut self, source: DataSource);

    /// Credential missing or rejected. The user must supply a new one.
    fn on_needs_setup(&mut self, reason: Option<&str>);
}
