// File: src/cache/state_cache.rs

use std::sync::Arc;

use tornwatch_common::models::{PrimaryStatusSnapshot, RaceSnapshot};

/// Last known-good snapshots.
///
/// Each slot is replaced by swapping the `Arc`, so a reader holding the previous
/// snapshot keeps a complete value and never observes a half-applied update.
#[derive(Debug, Default)]
pub struct StateCache {
    primary: Option<Arc<PrimaryStatusSnapshot>>,
    race: Option<Arc<RaceSnapshot>>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_primary(&mut self, snapshot: PrimaryStatusSnapshot) -> Arc<PrimaryStatusSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.primary = Some(snapshot.clone());
        snapshot
    }

    pub fn replace_race(&mut self, snapshot: RaceSnapshot) -> Arc<RaceSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.race = Some(snapshot.clone());
        snapshot
    }

    pub fn primary(&self) -> Option<Arc<PrimaryStatusSnapshot>> {
        self.primary.clone()
    }

    pub fn race(&self) -> Option<Arc<RaceSnapshot>> {
        self.race.clone()
    }

    /// Drops both snapshots. Used when the credential goes away.
    pub fn clear(&mut self) {
        self.primary = None;
        self.race = None;
    }
}
