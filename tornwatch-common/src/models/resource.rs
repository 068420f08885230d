use std::fmt;

use serde::{Deserialize, Serialize};

/// Every resource that owns a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKey {
    Energy,
    Nerve,
    Happiness,
    Booster,
    Medical,
    Drug,
    Travel,
    Race,
    NewDay,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 9] = [
        ResourceKey::Energy,
        ResourceKey::Nerve,
        ResourceKey::Happiness,
        ResourceKey::Booster,
        ResourceKey::Medical,
        ResourceKey::Drug,
        ResourceKey::Travel,
        ResourceKey::Race,
        ResourceKey::NewDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKey::Energy => "energy",
            ResourceKey::Nerve => "nerve",
            ResourceKey::Happiness => "happiness",
            ResourceKey::Booster => "booster",
            ResourceKey::Medical => "medical",
            ResourceKey::Drug => "drug",
            ResourceKey::Travel => "travel",
            ResourceKey::Race => "race",
            ResourceKey::NewDay => "new_day",
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which remote resource a result, error indicator or fallback belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Primary,
    Race,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Primary => f.write_str("primary"),
            DataSource::Race => f.write_str("race"),
        }
    }
}

/// Whether a pushed snapshot came from the cycle that just finished or from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Stale,
}
