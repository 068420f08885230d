// File: tornwatch-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use tornwatch_common::models::{ApiKey, NotificationSettings};
use tornwatch_core::config::EngineConfig;
use tornwatch_core::credential::MemoryCredentialStore;
use tornwatch_core::test_utils::{
    OffsetClock, RecordingNotifier, RecordingProjector, ScriptedHttpClient, ScriptedReply, TEST_API_KEY,
};
use tornwatch_core::{Collaborators, Engine, EngineHandle};

/// A running engine plus handles on every fake it talks to.
pub struct Harness {
    pub handle: EngineHandle,
    pub task: JoinHandle<()>,
    pub projector: RecordingProjector,
    pub notifier: RecordingNotifier,
    pub http: Arc<ScriptedHttpClient>,
    pub store: Arc<MemoryCredentialStore>,
}

/// Half a second past noon: far from the day boundary, and ticks never land
/// exactly on a whole wall-clock second.
pub fn midday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap() + ChronoDuration::milliseconds(500)
}

/// `seconds` (plus half a second) before the next UTC midnight.
pub fn before_midnight(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap() - ChronoDuration::seconds(seconds)
        - ChronoDuration::milliseconds(500)
}

pub fn start_engine(base: DateTime<Utc>, http: Arc<ScriptedHttpClient>, stored_key: bool) -> Harness {
    start_engine_with(base, http, stored_key, NotificationSettings::default())
}

pub fn start_engine_with(
    base: DateTime<Utc>,
    http: Arc<ScriptedHttpClient>,
    stored_key: bool,
    notifications: NotificationSettings,
) -> Harness {
    let projector = RecordingProjector::new();
    let notifier = RecordingNotifier::new();
    let store = Arc::new(if stored_key {
        MemoryCredentialStore::with_key(ApiKey::parse(TEST_API_KEY).unwrap())
    } else {
        MemoryCredentialStore::new()
    });

    let config = EngineConfig {
        notifications,
        ..EngineConfig::default()
    };
    let collaborators = Collaborators {
        projector: Box::new(projector.clone()),
        notifier: Arc::new(notifier.clone()),
        credentials: store.clone(),
        http: http.clone(),
        clock: Arc::new(OffsetClock::new(base)),
    };
    let (engine, handle) = Engine::new(config, collaborators).unwrap();
    let task = engine.spawn();

    Harness {
        handle,
        task,
        projector,
        notifier,
        http,
        store,
    }
}

pub fn scripted(primary: Vec<ScriptedReply>, race: Vec<ScriptedReply>) -> Arc<ScriptedHttpClient> {
    let http = Arc::new(ScriptedHttpClient::new());
    for reply in primary {
        http.push_primary(reply);
    }
    for reply in race {
        http.push_race(reply);
    }
    http
}

pub fn no_races() -> ScriptedReply {
    ScriptedReply::ok(json!({ "races": [] }))
}

pub fn energy_body(seconds_to_full: i64) -> Value {
    json!({
        "energy": { "current": 100, "maximum": 150, "fulltime": seconds_to_full },
    })
}

pub fn travel_body(destination: &str, time_left: i64) -> Value {
    json!({
        "travel": { "destination": destination, "time_left": time_left, "timestamp": 0 },
    })
}

pub fn refills_body(energy_used: bool, nerve_used: bool) -> Value {
    json!({
        "refills": { "energy_refill_used": energy_used, "nerve_refill_used": nerve_used },
    })
}

pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}
