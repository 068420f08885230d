use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use tornwatch_common::models::{
    DataSource, Freshness, NotifyChannel, PrimaryStatusSnapshot, RaceSnapshot, ResourceKey,
};
use tornwatch_common::traits::{DisplayProjector, Notifier};

use crate::clock::Clock;
use crate::http::{HttpClient, HttpResponse, TransportError};
use crate::Error;

pub const TEST_API_KEY: &str = "abcdEFGH12345678";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Display projector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectorCall {
    SnapshotUpdated(Freshness),
    RaceUpdated(Freshness),
    Tick { key: ResourceKey, seconds: u64, terminal: bool },
    Hidden(ResourceKey),
    Unavailable(ResourceKey),
    ErrorIndicator { source: DataSource, message: Option<String> },
    SourceUnavailable(DataSource),
    NeedsSetup(Option<String>),
}

#[derive(Clone, Default)]
pub struct RecordingProjector {
    calls: Arc<Mutex<Vec<ProjectorCall>>>,
}

impl RecordingProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ProjectorCall> {
        lock(&self.calls).clone()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }

    /// `(seconds, terminal)` for every tick projected for `key`, oldest first.
    pub fn ticks_for(&self, key: ResourceKey) -> Vec<(u64, bool)> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                ProjectorCall::Tick { key: k, seconds, terminal } if *k == key => Some((*seconds, *terminal)),
                _ => None,
            })
            .collect()
    }

    pub fn last_tick(&self, key: ResourceKey) -> Option<(u64, bool)> {
        self.ticks_for(key).last().copied()
    }

    pub fn count(&self, wanted: &ProjectorCall) -> usize {
        lock(&self.calls).iter().filter(|call| *call == wanted).count()
    }

    pub fn contains(&self, wanted: &ProjectorCall) -> bool {
        self.count(wanted) > 0
    }
}

impl DisplayProjector for RecordingProjector {
    fn on_snapshot_updated(&mut self, _snapshot: &PrimaryStatusSnapshot, freshness: Freshness) {
        lock(&self.calls).push(ProjectorCall::SnapshotUpdated(freshness));
    }

    fn on_race_updated(&mut self, _snapshot: &RaceSnapshot, freshness: Freshness) {
        lock(&self.calls).push(ProjectorCall::RaceUpdated(freshness));
    }

    fn on_resource_tick(&mut self, key: ResourceKey, seconds_remaining: u64, is_terminal: bool) {
        lock(&self.calls).push(ProjectorCall::Tick {
            key,
            seconds: seconds_remaining,
            terminal: is_terminal,
        });
    }

    fn on_resource_hidden(&mut self, key: ResourceKey) {
        lock(&self.calls).push(ProjectorCall::Hidden(key));
    }

    fn on_resource_unavailable(&mut self, key: ResourceKey) {
        lock(&self.calls).push(ProjectorCall::Unavailable(key));
    }

    fn on_error_indicator(&mut self, source: DataSource, message: Option<&str>) {
        lock(&self.calls).push(ProjectorCall::ErrorIndicator {
            source,
            message: message.map(str::to_string),
        });
    }

    fn on_source_unavailable(&mut self, source: DataSource) {
        lock(&self.calls).push(ProjectorCall::SourceUnavailable(source));
    }

    fn on_needs_setup(&mut self, reason: Option<&str>) {
        lock(&self.calls).push(ProjectorCall::NeedsSetup(reason.map(str::to_string)));
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub title: String,
    pub body: String,
    pub channel: NotifyChannel,
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        lock(&self.sent).clone()
    }

    pub fn count_titled(&self, title: &str) -> usize {
        lock(&self.sent).iter().filter(|n| n.title == title).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_notification(&self, title: &str, body: &str, channel: NotifyChannel) -> Result<(), Error> {
        lock(&self.sent).push(SentNotification {
            title: title.to_string(),
            body: body.to_string(),
            channel,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Respond { status: u16, body: String },
    Network(String),
    /// Never answers; the fetcher's timeout has to fire.
    Hang,
}

impl ScriptedReply {
    pub fn ok(body: Value) -> Self {
        ScriptedReply::Respond { status: 200, body: body.to_string() }
    }

    pub fn status(status: u16, body: &str) -> Self {
        ScriptedReply::Respond { status, body: body.to_string() }
    }

    pub fn api_error(code: i64) -> Self {
        Self::ok(json!({ "error": { "code": code, "error": "scripted error" } }))
    }
}

/// Answers primary and race requests from separate queues. The last reply in
/// a queue is sticky and repeats for every later request.
#[derive(Default)]
pub struct ScriptedHttpClient {
    primary: Mutex<VecDeque<ScriptedReply>>,
    race: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_primary(&self, reply: ScriptedReply) -> &Self {
        lock(&self.primary).push_back(reply);
        self
    }

    pub fn push_race(&self, reply: ScriptedReply) -> &Self {
        lock(&self.race).push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    pub fn primary_requests(&self) -> usize {
        lock(&self.requests).iter().filter(|u| !is_race_url(u)).count()
    }

    pub fn race_requests(&self) -> usize {
        lock(&self.requests).iter().filter(|u| is_race_url(u)).count()
    }

    fn next_reply(&self, url: &str) -> Option<ScriptedReply> {
        let mut queue = if is_race_url(url) { lock(&self.race) } else { lock(&self.primary) };
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn is_race_url(url: &str) -> bool {
    url.contains("/races")
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(url.to_string());
        let reply = self.next_reply(url);
        match reply {
            Some(ScriptedReply::Respond { status, body }) => Ok(HttpResponse { status, body }),
            Some(ScriptedReply::Network(msg)) => Err(TransportError::Network(msg)),
            Some(ScriptedReply::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                Err(TransportError::Timeout)
            }
            None => Err(TransportError::Network("no scripted reply".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Wall clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn at_epoch(epoch: i64) -> Self {
        Self::at(DateTime::from_timestamp(epoch, 0).unwrap_or_default())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.now) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

/// Wall clock that follows tokio's (possibly paused) clock from a fixed start.
pub struct OffsetClock {
    base: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl OffsetClock {
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.base + elapsed
    }
}
