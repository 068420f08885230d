//! Poll cycle: fetches primary then race data on a fixed interval and applies
//! the results to the engine context.
//!
//! The network half runs on its own task and reports back through
//! `PollEvent`s; the cache and countdown updates happen on the engine task when
//! those events are applied, so the cache has a single writer.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tornwatch_common::error::FetchError;
use tornwatch_common::models::{
    ApiKey, DataSource, Freshness, PrimaryStatusSnapshot, RaceSnapshot, ResourceKey,
};

use crate::clock::{spawn_periodic, TimerHandle};
use crate::fetcher::{Endpoints, RemoteFetcher};
use crate::services::engine::EngineContext;
use crate::services::projection::{plan_primary, plan_race, CooldownMaxima, CountdownPlan};

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// The interval fired for credential `epoch`.
    Due { epoch: u64 },
    Outcome(PollOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Primary { epoch: u64, result: Result<Value, FetchError> },
    Race { epoch: u64, result: Result<Value, FetchError> },
    /// Both fetches of the cycle have resolved (or the race fetch was skipped).
    Settled { epoch: u64 },
}

/// Everything one cycle needs, captured when it starts.
#[derive(Debug, Clone)]
pub struct CycleRequest {
    pub epoch: u64,
    pub primary_url: String,
    pub race_url: String,
    pub timeout: Duration,
}

pub struct PollCycle {
    fetcher: RemoteFetcher,
    endpoints: Endpoints,
    interval: Duration,
    timeout: Duration,
    tx: UnboundedSender<PollEvent>,
    schedule: Option<TimerHandle>,
    in_flight: Option<CancellationToken>,
}

impl PollCycle {
    pub fn new(
        fetcher: RemoteFetcher,
        endpoints: Endpoints,
        interval: Duration,
        timeout: Duration,
        tx: UnboundedSender<PollEvent>,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            interval,
            timeout,
            tx,
            schedule: None,
            in_flight: None,
        }
    }

    /// Arms the recurring trigger. The first cycle is due immediately.
    pub fn schedule(&mut self, epoch: u64) {
        let tx = self.tx.clone();
        self.schedule = Some(spawn_periodic(self.interval, true, move || {
            tx.send(PollEvent::Due { epoch }).is_ok()
        }));
        info!("Poll cycle scheduled every {}s", self.interval.as_secs());
    }

    /// Starts a cycle unless the previous one has not settled yet.
    pub fn begin(&mut self, key: &ApiKey, epoch: u64) -> bool {
        if self.in_flight.is_some() {
            debug!("Previous poll cycle still in flight; skipping this one");
            return false;
        }
        let token = CancellationToken::new();
        let request = CycleRequest {
            epoch,
            primary_url: self.endpoints.primary_url(key),
            race_url: self.endpoints.race_url(key),
            timeout: self.timeout,
        };
        tokio::spawn(run_cycle(
            self.fetcher.clone(),
            request,
            self.tx.clone(),
            token.clone(),
        ));
        self.in_flight = Some(token);
        true
    }

    pub fn settle(&mut self) {
        self.in_flight = None;
    }

    /// Stops the interval and abandons any cycle still running.
    pub fn stop(&mut self) {
        self.schedule = None;
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

/// One cycle. The primary fetch fully resolves before the race fetch starts, and
/// the race fetch is skipped when the primary result was a credential rejection.
pub async fn run_cycle(
    fetcher: RemoteFetcher,
    request: CycleRequest,
    tx: UnboundedSender<PollEvent>,
    token: CancellationToken,
) {
    let epoch = request.epoch;

    let primary = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        result = fetcher.fetch(&request.primary_url, request.timeout) => result,
    };
    let fatal = matches!(&primary, Err(err) if err.is_credential_invalid());
    let _ = tx.send(PollEvent::Outcome(PollOutcome::Primary { epoch, result: primary }));

    if !fatal && !token.is_cancelled() {
        let race = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            result = fetcher.fetch(&request.race_url, request.timeout) => result,
        };
        let _ = tx.send(PollEvent::Outcome(PollOutcome::Race { epoch, result: race }));
    }

    let _ = tx.send(PollEvent::Outcome(PollOutcome::Settled { epoch }));
}

impl EngineContext {
    pub(crate) async fn on_poll_event(&mut self, event: PollEvent) {
        match event {
            PollEvent::Due { epoch } => {
                if epoch != self.epoch {
                    return;
                }
                if let Some(key) = self.credential.clone() {
                    self.poll.begin(&key, epoch);
                }
            }
            PollEvent::Outcome(PollOutcome::Primary { epoch, result }) => {
                if self.is_current(epoch) {
                    self.apply_primary(result).await;
                }
            }
            PollEvent::Outcome(PollOutcome::Race { epoch, result }) => {
                if self.is_current(epoch) {
                    self.apply_race(result).await;
                }
            }
            PollEvent::Outcome(PollOutcome::Settled { epoch }) => {
                if epoch == self.epoch {
                    self.poll.settle();
                }
            }
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        if epoch != self.epoch || self.credential.is_none() {
            debug!("Discarding poll outcome from superseded credential epoch {}", epoch);
            return false;
        }
        true
    }

    pub(crate) async fn apply_primary(&mut self, result: Result<Value, FetchError>) {
        let parsed = result.and_then(|body| {
            PrimaryStatusSnapshot::from_json(body).map_err(|e| FetchError::Malformed(e.to_string()))
        });

        match parsed {
            Ok(snapshot) => {
                let snapshot = self.cache.replace_primary(snapshot);
                self.projector.on_error_indicator(DataSource::Primary, None);
                self.projector.on_snapshot_updated(&snapshot, Freshness::Fresh);

                let maxima = CooldownMaxima {
                    booster_seconds: snapshot
                        .booster_max_cooldown_seconds(self.config.default_booster_max_cooldown.as_secs()),
                    medical_seconds: self.config.default_medical_max_cooldown.as_secs(),
                };
                for plan in plan_primary(&snapshot, maxima) {
                    self.apply_plan(plan).await;
                }
            }
            Err(err) if err.is_credential_invalid() => {
                self.handle_fatal("Invalid API key").await;
            }
            Err(err) => {
                warn!("Primary status fetch failed: {}", err);
                self.fall_back(DataSource::Primary, &err);
            }
        }
    }

    pub(crate) async fn apply_race(&mut self, result: Result<Value, FetchError>) {
        let parsed = result.and_then(|body| {
            RaceSnapshot::from_json(body).map_err(|e| FetchError::Malformed(e.to_string()))
        });

        match parsed {
            Ok(snapshot) => {
                let snapshot = self.cache.replace_race(snapshot);
                self.projector.on_error_indicator(DataSource::Race, None);
                self.projector.on_race_updated(&snapshot, Freshness::Fresh);

                let (plan, stage) = plan_race(&snapshot, self.clock.now_epoch());
                match stage {
                    Some(stage) => {
                        if let Some(previous) = self.race_stage.filter(|s| *s != stage) {
                            let condition = Self::race_condition(previous);
                            self.notify_if_edge(condition, false).await;
                        }
                        self.race_stage = Some(stage);
                        self.apply_plan(plan).await;
                    }
                    None => {
                        self.apply_plan(plan).await;
                        if !self.scheduler.is_dwelling(ResourceKey::Race) {
                            self.race_stage = None;
                        }
                    }
                }
            }
            Err(err) if err.is_credential_invalid() => {
                self.handle_fatal("Invalid API key").await;
            }
            Err(err) => {
                warn!("Race fetch failed: {}", err);
                self.fall_back(DataSource::Race, &err);
            }
        }
    }

    /// Transient failure: keep timers running, show cached data if any.
    fn fall_back(&mut self, source: DataSource, err: &FetchError) {
        let message = err.to_string();
        self.projector.on_error_indicator(source, Some(&message));
        match source {
            DataSource::Primary => match self.cache.primary() {
                Some(snapshot) => self.projector.on_snapshot_updated(&snapshot, Freshness::Stale),
                None => self.projector.on_source_unavailable(source),
            },
            DataSource::Race => match self.cache.race() {
                Some(snapshot) => self.projector.on_race_updated(&snapshot, Freshness::Stale),
                None => self.projector.on_source_unavailable(source),
            },
        }
    }

    async fn apply_plan(&mut self, plan: CountdownPlan) {
        match plan {
            CountdownPlan::Start { key, seconds, behavior } => {
                let update = self.scheduler.start(key, seconds, behavior);
                self.project_update(update).await;
            }
            CountdownPlan::Idle { key } | CountdownPlan::Missing { key } => {
                // An arrival or finish already on screen runs out its dwell.
                if self.scheduler.is_dwelling(key) {
                    return;
                }
                self.scheduler.cancel(key);
                if matches!(plan, CountdownPlan::Idle { .. }) {
                    self.projector.on_resource_hidden(key);
                } else {
                    self.projector.on_resource_unavailable(key);
                }
                if let Some(condition) = self.terminal_condition(key) {
                    self.notify_if_edge(condition, false).await;
                }
            }
        }
    }

    /// Credential rejected: forget it and everything fetched with it.
    pub(crate) async fn handle_fatal(&mut self, reason: &str) {
        error!("Credential rejected by the API; poll cycle stopped");
        if let Err(e) = self.credentials.clear_credential() {
            warn!("Failed to clear stored credential: {}", e);
        }
        self.teardown(reason);
    }
}
