// ================================================================
// File: tornwatch-core/src/services/engine.rs
// ================================================================
//
// The engine owns all mutable state (credential, cache, countdowns, dedup
// flags) and runs it on a single task. Timers and the poll cycle talk to it
// through channels; the outside world talks to it through `EngineHandle`.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tornwatch_common::models::{ApiKey, NotificationSettings, NotifyCondition, ResourceKey};
use tornwatch_common::traits::{CredentialStore, DisplayProjector, Notifier};

use crate::cache::StateCache;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::fetcher::{Endpoints, RemoteFetcher};
use crate::http::HttpClient;
use crate::services::countdown::{CountdownEvent, CountdownScheduler, CountdownUpdate};
use crate::services::notification_dedup::NotificationDedup;
use crate::services::notifications::render_notification;
use crate::services::poll_cycle::{PollCycle, PollEvent};
use crate::services::projection::RaceStage;
use crate::Error;

#[derive(Debug)]
pub enum EngineCommand {
    SetCredential(ApiKey),
    ClearCredential,
    UpdateNotificationSettings(NotificationSettings),
    Shutdown,
}

/// Cloneable control surface for a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    /// Validates and hands over a new credential. The engine persists it and
    /// restarts polling from scratch.
    pub fn set_credential(&self, raw: &str) -> Result<(), Error> {
        let key = ApiKey::parse(raw)?;
        self.send(EngineCommand::SetCredential(key))
    }

    pub fn clear_credential(&self) -> Result<(), Error> {
        self.send(EngineCommand::ClearCredential)
    }

    pub fn update_notification_settings(&self, settings: NotificationSettings) -> Result<(), Error> {
        self.send(EngineCommand::UpdateNotificationSettings(settings))
    }

    pub fn shutdown(&self) -> Result<(), Error> {
        self.send(EngineCommand::Shutdown)
    }

    fn send(&self, command: EngineCommand) -> Result<(), Error> {
        self.tx.send(command).map_err(|_| Error::EngineClosed)
    }
}

/// Everything the engine calls out to.
pub struct Collaborators {
    pub projector: Box<dyn DisplayProjector>,
    pub notifier: Arc<dyn Notifier>,
    pub credentials: Arc<dyn CredentialStore>,
    pub http: Arc<dyn HttpClient>,
    pub clock: Arc<dyn Clock>,
}

pub struct EngineContext {
    pub(crate) config: EngineConfig,
    pub(crate) projector: Box<dyn DisplayProjector>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) credentials: Arc<dyn CredentialStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) credential: Option<ApiKey>,
    /// Bumped on every credential change so late results can be recognised.
    pub(crate) epoch: u64,
    pub(crate) cache: StateCache,
    pub(crate) scheduler: CountdownScheduler,
    pub(crate) dedup: NotificationDedup,
    pub(crate) poll: PollCycle,
    pub(crate) race_stage: Option<RaceStage>,
}

pub struct Engine {
    ctx: EngineContext,
    commands: UnboundedReceiver<EngineCommand>,
    countdown_rx: UnboundedReceiver<CountdownEvent>,
    poll_rx: UnboundedReceiver<PollEvent>,
}

impl Engine {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Result<(Engine, EngineHandle), Error> {
        let endpoints = Endpoints::new(&config.api_base, &config.request_comment)?;
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (countdown_tx, countdown_rx) = mpsc::unbounded_channel();
        let (poll_tx, poll_rx) = mpsc::unbounded_channel();

        let scheduler = CountdownScheduler::new(countdown_tx, collaborators.clock.clone(), config.dwell);
        let poll = PollCycle::new(
            RemoteFetcher::new(collaborators.http),
            endpoints,
            config.poll_interval,
            config.fetch_timeout,
            poll_tx,
        );
        let dedup = NotificationDedup::new(config.notifications.clone());

        let ctx = EngineContext {
            config,
            projector: collaborators.projector,
            notifier: collaborators.notifier,
            credentials: collaborators.credentials,
            clock: collaborators.clock,
            credential: None,
            epoch: 0,
            cache: StateCache::new(),
            scheduler,
            dedup,
            poll,
            race_stage: None,
        };

        let engine = Engine {
            ctx,
            commands,
            countdown_rx,
            poll_rx,
        };
        Ok((engine, EngineHandle { tx: command_tx }))
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until `shutdown` is called or every handle is dropped.
    pub async fn run(mut self) {
        self.ctx.boot().await;

        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.ctx.on_command(command).await,
                },
                Some(event) = self.countdown_rx.recv() => {
                    self.ctx.on_countdown_event(event).await;
                }
                Some(event) = self.poll_rx.recv() => {
                    self.ctx.on_poll_event(event).await;
                }
            }
        }

        self.ctx.poll.stop();
        debug!("Cancelling {} live countdowns", self.ctx.scheduler.live_count());
        self.ctx.scheduler.cancel_all();
        info!("Engine stopped");
    }
}

impl EngineContext {
    async fn boot(&mut self) {
        match self.credentials.load_credential() {
            Ok(Some(key)) => {
                info!("Loaded stored credential {:?}", key);
                self.activate(key).await;
            }
            Ok(None) => self.projector.on_needs_setup(None),
            Err(e) => {
                warn!("Could not read stored credential: {}", e);
                self.projector.on_needs_setup(None);
            }
        }
    }

    async fn on_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::SetCredential(key) => {
                if let Err(e) = self.credentials.persist_credential(&key) {
                    warn!("Failed to persist credential: {}", e);
                }
                if self.credential.is_some() {
                    self.deactivate();
                }
                self.activate(key).await;
            }
            EngineCommand::ClearCredential => {
                info!("Credential cleared by user");
                if let Err(e) = self.credentials.clear_credential() {
                    warn!("Failed to clear stored credential: {}", e);
                }
                self.teardown("API key cleared");
            }
            EngineCommand::UpdateNotificationSettings(settings) => {
                debug!("Notification settings updated");
                self.dedup.update_settings(settings);
            }
            EngineCommand::Shutdown => {}
        }
    }

    async fn activate(&mut self, key: ApiKey) {
        info!("Starting poll cycle for {:?}", key);
        self.credential = Some(key);
        self.epoch += 1;
        self.poll.schedule(self.epoch);
        let update = self.scheduler.start_rolling(ResourceKey::NewDay);
        self.project_update(update).await;
    }

    /// Stops everything tied to the current credential.
    fn deactivate(&mut self) {
        self.credential = None;
        self.epoch += 1;
        self.poll.stop();
        self.scheduler.cancel_all();
        self.cache.clear();
        self.dedup.reset();
        self.race_stage = None;
    }

    pub(crate) fn teardown(&mut self, reason: &str) {
        self.deactivate();
        self.projector.on_needs_setup(Some(reason));
    }

    async fn on_countdown_event(&mut self, event: CountdownEvent) {
        if let Some(update) = self.scheduler.handle(event) {
            self.project_update(update).await;
        }
    }

    pub(crate) async fn project_update(&mut self, update: CountdownUpdate) {
        match update {
            CountdownUpdate::Tick { key, seconds_remaining } => {
                self.projector.on_resource_tick(key, seconds_remaining, false);
                if key == ResourceKey::NewDay {
                    self.evaluate_new_day(Some(seconds_remaining)).await;
                } else if let Some(condition) = self.terminal_condition(key) {
                    self.notify_if_edge(condition, false).await;
                }
            }
            CountdownUpdate::Terminal { key, display_seconds } => {
                self.projector.on_resource_tick(key, display_seconds, true);
                if key == ResourceKey::NewDay {
                    self.evaluate_new_day(None).await;
                } else if let Some(condition) = self.terminal_condition(key) {
                    self.notify_if_edge(condition, true).await;
                }
            }
            CountdownUpdate::Cleared { key } => {
                self.projector.on_resource_hidden(key);
                if let Some(condition) = self.terminal_condition(key) {
                    self.notify_if_edge(condition, false).await;
                }
                if key == ResourceKey::Race {
                    self.race_stage = None;
                }
            }
        }
    }

    /// `None` means the boundary was just reached.
    ///
    /// The first tick after activation counts as an edge, so starting inside
    /// the warning window announces "approaching" once.
    async fn evaluate_new_day(&mut self, seconds_remaining: Option<u64>) {
        let approaching = seconds_remaining
            .map(|s| s < self.config.new_day_warning.as_secs())
            .unwrap_or(false);
        let unused_refill = self
            .cache
            .primary()
            .map(|snapshot| snapshot.has_unused_refill())
            .unwrap_or(false);

        self.notify_if_edge(NotifyCondition::NewDayApproaching, approaching).await;
        self.notify_if_edge(NotifyCondition::NewDayReached, seconds_remaining.is_none())
            .await;
        self.notify_if_edge(NotifyCondition::RefillReminder, approaching && unused_refill)
            .await;
    }

    /// Condition that is true while `key` sits in its terminal state.
    pub(crate) fn terminal_condition(&self, key: ResourceKey) -> Option<NotifyCondition> {
        match key {
            ResourceKey::Energy => Some(NotifyCondition::EnergyFull),
            ResourceKey::Nerve => Some(NotifyCondition::NerveFull),
            ResourceKey::Happiness => Some(NotifyCondition::HappinessFull),
            ResourceKey::Booster => Some(NotifyCondition::BoosterReady),
            ResourceKey::Medical => Some(NotifyCondition::MedicalReady),
            ResourceKey::Drug => Some(NotifyCondition::DrugReady),
            ResourceKey::Travel => Some(NotifyCondition::TravelArrived),
            ResourceKey::Race => self.race_stage.map(Self::race_condition),
            ResourceKey::NewDay => None,
        }
    }

    pub(crate) fn race_condition(stage: RaceStage) -> NotifyCondition {
        match stage {
            RaceStage::Starting => NotifyCondition::RaceStarted,
            RaceStage::Ending => NotifyCondition::RaceFinished,
        }
    }

    pub(crate) async fn notify_if_edge(&mut self, condition: NotifyCondition, is_true: bool) {
        let channels = self.dedup.channels_for(condition, is_true);
        if channels.is_empty() {
            return;
        }

        let primary = self.cache.primary();
        let race = self.cache.race();
        let notification = render_notification(condition, primary.as_deref(), race.as_deref());
        info!("Notifying {}: {}", condition, notification.title);

        for channel in channels {
            if let Err(e) = self
                .notifier
                .send_notification(&notification.title, &notification.body, channel)
                .await
            {
                warn!("Failed to deliver {} notification via {}: {}", condition, channel, e);
            }
        }
    }
}
