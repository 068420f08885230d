//! Per-resource countdowns.
//!
//! One live entry per `ResourceKey`. Each entry owns a one-second periodic timer
//! that only posts `CountdownEvent::Tick { key, generation }` to the engine's
//! channel; the decrement itself happens in [`CountdownScheduler::handle`] on the
//! engine task. Restarting or cancelling a key bumps the generation, so any tick
//! already queued for the old entry is recognised and dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use tornwatch_common::models::ResourceKey;

use crate::clock::{spawn_once, spawn_periodic, Clock, TimerHandle};
use crate::utils::time::seconds_until_next_utc_midnight;

const TICK: Duration = Duration::from_secs(1);

/// What a countdown does once it reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalBehavior {
    /// Stop ticking and keep showing `display_seconds` (0 for "Full"/"Ready",
    /// the account maximum for booster and medical).
    Hold { display_seconds: u64 },
    /// Stop ticking, then clear the resource after the dwell period.
    Dwell,
    /// Signal the boundary, then keep counting toward the next one.
    Rearm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub seconds_remaining: u64,
    pub is_terminal: bool,
    pub last_tick_wall_clock: DateTime<Utc>,
}

/// Posted by timer tasks. Carries the generation of the entry that armed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick { key: ResourceKey, generation: u64 },
    DwellElapsed { key: ResourceKey, generation: u64 },
}

/// What the engine should project after a start or a handled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownUpdate {
    Tick { key: ResourceKey, seconds_remaining: u64 },
    Terminal { key: ResourceKey, display_seconds: u64 },
    Cleared { key: ResourceKey },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Fixed,
    UntilNextUtcMidnight,
}

struct LiveCountdown {
    generation: u64,
    state: TimerState,
    mode: Mode,
    behavior: TerminalBehavior,
    // Dropping this cancels the timer task.
    timer: Option<TimerHandle>,
}

pub struct CountdownScheduler {
    live: HashMap<ResourceKey, LiveCountdown>,
    next_generation: u64,
    events: UnboundedSender<CountdownEvent>,
    clock: Arc<dyn Clock>,
    dwell: Duration,
}

impl CountdownScheduler {
    pub fn new(events: UnboundedSender<CountdownEvent>, clock: Arc<dyn Clock>, dwell: Duration) -> Self {
        Self {
            live: HashMap::new(),
            next_generation: 0,
            events,
            clock,
            dwell,
        }
    }

    /// Starts a fixed countdown for `key`, replacing whatever was live.
    /// A zero start goes straight to the terminal state.
    pub fn start(&mut self, key: ResourceKey, seconds: u64, behavior: TerminalBehavior) -> CountdownUpdate {
        self.cancel(key);
        let generation = self.bump_generation();
        let state = TimerState {
            seconds_remaining: seconds,
            is_terminal: false,
            last_tick_wall_clock: self.clock.now(),
        };
        let mut entry = LiveCountdown {
            generation,
            state,
            mode: Mode::Fixed,
            behavior,
            timer: None,
        };

        if seconds == 0 {
            let update = self.enter_terminal(key, &mut entry);
            self.live.insert(key, entry);
            return update;
        }

        entry.timer = Some(self.arm_ticker(key, generation));
        self.live.insert(key, entry);
        CountdownUpdate::Tick { key, seconds_remaining: seconds }
    }

    /// Starts a countdown to the next UTC midnight that recomputes its target on
    /// every tick and re-arms after each boundary.
    pub fn start_rolling(&mut self, key: ResourceKey) -> CountdownUpdate {
        self.cancel(key);
        let generation = self.bump_generation();
        let now = self.clock.now();
        let seconds = seconds_until_next_utc_midnight(now);
        let entry = LiveCountdown {
            generation,
            state: TimerState {
                seconds_remaining: seconds,
                is_terminal: false,
                last_tick_wall_clock: now,
            },
            mode: Mode::UntilNextUtcMidnight,
            behavior: TerminalBehavior::Rearm,
            timer: Some(self.arm_ticker(key, generation)),
        };
        self.live.insert(key, entry);
        CountdownUpdate::Tick { key, seconds_remaining: seconds }
    }

    /// Returns true if something was live for `key`.
    pub fn cancel(&mut self, key: ResourceKey) -> bool {
        match self.live.remove(&key) {
            Some(entry) => {
                if let Some(timer) = &entry.timer {
                    timer.cancel();
                }
                debug!("Cancelled countdown for {} (generation {})", key, entry.generation);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.live.clear();
    }

    /// Applies a timer event. Events from superseded or cancelled entries yield `None`.
    pub fn handle(&mut self, event: CountdownEvent) -> Option<CountdownUpdate> {
        match event {
            CountdownEvent::Tick { key, generation } => {
                let mut entry = self.take_matching(key, generation)?;
                let update = self.advance(key, &mut entry);
                self.live.insert(key, entry);
                update
            }
            CountdownEvent::DwellElapsed { key, generation } => {
                let entry = self.take_matching(key, generation)?;
                if entry.state.is_terminal && entry.behavior == TerminalBehavior::Dwell {
                    Some(CountdownUpdate::Cleared { key })
                } else {
                    self.live.insert(key, entry);
                    None
                }
            }
        }
    }

    pub fn state(&self, key: ResourceKey) -> Option<&TimerState> {
        self.live.get(&key).map(|entry| &entry.state)
    }

    pub fn is_live(&self, key: ResourceKey) -> bool {
        self.live.contains_key(&key)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// True while `key` sits in its "just happened" state waiting to clear.
    pub fn is_dwelling(&self, key: ResourceKey) -> bool {
        self.live
            .get(&key)
            .map(|entry| entry.state.is_terminal && entry.behavior == TerminalBehavior::Dwell)
            .unwrap_or(false)
    }

    fn take_matching(&mut self, key: ResourceKey, generation: u64) -> Option<LiveCountdown> {
        match self.live.get(&key) {
            Some(entry) if entry.generation == generation => self.live.remove(&key),
            _ => {
                debug!("Dropping stale timer event for {} (generation {})", key, generation);
                None
            }
        }
    }

    fn advance(&mut self, key: ResourceKey, entry: &mut LiveCountdown) -> Option<CountdownUpdate> {
        let now = self.clock.now();

        match entry.mode {
            Mode::Fixed => {
                // A tick queued just before the ticker was dropped. Terminal fires once.
                if entry.state.is_terminal {
                    return None;
                }
                entry.state.last_tick_wall_clock = now;
                entry.state.seconds_remaining = entry.state.seconds_remaining.saturating_sub(1);
                if entry.state.seconds_remaining == 0 {
                    Some(self.enter_terminal(key, entry))
                } else {
                    Some(CountdownUpdate::Tick { key, seconds_remaining: entry.state.seconds_remaining })
                }
            }
            Mode::UntilNextUtcMidnight => {
                entry.state.last_tick_wall_clock = now;
                let seconds = seconds_until_next_utc_midnight(now);
                if entry.state.is_terminal {
                    entry.state.is_terminal = false;
                    entry.state.seconds_remaining = seconds;
                    return Some(CountdownUpdate::Tick { key, seconds_remaining: seconds });
                }
                // Wrapping upward means the boundary passed between two ticks.
                let crossed = seconds == 0 || seconds > entry.state.seconds_remaining;
                if crossed {
                    entry.state.seconds_remaining = 0;
                    entry.state.is_terminal = true;
                    Some(CountdownUpdate::Terminal { key, display_seconds: 0 })
                } else {
                    entry.state.seconds_remaining = seconds;
                    Some(CountdownUpdate::Tick { key, seconds_remaining: seconds })
                }
            }
        }
    }

    fn enter_terminal(&mut self, key: ResourceKey, entry: &mut LiveCountdown) -> CountdownUpdate {
        entry.state.seconds_remaining = 0;
        entry.state.is_terminal = true;
        entry.timer = match entry.behavior {
            TerminalBehavior::Dwell => {
                let tx = self.events.clone();
                let generation = entry.generation;
                Some(spawn_once(self.dwell, move || {
                    let _ = tx.send(CountdownEvent::DwellElapsed { key, generation });
                }))
            }
            _ => None,
        };
        CountdownUpdate::Terminal {
            key,
            display_seconds: self.display_for(entry),
        }
    }

    fn display_for(&self, entry: &LiveCountdown) -> u64 {
        match entry.behavior {
            TerminalBehavior::Hold { display_seconds } => display_seconds,
            _ => 0,
        }
    }

    fn arm_ticker(&self, key: ResourceKey, generation: u64) -> TimerHandle {
        let tx = self.events.clone();
        spawn_periodic(TICK, false, move || {
            tx.send(CountdownEvent::Tick { key, generation }).is_ok()
        })
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ManualClock;
    use tokio::sync::mpsc;

    fn scheduler() -> (CountdownScheduler, mpsc::UnboundedReceiver<CountdownEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let clock = Arc::new(ManualClock::at_epoch(1_700_000_000));
        (CountdownScheduler::new(tx, clock, Duration::from_secs(10)), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn zero_start_is_terminal_without_ticker() {
        let (mut scheduler, mut rx) = scheduler();
        let update = scheduler.start(ResourceKey::Booster, 0, TerminalBehavior::Hold { display_seconds: 172_800 });
        assert_eq!(
            update,
            CountdownUpdate::Terminal { key: ResourceKey::Booster, display_seconds: 172_800 }
        );
        assert!(scheduler.state(ResourceKey::Booster).unwrap().is_terminal);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_is_dropped() {
        let (mut scheduler, _rx) = scheduler();
        scheduler.start(ResourceKey::Energy, 30, TerminalBehavior::Hold { display_seconds: 0 });
        let old = scheduler.live.get(&ResourceKey::Energy).unwrap().generation;
        scheduler.start(ResourceKey::Energy, 60, TerminalBehavior::Hold { display_seconds: 0 });

        assert_eq!(
            scheduler.handle(CountdownEvent::Tick { key: ResourceKey::Energy, generation: old }),
            None
        );
        assert_eq!(scheduler.state(ResourceKey::Energy).unwrap().seconds_remaining, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn dwell_event_for_non_dwelling_entry_is_ignored() {
        let (mut scheduler, _rx) = scheduler();
        scheduler.start(ResourceKey::Race, 5, TerminalBehavior::Hold { display_seconds: 0 });
        let generation = scheduler.live.get(&ResourceKey::Race).unwrap().generation;
        assert_eq!(
            scheduler.handle(CountdownEvent::DwellElapsed { key: ResourceKey::Race, generation }),
            None
        );
        assert!(scheduler.is_live(ResourceKey::Race));
    }
}
