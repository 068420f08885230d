//! Wall clock and cancellable timers.
//!
//! Every timer is a spawned task that stops as soon as its `TimerHandle` is
//! cancelled or dropped. Callbacks run on the timer task, so they are expected to
//! do nothing heavier than pushing an event onto a channel.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_epoch(&self) -> i64 {
        self.now().timestamp()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Owning handle for a spawned timer. Dropping it cancels the timer.
#[derive(Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Calls `on_fire` every `period` until it returns `false` or the handle is cancelled.
pub fn spawn_periodic<F>(period: Duration, fire_immediately: bool, mut on_fire: F) -> TimerHandle
where
    F: FnMut() -> bool + Send + 'static,
{
    let token = CancellationToken::new();
    let cancelled = token.clone();
    let start = if fire_immediately {
        Instant::now()
    } else {
        Instant::now() + period
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => break,
                _ = ticker.tick() => {
                    if cancelled.is_cancelled() || !on_fire() {
                        break;
                    }
                }
            }
        }
    });

    TimerHandle { token }
}

/// Calls `on_fire` once after `delay` unless cancelled first.
pub fn spawn_once<F>(delay: Duration, on_fire: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    let token = CancellationToken::new();
    let cancelled = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = cancelled.cancelled() => {}
            _ = tokio::time::sleep(delay) => {
                if !cancelled.is_cancelled() {
                    on_fire();
                }
            }
        }
    });

    TimerHandle { token }
}
