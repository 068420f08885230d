// src/services/projection.rs
//
// Pure decisions: which countdowns a snapshot implies. No timers, no I/O.

use tornwatch_common::models::{
    Bar, PrimaryStatusSnapshot, RacePhase, RaceSnapshot, ResourceKey,
};

use crate::services::countdown::TerminalBehavior;

/// Resources derived from the primary snapshot, in projection order.
pub const PRIMARY_RESOURCES: [ResourceKey; 7] = [
    ResourceKey::Energy,
    ResourceKey::Nerve,
    ResourceKey::Happiness,
    ResourceKey::Booster,
    ResourceKey::Medical,
    ResourceKey::Drug,
    ResourceKey::Travel,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPlan {
    Start {
        key: ResourceKey,
        seconds: u64,
        behavior: TerminalBehavior,
    },
    /// Data present, nothing to count (not travelling, no race).
    Idle { key: ResourceKey },
    /// Field absent from the snapshot.
    Missing { key: ResourceKey },
}

/// Display values for a ready booster or medical cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownMaxima {
    pub booster_seconds: u64,
    pub medical_seconds: u64,
}

pub fn plan_primary(snapshot: &PrimaryStatusSnapshot, maxima: CooldownMaxima) -> Vec<CountdownPlan> {
    let mut plans = Vec::with_capacity(PRIMARY_RESOURCES.len());

    plans.push(plan_bar(ResourceKey::Energy, snapshot.energy.as_ref()));
    plans.push(plan_bar(ResourceKey::Nerve, snapshot.nerve.as_ref()));
    plans.push(plan_bar(ResourceKey::Happiness, snapshot.happiness.as_ref()));

    let cooldowns = snapshot.cooldowns.as_ref();
    plans.push(plan_cooldown(
        ResourceKey::Booster,
        cooldowns.and_then(|c| c.booster),
        maxima.booster_seconds,
    ));
    plans.push(plan_cooldown(
        ResourceKey::Medical,
        cooldowns.and_then(|c| c.medical),
        maxima.medical_seconds,
    ));
    plans.push(plan_cooldown(ResourceKey::Drug, cooldowns.and_then(|c| c.drug), 0));

    plans.push(match snapshot.travel.as_ref() {
        None => CountdownPlan::Missing { key: ResourceKey::Travel },
        Some(travel) if travel.seconds_remaining > 0 => CountdownPlan::Start {
            key: ResourceKey::Travel,
            seconds: travel.seconds_remaining as u64,
            behavior: TerminalBehavior::Dwell,
        },
        Some(_) => CountdownPlan::Idle { key: ResourceKey::Travel },
    });

    plans
}

/// A bar without `fulltime` has no known time to full and is not reported as full.
fn plan_bar(key: ResourceKey, bar: Option<&Bar>) -> CountdownPlan {
    match bar.and_then(|b| b.seconds_to_full) {
        Some(seconds) => CountdownPlan::Start {
            key,
            seconds: seconds.max(0) as u64,
            behavior: TerminalBehavior::Hold { display_seconds: 0 },
        },
        None => CountdownPlan::Missing { key },
    }
}

fn plan_cooldown(key: ResourceKey, seconds: Option<i64>, ready_display: u64) -> CountdownPlan {
    match seconds {
        Some(seconds) => CountdownPlan::Start {
            key,
            seconds: seconds.max(0) as u64,
            behavior: TerminalBehavior::Hold { display_seconds: ready_display },
        },
        None => CountdownPlan::Missing { key },
    }
}

/// Which race countdown is running. Decides the notification on terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceStage {
    /// Counting to the start; terminal holds "ongoing".
    Starting,
    /// Counting to the finish; terminal dwells then hides.
    Ending,
}

pub fn plan_race(snapshot: &RaceSnapshot, now_epoch: i64) -> (CountdownPlan, Option<RaceStage>) {
    let key = ResourceKey::Race;
    let phase = snapshot
        .latest()
        .map(|race| race.phase_at(now_epoch))
        .unwrap_or(RacePhase::Hidden);

    match phase {
        RacePhase::StartsIn(seconds) => (
            CountdownPlan::Start {
                key,
                seconds,
                behavior: TerminalBehavior::Hold { display_seconds: 0 },
            },
            Some(RaceStage::Starting),
        ),
        RacePhase::EndsIn(seconds) => (
            CountdownPlan::Start {
                key,
                seconds,
                behavior: TerminalBehavior::Dwell,
            },
            Some(RaceStage::Ending),
        ),
        RacePhase::Hidden => (CountdownPlan::Idle { key }, None),
    }
}
