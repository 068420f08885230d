// File: tornwatch-core/tests/engine_tests.rs
//
// End-to-end scenarios against a running engine, in paused virtual time.
// Timings are checked at half-second offsets so they never coincide with a
// one-second tick.

mod test_utils;

use serde_json::json;
use tokio_test::assert_err;

use tornwatch_common::models::{
    ApiKey, DataSource, Freshness, NotificationSettings, NotifyChannel, NotifyCondition, ResourceKey,
};
use tornwatch_common::traits::CredentialStore;
use tornwatch_core::test_utils::{ProjectorCall, ScriptedReply, TEST_API_KEY};

use test_utils::*;

#[tokio::test(start_paused = true)]
async fn fatal_credential_error_stops_everything() -> anyhow::Result<()> {
    let http = scripted(vec![ScriptedReply::api_error(2)], vec![no_races()]);
    let h = start_engine(midday(), http, true);

    sleep_ms(500).await;
    assert!(h.projector.contains(&ProjectorCall::NeedsSetup(Some("Invalid API key".into()))));
    assert_eq!(h.store.load_credential()?, None);
    assert_eq!(h.http.race_requests(), 0, "race fetch must be skipped after a fatal error");

    h.projector.clear();
    sleep_ms(40_000).await;
    assert_eq!(h.http.primary_requests(), 1, "poll cycle must not run again");
    assert!(h.projector.calls().is_empty(), "no timer may tick after teardown");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn fatal_error_discards_cached_snapshot() -> anyhow::Result<()> {
    let http = scripted(
        vec![ScriptedReply::ok(energy_body(600)), ScriptedReply::api_error(2)],
        vec![no_races()],
    );
    let h = start_engine(midday(), http, true);

    sleep_ms(15_500).await;
    assert!(h.projector.contains(&ProjectorCall::NeedsSetup(Some("Invalid API key".into()))));
    // Fatal path never falls back to the stale snapshot.
    assert!(!h.projector.contains(&ProjectorCall::SnapshotUpdated(Freshness::Stale)));

    h.projector.clear();
    sleep_ms(3_000).await;
    assert!(h.projector.ticks_for(ResourceKey::Energy).is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn transient_timeout_keeps_countdown_running() -> anyhow::Result<()> {
    let http = scripted(
        vec![
            ScriptedReply::ok(energy_body(120)),
            ScriptedReply::Hang,
            ScriptedReply::ok(energy_body(50)),
        ],
        vec![no_races()],
    );
    let h = start_engine(midday(), http, true);

    // Second cycle starts at 15s and times out at 25s.
    sleep_ms(25_500).await;
    let ticks = h.projector.ticks_for(ResourceKey::Energy);
    assert_eq!(ticks.first(), Some(&(120, false)));
    assert_eq!(ticks.iter().filter(|(s, _)| *s == 120).count(), 1, "timer must not restart");
    assert_eq!(h.projector.last_tick(ResourceKey::Energy), Some((95, false)));

    assert!(h.projector.contains(&ProjectorCall::ErrorIndicator {
        source: DataSource::Primary,
        message: Some("Timeout".into()),
    }));
    assert!(h.projector.contains(&ProjectorCall::SnapshotUpdated(Freshness::Stale)));
    assert!(!h.projector.contains(&ProjectorCall::SourceUnavailable(DataSource::Primary)));
    assert!(!h.projector.contains(&ProjectorCall::Unavailable(ResourceKey::Energy)));

    // Third cycle at 30s succeeds and clears the indicator.
    sleep_ms(5_000).await;
    assert_eq!(h.projector.last_tick(ResourceKey::Energy), Some((50, false)));
    assert!(
        h.projector.count(&ProjectorCall::ErrorIndicator { source: DataSource::Primary, message: None }) >= 2
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failure_without_cache_shows_unavailable() -> anyhow::Result<()> {
    let http = scripted(
        vec![ScriptedReply::status(502, "<html>bad gateway</html>")],
        vec![ScriptedReply::Network("connection reset".into())],
    );
    let h = start_engine(midday(), http, true);

    sleep_ms(500).await;
    assert!(h.projector.contains(&ProjectorCall::SourceUnavailable(DataSource::Primary)));
    assert!(h.projector.contains(&ProjectorCall::SourceUnavailable(DataSource::Race)));
    assert!(h.projector.contains(&ProjectorCall::ErrorIndicator {
        source: DataSource::Primary,
        message: Some("HTTP error 502".into()),
    }));
    assert!(!h.projector.contains(&ProjectorCall::SnapshotUpdated(Freshness::Stale)));
    // The cycle keeps going.
    sleep_ms(15_000).await;
    assert_eq!(h.http.primary_requests(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn travel_arrival_notifies_once_then_clears() -> anyhow::Result<()> {
    let http = scripted(
        vec![
            ScriptedReply::ok(travel_body("Mexico", 2)),
            ScriptedReply::ok(travel_body("Mexico", 0)),
        ],
        vec![no_races()],
    );
    let h = start_engine(midday(), http, true);

    sleep_ms(2_500).await;
    assert_eq!(
        h.projector.ticks_for(ResourceKey::Travel),
        vec![(2, false), (1, false), (0, true)]
    );
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Arrived!");
    assert_eq!(sent[0].body, "You have arrived in Mexico.");
    assert_eq!(sent[0].channel, NotifyChannel::Push);
    assert!(!h.projector.contains(&ProjectorCall::Hidden(ResourceKey::Travel)));

    sleep_ms(9_000).await;
    assert!(!h.projector.contains(&ProjectorCall::Hidden(ResourceKey::Travel)), "still dwelling");

    sleep_ms(1_000).await;
    assert!(h.projector.contains(&ProjectorCall::Hidden(ResourceKey::Travel)));

    sleep_ms(4_000).await;
    assert_eq!(h.notifier.count_titled("Arrived!"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn both_channels_deliver_when_enabled() -> anyhow::Result<()> {
    let http = scripted(vec![ScriptedReply::ok(travel_body("Japan", 1))], vec![no_races()]);
    let settings = NotificationSettings {
        voice_enabled: true,
        ..NotificationSettings::default()
    };
    let h = start_engine_with(midday(), http, true, settings);

    sleep_ms(1_500).await;
    let channels: Vec<_> = h.notifier.sent().into_iter().map(|n| n.channel).collect();
    assert_eq!(channels, vec![NotifyChannel::Push, NotifyChannel::Voice]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn disabled_condition_stays_silent() -> anyhow::Result<()> {
    let http = scripted(vec![ScriptedReply::ok(travel_body("Japan", 1))], vec![no_races()]);
    let mut settings = NotificationSettings::default();
    settings.disabled.insert(NotifyCondition::TravelArrived);
    let h = start_engine_with(midday(), http, true, settings);

    sleep_ms(1_500).await;
    assert_eq!(h.projector.last_tick(ResourceKey::Travel), Some((0, true)));
    assert!(h.notifier.sent().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn full_bar_announced_once_across_polls() -> anyhow::Result<()> {
    let http = scripted(
        vec![
            ScriptedReply::ok(energy_body(0)),
            ScriptedReply::ok(energy_body(0)),
            ScriptedReply::ok(energy_body(20)),
            ScriptedReply::ok(energy_body(0)),
        ],
        vec![no_races()],
    );
    let h = start_engine(midday(), http, true);

    // Polls at 0s and 15s both report a full bar.
    sleep_ms(16_000).await;
    assert_eq!(h.notifier.count_titled("Energy full"), 1);

    // 30s: regenerating again, flag re-arms. 45s: full again.
    sleep_ms(30_000).await;
    assert_eq!(h.notifier.count_titled("Energy full"), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn new_day_approaching_fires_once() -> anyhow::Result<()> {
    let http = scripted(vec![ScriptedReply::ok(refills_body(true, true))], vec![no_races()]);
    let h = start_engine(before_midnight(3602), http, true);

    // 3602, 3601, 3600 are outside the window.
    sleep_ms(2_500).await;
    assert_eq!(h.notifier.count_titled("New day soon"), 0);

    sleep_ms(1_000).await;
    assert_eq!(h.projector.last_tick(ResourceKey::NewDay), Some((3599, false)));
    assert_eq!(h.notifier.count_titled("New day soon"), 1);

    sleep_ms(20_000).await;
    assert_eq!(h.notifier.count_titled("New day soon"), 1);
    assert_eq!(h.notifier.count_titled("Refill reminder"), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn new_day_reached_fires_once_and_rearms() -> anyhow::Result<()> {
    let http = scripted(vec![ScriptedReply::ok(refills_body(true, true))], vec![no_races()]);
    let h = start_engine(before_midnight(2), http, true);

    sleep_ms(2_500).await;
    assert_eq!(h.projector.last_tick(ResourceKey::NewDay), Some((0, true)));
    assert_eq!(h.notifier.count_titled("New day"), 1);

    sleep_ms(8_000).await;
    let ticks = h.projector.ticks_for(ResourceKey::NewDay);
    assert_eq!(ticks.iter().filter(|t| **t == (0, true)).count(), 1);
    assert_eq!(h.projector.last_tick(ResourceKey::NewDay), Some((86_392, false)));
    assert_eq!(h.notifier.count_titled("New day"), 1);
    assert_eq!(h.notifier.count_titled("New day soon"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn refill_reminder_inside_warning_window() -> anyhow::Result<()> {
    let http = scripted(vec![ScriptedReply::ok(refills_body(false, true))], vec![no_races()]);
    let h = start_engine(before_midnight(1800), http, true);

    sleep_ms(1_500).await;
    assert_eq!(h.notifier.count_titled("Refill reminder"), 1);
    let reminder = h
        .notifier
        .sent()
        .into_iter()
        .find(|n| n.title == "Refill reminder")
        .unwrap();
    assert_eq!(reminder.body, "Your energy refill is still unused today.");

    sleep_ms(20_000).await;
    assert_eq!(h.notifier.count_titled("Refill reminder"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn overlapping_cycle_is_skipped() -> anyhow::Result<()> {
    let http = scripted(vec![ScriptedReply::Hang], vec![ScriptedReply::Hang]);
    let h = start_engine(midday(), http, true);

    // Primary times out at 10s, race at 20s; the 15s trigger finds the cycle busy.
    sleep_ms(16_000).await;
    assert_eq!(h.http.primary_requests(), 1);
    assert_eq!(h.http.race_requests(), 1);

    sleep_ms(15_000).await;
    assert_eq!(h.http.primary_requests(), 2);
    assert!(h.projector.contains(&ProjectorCall::SourceUnavailable(DataSource::Primary)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn active_race_finishes_and_clears() -> anyhow::Result<()> {
    let now = midday().timestamp();
    let race = json!({
        "races": [{
            "id": 42, "title": "Sunday Sprint", "track_id": 7, "status": "in_progress",
            "schedule": { "start": now - 60, "end": now + 3 }
        }]
    });
    let http = scripted(vec![ScriptedReply::ok(json!({}))], vec![ScriptedReply::ok(race)]);
    let h = start_engine(midday(), http, true);

    sleep_ms(3_500).await;
    assert_eq!(
        h.projector.ticks_for(ResourceKey::Race),
        vec![(3, false), (2, false), (1, false), (0, true)]
    );
    let finished: Vec<_> = h
        .notifier
        .sent()
        .into_iter()
        .filter(|n| n.title == "Race finished")
        .collect();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].body, "Sunday Sprint has finished.");

    sleep_ms(10_000).await;
    assert!(h.projector.contains(&ProjectorCall::Hidden(ResourceKey::Race)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn scheduled_race_holds_after_start() -> anyhow::Result<()> {
    let now = midday().timestamp();
    let race = json!({
        "races": [{
            "id": 7, "title": "Docks", "track_id": 2, "status": "scheduled",
            "schedule": { "start": now + 2, "end": now + 600 }
        }]
    });
    let http = scripted(vec![ScriptedReply::ok(json!({}))], vec![ScriptedReply::ok(race)]);
    let h = start_engine(midday(), http, true);

    sleep_ms(12_500).await;
    assert_eq!(h.projector.last_tick(ResourceKey::Race), Some((0, true)));
    assert_eq!(h.notifier.count_titled("Race started"), 1);
    // Held, not dwelling.
    assert!(!h.projector.contains(&ProjectorCall::Hidden(ResourceKey::Race)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn credential_lifecycle_through_handle() -> anyhow::Result<()> {
    let http = scripted(vec![ScriptedReply::ok(energy_body(60))], vec![no_races()]);
    let h = start_engine(midday(), http, false);

    sleep_ms(500).await;
    assert!(h.projector.contains(&ProjectorCall::NeedsSetup(None)));
    assert_eq!(h.http.primary_requests(), 0);

    assert_err!(h.handle.set_credential("not a key"));
    h.handle.set_credential(TEST_API_KEY)?;
    sleep_ms(500).await;
    assert_eq!(h.http.primary_requests(), 1);
    assert_eq!(h.store.load_credential()?, Some(ApiKey::parse(TEST_API_KEY)?));
    assert_eq!(h.projector.last_tick(ResourceKey::Energy), Some((60, false)));
    assert!(h.http.requests()[0].contains("key=abcdEFGH12345678"));

    h.handle.clear_credential()?;
    sleep_ms(500).await;
    assert!(h.projector.contains(&ProjectorCall::NeedsSetup(Some("API key cleared".into()))));
    assert_eq!(h.store.load_credential()?, None);

    h.projector.clear();
    sleep_ms(20_000).await;
    assert_eq!(h.http.primary_requests(), 1);
    assert!(h.projector.calls().is_empty());

    h.handle.shutdown()?;
    h.task.await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn handle_reports_closed_engine() -> anyhow::Result<()> {
    let http = scripted(vec![ScriptedReply::ok(json!({}))], vec![no_races()]);
    let h = start_engine(midday(), http, true);

    h.handle.shutdown()?;
    h.task.await?;
    assert!(matches!(
        h.handle.clear_credential(),
        Err(tornwatch_core::Error::EngineClosed)
    ));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn bar_without_fulltime_is_unavailable_not_full() -> anyhow::Result<()> {
    let http = scripted(
        vec![ScriptedReply::ok(json!({ "energy": { "current": 100, "maximum": 150 } }))],
        vec![no_races()],
    );
    let h = start_engine(midday(), http, true);

    sleep_ms(1_500).await;
    assert!(h.projector.contains(&ProjectorCall::Unavailable(ResourceKey::Energy)));
    assert!(h.projector.ticks_for(ResourceKey::Energy).is_empty());
    assert_eq!(h.notifier.count_titled("Energy full"), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn race_failure_falls_back_to_cached_race() -> anyhow::Result<()> {
    let now = midday().timestamp();
    let race = json!({
        "races": [{
            "id": 5, "title": "Parkland", "track_id": 4, "status": "in_progress",
            "schedule": { "start": now - 30, "end": now + 90 }
        }]
    });
    let http = scripted(
        vec![ScriptedReply::ok(json!({}))],
        vec![ScriptedReply::ok(race), ScriptedReply::Network("connection reset".into())],
    );
    let h = start_engine(midday(), http, true);

    sleep_ms(15_500).await;
    assert_eq!(h.http.race_requests(), 2);
    assert!(h.projector.contains(&ProjectorCall::RaceUpdated(Freshness::Stale)));
    assert!(!h.projector.contains(&ProjectorCall::SourceUnavailable(DataSource::Race)));
    assert!(h.projector.calls().iter().any(|call| matches!(
        call,
        ProjectorCall::ErrorIndicator { source: DataSource::Race, message: Some(_) }
    )));

    // The race countdown was not restarted by the failed fetch.
    let ticks = h.projector.ticks_for(ResourceKey::Race);
    assert_eq!(ticks.iter().filter(|t| **t == (90, false)).count(), 1);
    assert_eq!(h.projector.last_tick(ResourceKey::Race), Some((75, false)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn fatal_race_error_tears_down() -> anyhow::Result<()> {
    let http = scripted(
        vec![ScriptedReply::ok(energy_body(600))],
        vec![ScriptedReply::api_error(2)],
    );
    let h = start_engine(midday(), http, true);

    sleep_ms(500).await;
    assert!(h.projector.contains(&ProjectorCall::NeedsSetup(Some("Invalid API key".into()))));
    assert_eq!(h.store.load_credential()?, None);
    assert!(!h.projector.contains(&ProjectorCall::RaceUpdated(Freshness::Stale)));

    h.projector.clear();
    sleep_ms(20_000).await;
    assert!(h.projector.ticks_for(ResourceKey::Energy).is_empty());
    assert_eq!(h.http.primary_requests(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn starting_inside_warning_window_announces_once() -> anyhow::Result<()> {
    let http = scripted(vec![ScriptedReply::ok(refills_body(true, true))], vec![no_races()]);
    let h = start_engine(before_midnight(1800), http, true);

    // No crossing was observed, but the first tick already sits inside the window.
    sleep_ms(500).await;
    assert_eq!(h.projector.ticks_for(ResourceKey::NewDay).first(), Some(&(1800, false)));
    assert_eq!(h.notifier.count_titled("New day soon"), 1);

    sleep_ms(20_000).await;
    assert_eq!(h.notifier.count_titled("New day soon"), 1);
    Ok(())
}
