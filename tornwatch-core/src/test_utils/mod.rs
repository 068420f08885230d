// File: tornwatch-core/src/test_utils/mod.rs
//
// Fakes for the engine's collaborators. Each fake keeps its log behind an
// `Arc<Mutex<..>>` so a test can hand one clone to the engine and inspect another.

pub mod fakes;

pub use fakes::{
    ManualClock, OffsetClock, ProjectorCall, RecordingNotifier, RecordingProjector,
    ScriptedHttpClient, ScriptedReply, SentNotification, TEST_API_KEY,
};
