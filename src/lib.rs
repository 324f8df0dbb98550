pub mod counter;
pub mod db;
pub mod errors;
pub mod models;
pub mod navigation;
pub mod recognition;
pub mod settings;
pub mod tracker;
pub mod utils;

use std::path::Path;

pub use counter::{ConsumeOutcome, CounterEngine, PhraseCompletion, PhraseMatcher};
pub use db::Database;
pub use errors::{TrackerError, TrackerResult};
pub use models::{DailyRecord, PhraseCategory, PhraseDefinition, TrackedPhrase};
pub use navigation::{DateMode, DateNavigator, NavigationSnapshot};
pub use recognition::{RecognitionSession, RecognitionSignal, RecognitionStatus, SessionDirective};
pub use settings::{RecognitionConfig, SettingsStore};
pub use tracker::{Tracker, TrackerEvent, TrackerSnapshot};

/// Initializes logging and opens the tracker stored under `data_dir`.
///
/// Today's record is loaded (or created) before this returns.
pub async fn launch(data_dir: &Path) -> TrackerResult<Tracker> {
    utils::init_logging();
    log::info!("Mantra Score starting up...");

    let tracker = Tracker::open(data_dir).await?;
    let snapshot = tracker.snapshot().await;
    log::info!(
        "Tracking {} affirmations and {} words to avoid for {}",
        snapshot.positive_phrases.len(),
        snapshot.avoid_phrases.len(),
        snapshot.navigation.today
    );
    Ok(tracker)
}
