use std::{fs, path::Path, sync::Arc};

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};

use crate::{
    counter::{ConsumeOutcome, CounterEngine, TranscriptCursor},
    db::{parse_backup, Database},
    errors::TrackerResult,
    log_error, log_info, log_warn,
    models::{DailyRecord, PhraseCategory, TrackedPhrase},
    navigation::{today_local, CalendarMonth, DateNavigator, NavigationSnapshot},
    recognition::RecognitionSession,
    settings::SettingsStore,
};

use super::{persistence::RecordSaver, TrackerEvent};

const ENABLE_LOGS: bool = true;

pub const DB_FILE_NAME: &str = "mantra-score.sqlite3";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

const EVENT_CAPACITY: usize = 64;

/// Source of the local calendar date.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub navigation: NavigationSnapshot,
    pub positive_phrases: Vec<TrackedPhrase>,
    pub avoid_phrases: Vec<TrackedPhrase>,
    /// False when a historical day without a stored record is shown.
    pub has_record: bool,
}

struct TrackerState {
    navigator: DateNavigator,
    engine: CounterEngine,
    /// Day whose record the engine currently holds.
    bound_date: NaiveDate,
    has_record: bool,
    /// Position in the live transcript, independent of which day is bound.
    cursor: TranscriptCursor,
    transcript_generation: Option<u64>,
}

impl TrackerState {
    fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            navigation: self.navigator.snapshot(),
            positive_phrases: self.engine.positive_phrases().to_vec(),
            avoid_phrases: self.engine.avoid_phrases().to_vec(),
            has_record: self.has_record,
        }
    }

    fn rebind(&mut self, engine: CounterEngine, date: NaiveDate, has_record: bool) {
        self.engine = engine;
        self.engine.restore_cursor(self.cursor.clone());
        self.bound_date = date;
        self.has_record = has_record;
    }
}

/// Caller-facing entry point: owns the counter engine for the selected day,
/// the date navigator, and persistence.
#[derive(Clone)]
pub struct Tracker {
    state: Arc<Mutex<TrackerState>>,
    db: Database,
    settings: Arc<SettingsStore>,
    saver: RecordSaver,
    events: broadcast::Sender<TrackerEvent>,
    clock: Clock,
}

impl Tracker {
    /// Opens (or creates) the store and settings under `data_dir` and binds today.
    pub async fn open(data_dir: &Path) -> TrackerResult<Self> {
        fs::create_dir_all(data_dir)?;
        let db = Database::new(data_dir.join(DB_FILE_NAME))?;
        let settings = Arc::new(SettingsStore::new(data_dir.join(SETTINGS_FILE_NAME))?);
        let tracker = Self::new(db, settings);
        tracker.bootstrap().await?;
        Ok(tracker)
    }

    pub fn new(db: Database, settings: Arc<SettingsStore>) -> Self {
        Self::with_clock(db, settings, Arc::new(today_local))
    }

    pub fn with_clock(db: Database, settings: Arc<SettingsStore>, clock: Clock) -> Self {
        let today = clock();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut engine = CounterEngine::new();
        engine.set_read_only(true);

        Self {
            state: Arc::new(Mutex::new(TrackerState {
                navigator: DateNavigator::new(today, Vec::new()),
                engine,
                bound_date: today,
                has_record: false,
                cursor: TranscriptCursor::default(),
                transcript_generation: None,
            })),
            saver: RecordSaver::new(db.clone(), events.clone()),
            db,
            settings,
            events,
            clock,
        }
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: TrackerEvent) {
        let _ = self.events.send(event);
    }

    fn notice(&self, message: String) {
        self.emit(TrackerEvent::StorageNotice { message });
    }

    /// Loads the recorded dates and binds today's record, creating it if needed.
    pub async fn bootstrap(&self) -> TrackerResult<TrackerSnapshot> {
        let dates = self.db.list_record_dates().await?;
        let mut state = self.state.lock().await;
        state.navigator.advance_today((self.clock)());
        state.navigator.replace_recorded(dates);
        state.navigator.go_to_today();
        self.bind_selected(&mut state).await?;
        Ok(state.snapshot())
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn calendar_month(&self, year: i32, month: u32) -> Option<CalendarMonth> {
        self.state.lock().await.navigator.calendar_month(year, month)
    }

    // ---- navigation -------------------------------------------------------

    pub async fn select_date(&self, date: NaiveDate) -> TrackerResult<TrackerSnapshot> {
        let mut state = self.state.lock().await;
        self.roll_over_if_needed(&mut state);
        state.navigator.select(date);
        self.bind_selected(&mut state).await?;
        Ok(state.snapshot())
    }

    pub async fn previous_day(&self) -> TrackerResult<TrackerSnapshot> {
        let mut state = self.state.lock().await;
        self.roll_over_if_needed(&mut state);
        if state.navigator.previous().is_some() {
            self.bind_selected(&mut state).await?;
        }
        Ok(state.snapshot())
    }

    pub async fn next_day(&self) -> TrackerResult<TrackerSnapshot> {
        let mut state = self.state.lock().await;
        self.roll_over_if_needed(&mut state);
        if state.navigator.next().is_some() {
            self.bind_selected(&mut state).await?;
        }
        Ok(state.snapshot())
    }

    pub async fn go_to_today(&self) -> TrackerResult<TrackerSnapshot> {
        let mut state = self.state.lock().await;
        self.roll_over_if_needed(&mut state);
        state.navigator.go_to_today();
        self.bind_selected(&mut state).await?;
        Ok(state.snapshot())
    }

    /// Re-reads the clock. Returns true when the calendar day advanced; the
    /// previously current day stays selected but becomes read-only.
    pub async fn check_day_rollover(&self) -> bool {
        let mut state = self.state.lock().await;
        self.roll_over_if_needed(&mut state)
    }

    fn roll_over_if_needed(&self, state: &mut TrackerState) -> bool {
        let previous = state.navigator.today();
        let today = (self.clock)();
        if !state.navigator.advance_today(today) {
            return false;
        }
        let read_only =
            state.navigator.is_read_only() || state.bound_date != state.navigator.selected();
        state.engine.set_read_only(read_only);
        self.emit(TrackerEvent::DayRolledOver { previous, today });
        self.emit(TrackerEvent::DateChanged {
            navigation: state.navigator.snapshot(),
        });
        true
    }

    /// Points the engine at the navigator's selected day.
    ///
    /// Today without a record is seeded from the most recent earlier record's
    /// phrase definitions (or the configured defaults) and saved right away. A
    /// historical day without a record is shown empty and nothing is created.
    async fn bind_selected(&self, state: &mut TrackerState) -> TrackerResult<()> {
        let date = state.navigator.selected();
        let read_only = state.navigator.is_read_only();

        // Failures surface as notices; the previous day's edits stay in memory only.
        let _ = self.saver.flush().await;

        let loaded = match self.db.load_record(date).await {
            Ok(loaded) => loaded,
            Err(err) => {
                log_error!("Failed to load record for {date}: {err}");
                self.notice(format!("Could not load {date}: {err}"));
                // Editing an unloaded day would overwrite whatever is stored.
                let mut engine = CounterEngine::new();
                engine.set_read_only(true);
                state.rebind(engine, date, false);
                return Err(err);
            }
        };

        match loaded {
            Some(record) => {
                state.rebind(CounterEngine::from_record(&record, read_only), date, true);
            }
            None if read_only => {
                let mut engine = CounterEngine::new();
                engine.set_read_only(true);
                state.rebind(engine, date, false);
            }
            None => {
                let record = self.seed_record(date).await;
                state.rebind(CounterEngine::from_record(&record, false), date, true);
                state.navigator.mark_recorded(date);
                // A failed seed save is already reported as a notice; the
                // next edit retries it.
                let _ = self.saver.write(&record).await;
                log_info!(
                    "Created record for {date} with {} positive and {} avoid phrases",
                    record.positive_phrases.len(),
                    record.avoid_phrases.len()
                );
            }
        }

        self.emit(TrackerEvent::DateChanged {
            navigation: state.navigator.snapshot(),
        });
        Ok(())
    }

    async fn seed_record(&self, date: NaiveDate) -> DailyRecord {
        match self.db.latest_record_before(date).await {
            Ok(Some(previous)) => DailyRecord::seeded(
                date,
                previous.definitions(PhraseCategory::Positive),
                previous.definitions(PhraseCategory::Avoid),
            ),
            Ok(None) => {
                let (positive, avoid) = self.settings.default_phrases();
                DailyRecord::seeded(date, positive, avoid)
            }
            Err(err) => {
                log_warn!("Could not read earlier records while seeding {date}: {err}");
                let (positive, avoid) = self.settings.default_phrases();
                DailyRecord::seeded(date, positive, avoid)
            }
        }
    }

    // ---- counting and editing ---------------------------------------------

    /// Folds new text of the live transcript into today's counts.
    pub async fn consume_transcript(&self, transcript: &str) -> ConsumeOutcome {
        let mut state = self.state.lock().await;
        self.roll_over_if_needed(&mut state);

        let outcome = state.engine.consume_transcript(transcript);
        if !outcome.applied {
            return outcome;
        }
        state.cursor = state.engine.cursor();

        let date = state.bound_date;
        for completion in &outcome.newly_completed {
            log_info!(
                "Goal reached for {} phrase \"{}\" on {date}",
                completion.category.as_str(),
                completion.phrase.text
            );
            self.emit(TrackerEvent::PhraseCompleted {
                date,
                category: completion.category,
                index: completion.index,
                phrase: completion.phrase.clone(),
            });
        }
        if outcome.matches > 0 {
            self.schedule_save(&state).await;
        }
        outcome
    }

    /// Consumes the final transcript of `session`, restarting the cursor
    /// when the session's transcript was cleared since the last call.
    pub async fn consume_session(&self, session: &RecognitionSession) -> ConsumeOutcome {
        let (transcript, generation) = session.transcript();
        {
            let mut state = self.state.lock().await;
            if state.transcript_generation != Some(generation) {
                if state.transcript_generation.is_some() {
                    state.cursor = TranscriptCursor::default();
                    state.engine.reset_cursor();
                }
                state.transcript_generation = Some(generation);
            }
        }
        self.consume_transcript(&transcript).await
    }

    /// Call when the live transcript is cleared; counts are kept.
    pub async fn reset_transcript_cursor(&self) {
        let mut state = self.state.lock().await;
        state.cursor = TranscriptCursor::default();
        state.engine.reset_cursor();
    }

    pub async fn add_phrase(
        &self,
        category: PhraseCategory,
        text: &str,
        target: u32,
    ) -> TrackerResult<TrackerSnapshot> {
        self.edit(|engine| engine.add_phrase(category, text, target))
            .await
    }

    pub async fn remove_phrase(
        &self,
        category: PhraseCategory,
        index: usize,
    ) -> TrackerResult<TrackerSnapshot> {
        self.edit(|engine| engine.remove_phrase(category, index).is_some())
            .await
    }

    pub async fn update_target(
        &self,
        category: PhraseCategory,
        index: usize,
        target: u32,
    ) -> TrackerResult<TrackerSnapshot> {
        self.edit(|engine| engine.update_target(category, index, target))
            .await
    }

    /// Zeroes every count of today. Text already heard stays consumed: the
    /// engine rewinds its cursor on reset, and the tracker puts it back.
    pub async fn reset_counts(&self) -> TrackerResult<TrackerSnapshot> {
        let mut state = self.state.lock().await;
        self.roll_over_if_needed(&mut state);
        if state.engine.reset_counts() {
            let cursor = state.cursor.clone();
            state.engine.restore_cursor(cursor);
            self.schedule_save(&state).await;
        }
        Ok(state.snapshot())
    }

    async fn edit<F>(&self, apply: F) -> TrackerResult<TrackerSnapshot>
    where
        F: FnOnce(&mut CounterEngine) -> bool,
    {
        let mut state = self.state.lock().await;
        self.roll_over_if_needed(&mut state);
        if state.engine.is_read_only() {
            log_warn!("Ignoring edit of read-only day {}", state.bound_date);
        } else if apply(&mut state.engine) {
            self.schedule_save(&state).await;
        }
        Ok(state.snapshot())
    }

    async fn schedule_save(&self, state: &TrackerState) {
        let record = state.engine.to_record(state.bound_date);
        self.saver
            .schedule(record, self.settings.save_debounce())
            .await;
    }

    /// Writes any pending debounced save now.
    pub async fn flush(&self) -> TrackerResult<()> {
        self.saver.flush().await
    }

    pub async fn has_pending_save(&self) -> bool {
        self.saver.has_pending().await
    }

    // ---- records ------------------------------------------------------------

    pub async fn list_records(&self) -> TrackerResult<Vec<DailyRecord>> {
        self.flush().await?;
        self.db.list_records().await
    }

    /// JSON backup of every record, including unsaved edits.
    pub async fn export_all(&self) -> TrackerResult<String> {
        self.flush().await?;
        self.db.export_all().await
    }

    /// Replaces all stored data with `payload`. An invalid payload changes nothing.
    pub async fn import_all(&self, payload: &str) -> TrackerResult<usize> {
        let records = parse_backup(payload)?;

        let mut state = self.state.lock().await;
        // Failures are reported as notices; the import replaces that data anyway.
        let _ = self.saver.flush().await;
        let imported = self.db.replace_all(records).await?;

        let dates = self.db.list_record_dates().await?;
        state.navigator.replace_recorded(dates);
        self.bind_selected(&mut state).await?;
        self.emit(TrackerEvent::DataReplaced { records: imported });
        Ok(imported)
    }

    /// Deletes the record of `date`. Deleting today's record reseeds it.
    pub async fn delete_record(&self, date: NaiveDate) -> TrackerResult<bool> {
        let mut state = self.state.lock().await;
        self.saver.discard(Some(date)).await;
        let deleted = self.db.delete_record(date).await?;
        state.navigator.forget(date);
        if state.bound_date == date {
            self.bind_selected(&mut state).await?;
        }
        Ok(deleted)
    }

    pub async fn clear_all_records(&self) -> TrackerResult<usize> {
        let mut state = self.state.lock().await;
        self.saver.discard(None).await;
        let cleared = self.db.clear_records().await?;
        state.navigator.replace_recorded(Vec::new());
        self.bind_selected(&mut state).await?;
        log_info!("Cleared {cleared} daily records");
        Ok(cleared)
    }
}
