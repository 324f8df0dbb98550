use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use tokio::{sync::broadcast, sync::Mutex, task::JoinHandle, time};

use crate::{
    db::Database,
    errors::TrackerResult,
    log_debug, log_error,
    models::DailyRecord,
};

use super::TrackerEvent;

const ENABLE_LOGS: bool = true;

struct PendingSave {
    id: u64,
    record: DailyRecord,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SaverState {
    next_id: u64,
    pending: Option<PendingSave>,
}

/// Debounced writer for the record of the selected day.
///
/// At most one save is pending. Scheduling a newer snapshot of the same date
/// replaces it; scheduling a different date writes the older one out
/// immediately first.
#[derive(Clone)]
pub(crate) struct RecordSaver {
    db: Database,
    events: broadcast::Sender<TrackerEvent>,
    state: Arc<Mutex<SaverState>>,
}

impl RecordSaver {
    pub(crate) fn new(db: Database, events: broadcast::Sender<TrackerEvent>) -> Self {
        Self {
            db,
            events,
            state: Arc::new(Mutex::new(SaverState::default())),
        }
    }

    pub(crate) async fn schedule(&self, record: DailyRecord, debounce: Duration) {
        let mut guard = self.state.lock().await;
        if let Some(previous) = guard.pending.take() {
            previous.handle.abort();
            if previous.record.date != record.date {
                self.spawn_write(previous.record);
            } else {
                log_debug!("Superseding pending save for {}", previous.record.date_key());
            }
        }

        guard.next_id += 1;
        let id = guard.next_id;
        let saver = self.clone();
        let snapshot = record.clone();
        let handle = tokio::spawn(async move {
            time::sleep(debounce).await;
            // Held through the write so a flush observes it as finished.
            let mut guard = saver.state.lock().await;
            if guard.pending.as_ref().map(|pending| pending.id) != Some(id) {
                return;
            }
            guard.pending = None;
            let _ = saver.write(&snapshot).await;
        });

        guard.pending = Some(PendingSave { id, record, handle });
    }

    /// Writes the pending snapshot now, if any.
    pub(crate) async fn flush(&self) -> TrackerResult<()> {
        let pending = self.state.lock().await.pending.take();
        match pending {
            Some(pending) => {
                pending.handle.abort();
                self.write(&pending.record).await
            }
            None => Ok(()),
        }
    }

    /// Drops the pending snapshot without writing it. With `only_date`, a
    /// snapshot of another date is left in place.
    pub(crate) async fn discard(&self, only_date: Option<NaiveDate>) {
        let mut guard = self.state.lock().await;
        let matches = match (&guard.pending, only_date) {
            (Some(pending), Some(date)) => pending.record.date == date,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if matches {
            if let Some(pending) = guard.pending.take() {
                pending.handle.abort();
                log_debug!("Discarded pending save for {}", pending.record.date_key());
            }
        }
    }

    pub(crate) async fn has_pending(&self) -> bool {
        self.state.lock().await.pending.is_some()
    }

    /// Writes `record` right away.
    pub(crate) async fn write(&self, record: &DailyRecord) -> TrackerResult<()> {
        match self.db.save_record(record).await {
            Ok(()) => {
                let _ = self.events.send(TrackerEvent::RecordSaved { date: record.date });
                Ok(())
            }
            Err(err) => {
                log_error!("Failed to save record for {}: {err}", record.date_key());
                let _ = self.events.send(TrackerEvent::StorageNotice {
                    message: format!("Could not save {}: {err}", record.date_key()),
                });
                Err(err)
            }
        }
    }

    fn spawn_write(&self, record: DailyRecord) {
        let saver = self.clone();
        tokio::spawn(async move {
            let _ = saver.write(&record).await;
        });
    }
}
