use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    models::{PhraseCategory, TrackedPhrase},
    navigation::NavigationSnapshot,
};

/// Notifications broadcast to every [`super::Tracker::subscribe`] receiver.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrackerEvent {
    #[serde(rename_all = "camelCase")]
    PhraseCompleted {
        #[serde(with = "crate::navigation::dates::ymd")]
        date: NaiveDate,
        category: PhraseCategory,
        index: usize,
        phrase: TrackedPhrase,
    },
    RecordSaved {
        #[serde(with = "crate::navigation::dates::ymd")]
        date: NaiveDate,
    },
    /// A background save or load failed; the in-memory state is still usable.
    StorageNotice { message: String },
    DateChanged { navigation: NavigationSnapshot },
    #[serde(rename_all = "camelCase")]
    DayRolledOver {
        #[serde(with = "crate::navigation::dates::ymd")]
        previous: NaiveDate,
        #[serde(with = "crate::navigation::dates::ymd")]
        today: NaiveDate,
    },
    DataReplaced { records: usize },
}
