use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    log_debug, log_warn,
    models::{DailyRecord, PhraseCategory, TrackedPhrase},
};

use super::matcher::PhraseMatcher;

const ENABLE_LOGS: bool = true;

/// Bytes of already-consumed transcript remembered to detect a stream that
/// was replaced instead of appended to.
const ANCHOR_BYTES: usize = 32;

/// How much of the transcript has been folded into counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptCursor {
    offset: usize,
    /// Tail of the consumed text, used to notice a replaced stream.
    anchor: String,
}

impl TranscriptCursor {
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn is_extended_by(&self, transcript: &str) -> bool {
        let offset = self.offset;
        if transcript.len() < offset || !transcript.is_char_boundary(offset) {
            return false;
        }
        let anchor_start = offset - self.anchor.len();
        transcript.is_char_boundary(anchor_start) && transcript[anchor_start..offset] == self.anchor
    }

    fn advance_to(&mut self, transcript: &str) {
        self.offset = transcript.len();
        let mut anchor_start = transcript.len().saturating_sub(ANCHOR_BYTES);
        while !transcript.is_char_boundary(anchor_start) {
            anchor_start += 1;
        }
        self.anchor = transcript[anchor_start..].to_string();
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhraseCompletion {
    pub category: PhraseCategory,
    pub index: usize,
    pub phrase: TrackedPhrase,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeOutcome {
    pub updated_positive: Vec<TrackedPhrase>,
    pub updated_avoid: Vec<TrackedPhrase>,
    /// Phrases whose goal became met during this call.
    pub newly_completed: Vec<PhraseCompletion>,
    /// Total matches folded into counts by this call.
    pub matches: usize,
    /// False when the call was a no-op (read-only, empty or already consumed input).
    pub applied: bool,
    /// The transcript no longer extended what was consumed before, so it was
    /// treated as a new stream and counted from its start.
    pub stream_restarted: bool,
}

/// Counts tracked phrases in a growing transcript.
///
/// The transcript handed to [`CounterEngine::consume_transcript`] must only
/// ever grow by appending. The engine remembers how many bytes it has
/// already folded into counts and only scans text past that offset, so
/// repeated notifications with the same or a longer transcript never count
/// an occurrence twice. A phrase split across two deliveries is not counted.
/// The reverse also holds: a match ending exactly at the end of a delivery
/// is counted even if text appended later glues a word character onto it
/// ("I am worthy" then "I am worthyness" counts once). Final transcripts
/// end every result with a space, so this only affects raw callers.
///
/// When the transcript is replaced (shorter than the consumed offset, or the
/// consumed tail no longer matches) the engine logs a warning and starts
/// over from the beginning of the new text. Callers that clear their
/// transcript should call [`CounterEngine::reset_cursor`] instead of relying
/// on that detection.
#[derive(Debug, Clone, Default)]
pub struct CounterEngine {
    positive_phrases: Vec<TrackedPhrase>,
    avoid_phrases: Vec<TrackedPhrase>,
    cursor: TranscriptCursor,
    read_only: bool,
}

impl CounterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_record(record: &DailyRecord, read_only: bool) -> Self {
        let mut engine = Self::new();
        engine.initialize(
            record.positive_phrases.clone(),
            record.avoid_phrases.clone(),
        );
        engine.set_read_only(read_only);
        engine
    }

    /// Replaces both collections and resets the transcript cursor.
    pub fn initialize(&mut self, positive: Vec<TrackedPhrase>, avoid: Vec<TrackedPhrase>) {
        self.positive_phrases = positive;
        self.avoid_phrases = avoid;
        for category in [PhraseCategory::Positive, PhraseCategory::Avoid] {
            for phrase in self.phrases_mut(category) {
                phrase.refresh_completion(category);
            }
        }
        self.reset_cursor();
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn positive_phrases(&self) -> &[TrackedPhrase] {
        &self.positive_phrases
    }

    pub fn avoid_phrases(&self) -> &[TrackedPhrase] {
        &self.avoid_phrases
    }

    pub fn phrases(&self, category: PhraseCategory) -> &[TrackedPhrase] {
        match category {
            PhraseCategory::Positive => &self.positive_phrases,
            PhraseCategory::Avoid => &self.avoid_phrases,
        }
    }

    fn phrases_mut(&mut self, category: PhraseCategory) -> &mut Vec<TrackedPhrase> {
        match category {
            PhraseCategory::Positive => &mut self.positive_phrases,
            PhraseCategory::Avoid => &mut self.avoid_phrases,
        }
    }

    pub fn consumed_offset(&self) -> usize {
        self.cursor.offset
    }

    pub fn cursor(&self) -> TranscriptCursor {
        self.cursor.clone()
    }

    /// Continues from a cursor taken from another engine over the same transcript.
    pub fn restore_cursor(&mut self, cursor: TranscriptCursor) {
        self.cursor = cursor;
    }

    /// Forgets how much transcript has been consumed; counts are kept.
    pub fn reset_cursor(&mut self) {
        self.cursor = TranscriptCursor::default();
    }

    pub fn to_record(&self, date: NaiveDate) -> DailyRecord {
        DailyRecord::new(
            date,
            self.positive_phrases.clone(),
            self.avoid_phrases.clone(),
        )
    }

    /// Folds any text appended since the previous call into the counts.
    pub fn consume_transcript(&mut self, transcript: &str) -> ConsumeOutcome {
        if self.read_only || transcript.is_empty() {
            return ConsumeOutcome::default();
        }

        let mut stream_restarted = false;
        if !self.cursor.is_extended_by(transcript) {
            log_warn!(
                "Transcript of {} bytes does not extend the {} bytes already counted; treating it as a new stream",
                transcript.len(),
                self.cursor.offset
            );
            self.reset_cursor();
            stream_restarted = true;
        } else if transcript.len() == self.cursor.offset {
            return ConsumeOutcome::default();
        }

        let start = self.cursor.offset;
        let mut matches = 0;
        let mut newly_completed = Vec::new();

        for category in [PhraseCategory::Positive, PhraseCategory::Avoid] {
            for (index, phrase) in self.phrases_mut(category).iter_mut().enumerate() {
                let occurrences = PhraseMatcher::new(&phrase.text).count_from(transcript, start);
                if occurrences == 0 {
                    continue;
                }
                let occurrences = u32::try_from(occurrences).unwrap_or(u32::MAX);
                phrase.count = phrase.count.saturating_add(occurrences);
                matches += occurrences as usize;
                if phrase.refresh_completion(category) {
                    newly_completed.push(PhraseCompletion {
                        category,
                        index,
                        phrase: phrase.clone(),
                    });
                }
            }
        }

        self.cursor.advance_to(transcript);

        if matches > 0 {
            log_debug!(
                "Counted {matches} matches in {} new transcript bytes",
                transcript.len() - start
            );
        }

        ConsumeOutcome {
            updated_positive: self.positive_phrases.clone(),
            updated_avoid: self.avoid_phrases.clone(),
            newly_completed,
            matches,
            applied: true,
            stream_restarted,
        }
    }

    /// Appends a phrase with a zero count. Blank text is ignored.
    pub fn add_phrase(&mut self, category: PhraseCategory, text: &str, target: u32) -> bool {
        if self.read_only {
            return false;
        }
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.phrases_mut(category)
            .push(TrackedPhrase::new(category, text, target));
        true
    }

    pub fn remove_phrase(&mut self, category: PhraseCategory, index: usize) -> Option<TrackedPhrase> {
        if self.read_only {
            return None;
        }
        let phrases = self.phrases_mut(category);
        if index >= phrases.len() {
            return None;
        }
        Some(phrases.remove(index))
    }

    pub fn update_target(&mut self, category: PhraseCategory, index: usize, target: u32) -> bool {
        if self.read_only {
            return false;
        }
        let Some(phrase) = self.phrases_mut(category).get_mut(index) else {
            return false;
        };
        phrase.target = target;
        phrase.refresh_completion(category);
        true
    }

    /// Zeroes every count and resets the transcript cursor.
    pub fn reset_counts(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        for category in [PhraseCategory::Positive, PhraseCategory::Avoid] {
            for phrase in self.phrases_mut(category) {
                phrase.count = 0;
                phrase.completed = false;
                phrase.refresh_completion(category);
            }
        }
        self.reset_cursor();
        true
    }
}
