pub mod engine;
pub mod matcher;

pub use engine::{ConsumeOutcome, CounterEngine, PhraseCompletion, TranscriptCursor};
pub use matcher::{count_occurrences, PhraseMatcher};
