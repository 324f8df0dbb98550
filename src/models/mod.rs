pub mod phrase;
pub mod record;

pub use phrase::{
    default_avoid_phrases, default_positive_phrases, CompletionPolicy, PhraseCategory,
    PhraseDefinition, TrackedPhrase,
};
pub use record::DailyRecord;
