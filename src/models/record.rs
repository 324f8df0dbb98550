//! Daily record data model: the persisted snapshot of one calendar day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::phrase::{PhraseCategory, PhraseDefinition, TrackedPhrase};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DailyRecord {
    /// Serialized as `YYYY-MM-DD`.
    #[serde(with = "crate::navigation::dates::ymd")]
    pub date: NaiveDate,
    #[serde(alias = "positiveAffirmations")]
    pub positive_phrases: Vec<TrackedPhrase>,
    #[serde(alias = "negativePhrases", alias = "negativeWords")]
    pub avoid_phrases: Vec<TrackedPhrase>,
}

impl DailyRecord {
    pub fn new(
        date: NaiveDate,
        positive_phrases: Vec<TrackedPhrase>,
        avoid_phrases: Vec<TrackedPhrase>,
    ) -> Self {
        Self {
            date,
            positive_phrases,
            avoid_phrases,
        }
    }

    /// A fresh record for `date` carrying only phrase definitions; counts start at zero.
    pub fn seeded(
        date: NaiveDate,
        positive: Vec<PhraseDefinition>,
        avoid: Vec<PhraseDefinition>,
    ) -> Self {
        Self {
            date,
            positive_phrases: positive
                .into_iter()
                .map(|def| def.into_tracked(PhraseCategory::Positive))
                .collect(),
            avoid_phrases: avoid
                .into_iter()
                .map(|def| def.into_tracked(PhraseCategory::Avoid))
                .collect(),
        }
    }

    pub fn phrases(&self, category: PhraseCategory) -> &[TrackedPhrase] {
        match category {
            PhraseCategory::Positive => &self.positive_phrases,
            PhraseCategory::Avoid => &self.avoid_phrases,
        }
    }

    pub fn definitions(&self, category: PhraseCategory) -> Vec<PhraseDefinition> {
        self.phrases(category)
            .iter()
            .map(TrackedPhrase::definition)
            .collect()
    }

    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
