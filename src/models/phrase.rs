//! Tracked phrase data model.
//!
//! A phrase is either an affirmation the user wants to say more often or a
//! word the user wants to avoid. The two categories use different
//! completion policies, see [`CompletionPolicy`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PhraseCategory {
    Positive,
    Avoid,
}

impl PhraseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhraseCategory::Positive => "positive",
            PhraseCategory::Avoid => "avoid",
        }
    }

    pub fn completion_policy(&self) -> CompletionPolicy {
        match self {
            PhraseCategory::Positive => CompletionPolicy::ReachTarget,
            PhraseCategory::Avoid => CompletionPolicy::StayWithinLimit,
        }
    }
}

/// How `completed` is derived from `(count, target)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Affirmations: a goal exists only when `target > 0`, and it is met once
    /// `count >= target`.
    ReachTarget,
    /// Words to avoid: `target` is the number of slips allowed. With the
    /// default target of zero the goal holds only while `count == 0`.
    StayWithinLimit,
}

impl CompletionPolicy {
    pub fn is_completed(&self, count: u32, target: u32) -> bool {
        match self {
            CompletionPolicy::ReachTarget => target > 0 && count >= target,
            CompletionPolicy::StayWithinLimit => count <= target,
        }
    }
}

/// One tracked phrase with its running count for a single day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrackedPhrase {
    pub text: String,
    pub count: u32,
    pub target: u32,
    /// Cached; recomputed from `(count, target, category)` on every update.
    pub completed: bool,
}

impl TrackedPhrase {
    pub fn new(category: PhraseCategory, text: impl Into<String>, target: u32) -> Self {
        let mut phrase = Self {
            text: text.into(),
            count: 0,
            target,
            completed: false,
        };
        phrase.refresh_completion(category);
        phrase
    }

    /// Re-derives `completed`; returns true when it flipped from false to true.
    pub fn refresh_completion(&mut self, category: PhraseCategory) -> bool {
        let was_completed = self.completed;
        self.completed = category
            .completion_policy()
            .is_completed(self.count, self.target);
        !was_completed && self.completed
    }

    pub fn definition(&self) -> PhraseDefinition {
        PhraseDefinition {
            text: self.text.clone(),
            target: self.target,
        }
    }
}

/// The user-editable part of a phrase: what to listen for and the goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhraseDefinition {
    pub text: String,
    pub target: u32,
}

impl PhraseDefinition {
    pub fn new(text: impl Into<String>, target: u32) -> Self {
        Self {
            text: text.into(),
            target,
        }
    }

    pub fn into_tracked(self, category: PhraseCategory) -> TrackedPhrase {
        TrackedPhrase::new(category, self.text, self.target)
    }
}

pub fn default_positive_phrases() -> Vec<PhraseDefinition> {
    vec![
        PhraseDefinition::new("I am confident", 10),
        PhraseDefinition::new("I can do this", 10),
        PhraseDefinition::new("I am worthy", 10),
    ]
}

pub fn default_avoid_phrases() -> Vec<PhraseDefinition> {
    vec![
        PhraseDefinition::new("can't", 0),
        PhraseDefinition::new("impossible", 0),
        PhraseDefinition::new("never", 0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_without_target_never_completes() {
        let policy = PhraseCategory::Positive.completion_policy();
        assert!(!policy.is_completed(0, 0));
        assert!(!policy.is_completed(25, 0));
        assert!(policy.is_completed(3, 3));
        assert!(!policy.is_completed(2, 3));
    }

    #[test]
    fn avoid_with_zero_target_holds_only_at_zero() {
        let policy = PhraseCategory::Avoid.completion_policy();
        assert!(policy.is_completed(0, 0));
        assert!(!policy.is_completed(1, 0));
        assert!(policy.is_completed(2, 2));
        assert!(!policy.is_completed(3, 2));
    }

    #[test]
    fn refresh_reports_only_rising_edge() {
        let mut phrase = TrackedPhrase::new(PhraseCategory::Positive, "I am worthy", 1);
        assert!(!phrase.completed);
        phrase.count = 1;
        assert!(phrase.refresh_completion(PhraseCategory::Positive));
        phrase.count = 2;
        assert!(!phrase.refresh_completion(PhraseCategory::Positive));
        assert!(phrase.completed);
    }

    #[test]
    fn wire_shape_rejects_unknown_fields() {
        let json = r#"{"text":"never","count":1,"target":0,"completed":false,"extra":1}"#;
        assert!(serde_json::from_str::<TrackedPhrase>(json).is_err());

        let json = r#"{"text":"never","count":1,"target":0,"completed":false}"#;
        let phrase: TrackedPhrase = serde_json::from_str(json).unwrap();
        assert_eq!(phrase.count, 1);
    }
}
