//! Whole-phrase, case-insensitive occurrence counting.
//!
//! A match counts only when the characters directly before and after it are
//! not alphanumeric. The check is done explicitly on the haystack rather
//! than with `\b`, so phrases that start or end with punctuation ("can't",
//! "wow!") behave the same as plain words, and multi-word phrases only need
//! boundaries at their outer edges.

use regex::Regex;

use crate::log_warn;

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    pattern: Option<Regex>,
}

impl PhraseMatcher {
    /// Builds a matcher for `phrase`. Metacharacters are escaped, so the
    /// phrase is always matched literally. A blank phrase never matches.
    pub fn new(phrase: &str) -> Self {
        let trimmed = phrase.trim();
        if trimmed.is_empty() {
            return Self { pattern: None };
        }

        let source = format!("(?i){}", regex::escape(trimmed));
        let pattern = match Regex::new(&source) {
            Ok(regex) => Some(regex),
            Err(err) => {
                log_warn!("Phrase '{trimmed}' cannot be matched: {err}");
                None
            }
        };

        Self { pattern }
    }

    pub fn count(&self, haystack: &str) -> usize {
        self.count_from(haystack, 0)
    }

    /// Counts matches that start at or after byte offset `start`.
    ///
    /// Text before `start` is still consulted for the leading boundary, so a
    /// phrase glued onto the end of earlier text is not counted.
    pub fn count_from(&self, haystack: &str, start: usize) -> usize {
        let Some(pattern) = &self.pattern else {
            return 0;
        };
        if start >= haystack.len() || !haystack.is_char_boundary(start) {
            return 0;
        }

        let mut count = 0;
        let mut position = start;
        while let Some(found) = pattern.find_at(haystack, position) {
            if starts_at_boundary(haystack, found.start()) && ends_at_boundary(haystack, found.end())
            {
                count += 1;
                position = found.end();
            } else {
                // Retry one character further so a rejected candidate does not
                // hide a valid match that overlaps it.
                let step = haystack[found.start()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                position = found.start() + step;
            }
            if position >= haystack.len() {
                break;
            }
        }
        count
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

fn starts_at_boundary(haystack: &str, index: usize) -> bool {
    !haystack[..index].chars().next_back().is_some_and(is_word_char)
}

fn ends_at_boundary(haystack: &str, index: usize) -> bool {
    !haystack[index..].chars().next().is_some_and(is_word_char)
}

/// Convenience wrapper: number of whole-phrase matches of `phrase` in `haystack`.
pub fn count_occurrences(haystack: &str, phrase: &str) -> usize {
    PhraseMatcher::new(phrase).count(haystack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_case() {
        let text = "I AM CONFIDENT. i am confident, I Am Confident";
        assert_eq!(count_occurrences(text, "I am confident"), 3);
        assert_eq!(count_occurrences(text, "i AM cOnFiDeNt"), 3);
    }

    #[test]
    fn requires_whole_words() {
        assert_eq!(count_occurrences("nevermind, never!", "never"), 1);
        assert_eq!(count_occurrences("forever never", "never"), 1);
        assert_eq!(count_occurrences("I can't, I cant", "can't"), 1);
        assert_eq!(count_occurrences("unconfident", "confident"), 0);
    }

    #[test]
    fn escapes_metacharacters() {
        assert_eq!(count_occurrences("I love c++ and C++.", "c++"), 2);
        assert_eq!(count_occurrences("yes (really) yes", "(really)"), 1);
        assert_eq!(count_occurrences("a.b axb", "a.b"), 1);
        assert_eq!(count_occurrences("price is $5", "$5"), 1);
    }

    #[test]
    fn counts_non_overlapping_left_to_right() {
        assert_eq!(count_occurrences("ha ha ha", "ha ha"), 1);
        assert_eq!(count_occurrences("ha ha ha ha", "ha ha"), 2);
        assert_eq!(count_occurrences("aaa", "aa"), 0);
    }

    #[test]
    fn rejected_candidate_does_not_hide_later_match() {
        assert_eq!(count_occurrences("xnever never", "never"), 1);
        assert_eq!(count_occurrences("ééé é", "é"), 1);
    }

    #[test]
    fn empty_inputs_are_total() {
        assert_eq!(count_occurrences("", "never"), 0);
        assert_eq!(count_occurrences("never", ""), 0);
        assert_eq!(count_occurrences("never", "   "), 0);
    }

    #[test]
    fn count_from_respects_preceding_text() {
        let matcher = PhraseMatcher::new("never");
        let text = "foonever never";
        assert_eq!(matcher.count_from(text, 3), 1);
        assert_eq!(matcher.count_from(text, 8), 1);
        assert_eq!(matcher.count_from(text, text.len()), 0);
    }
}
