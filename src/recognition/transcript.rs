use serde::Serialize;

/// Accumulates recognizer output.
///
/// Final results are appended (each followed by a single space) and never
/// edited afterwards, which is what the counter relies on. Interim text is
/// kept separately for display only.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptBuffer {
    final_text: String,
    interim: String,
    /// Bumped whenever the final text is cleared.
    generation: u64,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_final(&mut self, text: &str) {
        self.interim.clear();
        if text.trim().is_empty() {
            return;
        }
        self.final_text.push_str(text);
        self.final_text.push(' ');
    }

    pub fn set_interim(&mut self, text: &str) {
        self.interim.clear();
        self.interim.push_str(text);
    }

    pub fn clear(&mut self) {
        self.final_text.clear();
        self.interim.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// The append-only text that may be counted.
    pub fn final_text(&self) -> &str {
        &self.final_text
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finals_append_and_interim_stays_separate() {
        let mut buffer = TranscriptBuffer::new();
        buffer.set_interim("I am conf");
        buffer.push_final("I am confident");
        buffer.set_interim("and");
        buffer.push_final("and ready");
        assert_eq!(buffer.final_text(), "I am confident and ready ");
        assert_eq!(buffer.interim(), "");
    }

    #[test]
    fn clear_bumps_generation() {
        let mut buffer = TranscriptBuffer::new();
        buffer.push_final("never");
        buffer.clear();
        assert_eq!(buffer.final_text(), "");
        assert_eq!(buffer.generation(), 1);
    }

    #[test]
    fn blank_finals_are_dropped() {
        let mut buffer = TranscriptBuffer::new();
        buffer.push_final("   ");
        assert_eq!(buffer.final_text(), "");
    }
}
