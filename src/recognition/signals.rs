use serde::{Deserialize, Serialize};

/// Notifications from the speech recognizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "detail", rename_all = "camelCase")]
pub enum RecognitionSignal {
    Started,
    /// The recognizer ended its session, whether or not the user asked it to.
    Stopped,
    SoundDetected,
    SoundEnded,
    FinalResult(String),
    InterimResult(String),
    PermissionDenied,
    /// Expected hiccups such as no speech within the listening window.
    TransientError(String),
    FatalError(String),
}

impl RecognitionSignal {
    /// Classifies a Web Speech API style error code.
    pub fn from_error_code(code: &str) -> Self {
        match code {
            "not-allowed" | "service-not-allowed" => RecognitionSignal::PermissionDenied,
            "no-speech" | "aborted" => RecognitionSignal::TransientError(code.to_string()),
            other => RecognitionSignal::FatalError(other.to_string()),
        }
    }
}

/// What the recognizer is doing, as shown to the user.
///
/// `NoSpeech` is a normal state, not an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RecognitionStatus {
    Idle,
    Recording,
    SoundDetected,
    NoSpeech,
    Restarting,
    PermissionDenied,
    Unsupported,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_classified() {
        assert_eq!(
            RecognitionSignal::from_error_code("not-allowed"),
            RecognitionSignal::PermissionDenied
        );
        assert!(matches!(
            RecognitionSignal::from_error_code("no-speech"),
            RecognitionSignal::TransientError(_)
        ));
        assert!(matches!(
            RecognitionSignal::from_error_code("network"),
            RecognitionSignal::FatalError(_)
        ));
    }
}
