//! Glue for the external speech recognizer: its signals, the transcript it
//! produces, and the shared session that decides when to restart it.

pub mod session;
pub mod signals;
pub mod transcript;

pub use session::{
    AcquireOutcome, RecognitionSession, ReleaseOutcome, SessionDirective, SessionSnapshot,
};
pub use signals::{RecognitionSignal, RecognitionStatus};
pub use transcript::TranscriptBuffer;
