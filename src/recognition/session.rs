use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    errors::{TrackerError, TrackerResult},
    log_error, log_info, log_warn,
    settings::{RecognitionConfig, SettingsStore},
};

use super::{RecognitionSignal, RecognitionStatus, TranscriptBuffer};

const ENABLE_LOGS: bool = true;

pub const RESTART_AFTER_END: Duration = Duration::from_millis(100);
pub const RESTART_AFTER_ERROR: Duration = Duration::from_millis(1000);
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

const PERMISSION_GUIDANCE: &str =
    "Microphone access denied. Allow microphone access in your browser settings, then start recording again.";

/// What the host should do with the recognizer after a call.
#[derive(Debug)]
pub enum SessionDirective {
    None,
    Start,
    Stop,
    Restart { after: Duration },
    Surface(TrackerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// First user; the recognizer should be created and, if `resume`, started.
    Created { resume: bool },
    Shared { users: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Shared { remaining: usize },
    /// Last user left and recording is not wanted.
    StopRecognizer,
    /// Last user left but recording should carry on for the next user.
    KeepRunning,
    NotAcquired,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub users: usize,
    pub supported: bool,
    pub is_recording: bool,
    pub is_listening: bool,
    pub keep_recording: bool,
    pub status: RecognitionStatus,
    pub last_error: Option<String>,
    pub transcript: String,
    pub interim: String,
}

#[derive(Debug)]
struct SessionState {
    users: usize,
    is_recording: bool,
    is_listening: bool,
    status: RecognitionStatus,
    consecutive_failures: u32,
    last_error: Option<String>,
    transcript: TranscriptBuffer,
}

/// The one recognizer session shared by every screen that shows live
/// transcription.
///
/// Screens call [`acquire`](Self::acquire) when they appear and
/// [`release`](Self::release) when they go away. Whether recording should
/// continue is persisted in settings so it survives remounts and restarts.
pub struct RecognitionSession {
    id: Uuid,
    supported: bool,
    settings: Arc<SettingsStore>,
    state: Mutex<SessionState>,
}

impl RecognitionSession {
    pub fn new(settings: Arc<SettingsStore>, supported: bool) -> Self {
        let status = if supported {
            RecognitionStatus::Idle
        } else {
            RecognitionStatus::Unsupported
        };
        Self {
            id: Uuid::new_v4(),
            supported,
            settings,
            state: Mutex::new(SessionState {
                users: 0,
                is_recording: false,
                is_listening: false,
                status,
                consecutive_failures: 0,
                last_error: None,
                transcript: TranscriptBuffer::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist_keep_recording(&self, keep_recording: bool) {
        if let Err(err) = self.settings.set_keep_recording(keep_recording) {
            log_error!("Failed to persist recording state: {err:#}");
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> RecognitionConfig {
        self.settings.recognition()
    }

    pub fn acquire(&self) -> AcquireOutcome {
        let mut state = self.lock();
        state.users += 1;
        if state.users > 1 {
            log_info!("Reusing recognition session {} ({} users)", self.id, state.users);
            return AcquireOutcome::Shared { users: state.users };
        }
        let resume = self.supported && self.settings.keep_recording();
        log_info!("Recognition session {} acquired; resume={resume}", self.id);
        AcquireOutcome::Created { resume }
    }

    pub fn release(&self) -> ReleaseOutcome {
        let mut state = self.lock();
        if state.users == 0 {
            log_warn!("Release without matching acquire on session {}", self.id);
            return ReleaseOutcome::NotAcquired;
        }
        state.users -= 1;
        if state.users > 0 {
            return ReleaseOutcome::Shared {
                remaining: state.users,
            };
        }
        if self.settings.keep_recording() {
            ReleaseOutcome::KeepRunning
        } else {
            state.is_recording = false;
            state.is_listening = false;
            if self.supported {
                state.status = RecognitionStatus::Idle;
            }
            ReleaseOutcome::StopRecognizer
        }
    }

    /// User asked to start recording.
    pub fn start_recording(&self) -> TrackerResult<SessionDirective> {
        if !self.supported {
            return Err(TrackerError::UnsupportedEnvironment);
        }
        {
            let mut state = self.lock();
            state.last_error = None;
            state.consecutive_failures = 0;
        }
        self.persist_keep_recording(true);
        log_info!("Recording requested on session {}", self.id);
        Ok(SessionDirective::Start)
    }

    /// User asked to stop; the recognizer must not auto-restart.
    pub fn stop_recording(&self) -> SessionDirective {
        self.persist_keep_recording(false);
        let mut state = self.lock();
        state.is_recording = false;
        state.is_listening = false;
        if self.supported {
            state.status = RecognitionStatus::Idle;
        }
        log_info!("Recording stopped on session {}", self.id);
        SessionDirective::Stop
    }

    pub fn reset_transcript(&self) {
        self.lock().transcript.clear();
    }

    /// Final transcript and its generation.
    pub fn transcript(&self) -> (String, u64) {
        let state = self.lock();
        (
            state.transcript.final_text().to_string(),
            state.transcript.generation(),
        )
    }

    pub fn status(&self) -> RecognitionStatus {
        self.lock().status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let keep_recording = self.settings.keep_recording();
        let state = self.lock();
        SessionSnapshot {
            id: self.id,
            users: state.users,
            supported: self.supported,
            is_recording: state.is_recording,
            is_listening: state.is_listening,
            keep_recording,
            status: state.status,
            last_error: state.last_error.clone(),
            transcript: state.transcript.final_text().to_string(),
            interim: state.transcript.interim().to_string(),
        }
    }

    pub fn handle(&self, signal: RecognitionSignal) -> SessionDirective {
        let keep_recording = self.settings.keep_recording();
        let mut state = self.lock();

        match signal {
            RecognitionSignal::Started => {
                state.is_recording = true;
                state.status = RecognitionStatus::Recording;
                state.last_error = None;
                SessionDirective::None
            }
            RecognitionSignal::Stopped => {
                state.is_listening = false;
                if keep_recording {
                    state.status = RecognitionStatus::Restarting;
                    SessionDirective::Restart {
                        after: RESTART_AFTER_END,
                    }
                } else {
                    state.is_recording = false;
                    state.status = RecognitionStatus::Idle;
                    SessionDirective::None
                }
            }
            RecognitionSignal::SoundDetected => {
                state.is_listening = true;
                state.status = RecognitionStatus::SoundDetected;
                SessionDirective::None
            }
            RecognitionSignal::SoundEnded => {
                state.is_listening = false;
                if state.is_recording {
                    state.status = RecognitionStatus::Recording;
                }
                SessionDirective::None
            }
            RecognitionSignal::FinalResult(text) => {
                state.transcript.push_final(&text);
                state.consecutive_failures = 0;
                SessionDirective::None
            }
            RecognitionSignal::InterimResult(text) => {
                state.transcript.set_interim(&text);
                SessionDirective::None
            }
            RecognitionSignal::TransientError(reason) => {
                log_info!("Recognizer reported '{reason}', continuing");
                state.status = RecognitionStatus::NoSpeech;
                SessionDirective::None
            }
            RecognitionSignal::PermissionDenied => {
                state.is_recording = false;
                state.is_listening = false;
                state.status = RecognitionStatus::PermissionDenied;
                state.last_error = Some(PERMISSION_GUIDANCE.to_string());
                drop(state);
                self.persist_keep_recording(false);
                SessionDirective::Surface(TrackerError::PermissionDenied(
                    PERMISSION_GUIDANCE.to_string(),
                ))
            }
            RecognitionSignal::FatalError(reason) => {
                if keep_recording && state.consecutive_failures < MAX_CONSECUTIVE_FAILURES {
                    state.consecutive_failures += 1;
                    state.status = RecognitionStatus::Restarting;
                    log_warn!(
                        "Recognizer error '{reason}', restart attempt {}",
                        state.consecutive_failures
                    );
                    return SessionDirective::Restart {
                        after: RESTART_AFTER_ERROR,
                    };
                }

                state.is_recording = false;
                state.is_listening = false;
                state.status = RecognitionStatus::Failed;
                let message = format!("Speech recognition error: {reason}. Please try again.");
                state.last_error = Some(message.clone());
                drop(state);
                if keep_recording {
                    self.persist_keep_recording(false);
                }
                log_error!("Recognizer gave up: {reason}");
                SessionDirective::Surface(TrackerError::Recognition(message))
            }
        }
    }
}
