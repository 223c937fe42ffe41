use crate::session::PlaybackOutcome;

use std::time::Instant;

use uuid::Uuid;

/// Which mutually exclusive mode the engine is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Neither capturing nor replaying.
    Idle,
    /// Capturing input into a fresh buffer.
    Recording {
        /// When capture started.
        started_at: Instant,
        /// Unique session ID for log correlation.
        session_id: Uuid,
    },
    /// Replaying a recording.
    Playing {
        /// When playback started.
        started_at: Instant,
        /// Unique session ID for log correlation.
        session_id: Uuid,
    },
}

impl SessionState {
    /// Lower-case state name for messages.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Recording { .. } => "recording",
            SessionState::Playing { .. } => "playing",
        }
    }

    /// `true` when no session is active.
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }
}

/// Notifications emitted by the coordinator for display.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Capture began.
    RecordingStarted {
        /// Session ID.
        session_id: Uuid,
    },
    /// Capture ended normally.
    RecordingStopped {
        /// Session ID.
        session_id: Uuid,
        /// Number of captured events.
        event_count: usize,
    },
    /// Capture was aborted by an emergency stop; its buffer was dropped.
    RecordingDiscarded {
        /// Session ID.
        session_id: Uuid,
    },
    /// Replay began.
    PlaybackStarted {
        /// Session ID.
        session_id: Uuid,
        /// Number of events to replay.
        event_count: usize,
    },
    /// Replay ended, either at the last event or on cancellation.
    PlaybackFinished {
        /// Session ID.
        session_id: Uuid,
        /// How the pass ended.
        outcome: PlaybackOutcome,
    },
    /// Something went wrong; the engine is back to idle.
    Error {
        /// Human-readable description.
        message: String,
    },
}
