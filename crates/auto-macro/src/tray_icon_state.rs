use auto_macro_core::SessionStatus;

/// Tray icon states mirroring the engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Ready to record or play.
    Idle,
    /// Capturing input.
    Recording,
    /// Replaying a macro.
    Playing,
}

impl TrayIconState {
    /// Icon state a status notification leads to.
    pub fn after(status: &SessionStatus) -> Self {
        match status {
            SessionStatus::RecordingStarted { .. } => TrayIconState::Recording,
            SessionStatus::PlaybackStarted { .. } => TrayIconState::Playing,
            SessionStatus::RecordingStopped { .. }
            | SessionStatus::RecordingDiscarded { .. }
            | SessionStatus::PlaybackFinished { .. }
            | SessionStatus::Error { .. } => TrayIconState::Idle,
        }
    }

    /// Tooltip shown for this state.
    pub fn tooltip(self) -> &'static str {
        match self {
            TrayIconState::Idle => "Auto-Macro - Ready",
            TrayIconState::Recording => "Auto-Macro - Recording...",
            TrayIconState::Playing => "Auto-Macro - Playing (Esc to stop)",
        }
    }

    /// RGBA fill of the generated icon.
    pub(crate) fn color(self) -> [u8; 4] {
        match self {
            TrayIconState::Idle => [0x9e, 0x9e, 0x9e, 0xff],
            TrayIconState::Recording => [0xd3, 0x2f, 0x2f, 0xff],
            TrayIconState::Playing => [0x38, 0x8e, 0x3c, 0xff],
        }
    }
}
