use std::path::PathBuf;

/// Commands sent from hotkey handlers to the main application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Arm the recorder.
    StartRecording,
    /// Disarm the recorder and keep the capture as the last recording.
    StopRecording,
    /// Load a macro file and replay it.
    PlayFile {
        /// Resolved macro file path.
        path: PathBuf,
    },
    /// Request application shutdown.
    Shutdown,
}
