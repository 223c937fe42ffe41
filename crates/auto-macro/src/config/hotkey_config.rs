use crate::{
    AppResult,
    config::{default_start_recording, default_stop_recording},
};

use auto_macro_core::Chord;
use serde::{Deserialize, Serialize};

/// The two fixed, non-editable recording chords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Chord that starts recording.
    #[serde(default = "default_start_recording")]
    pub start_recording: String,
    /// Chord that stops recording.
    #[serde(default = "default_stop_recording")]
    pub stop_recording: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            start_recording: default_start_recording(),
            stop_recording: default_stop_recording(),
        }
    }
}

impl HotkeyConfig {
    /// Parsed `(start, stop)` chords.
    #[track_caller]
    pub fn chords(&self) -> AppResult<(Chord, Chord)> {
        let start = Chord::parse(&self.start_recording)?;
        let stop = Chord::parse(&self.stop_recording)?;
        Ok((start, stop))
    }
}
