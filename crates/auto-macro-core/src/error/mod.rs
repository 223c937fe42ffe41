use std::{panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use thiserror::Error;

/// Macro engine errors with source location tracking.
#[derive(Error, Debug)]
pub enum MacroError {
    /// A recording with no events was handed to save or playback.
    #[error("Recording is empty {location}")]
    EmptyRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The chord is already bound in the shortcut table or reserved.
    #[error("Shortcut {chord} already exists {location}")]
    DuplicateChord {
        /// Canonical chord that collided.
        chord: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The chord text does not describe a key combination.
    #[error("Invalid shortcut {chord:?}: {reason} {location}")]
    InvalidChord {
        /// Chord text as supplied.
        chord: String,
        /// Why it was rejected.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A shortcut binding is incomplete.
    #[error("Invalid shortcut binding: {reason} {location}")]
    InvalidBinding {
        /// Why it was rejected.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An event carried values the engine cannot replay.
    #[error("Invalid event at index {index}: {reason} {location}")]
    InvalidEvent {
        /// Position of the event in its sequence.
        index: usize,
        /// Why it was rejected.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Positional access past the end of a table.
    #[error("Index {index} out of range for {len} entries {location}")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Number of entries present.
        len: usize,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The session is not in a state that allows the requested transition.
    #[error("Cannot {requested} while {current} {location}")]
    InvalidTransition {
        /// Current session state name.
        current: &'static str,
        /// Requested operation.
        requested: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Filesystem access failed.
    #[error("IO error on {path:?}: {source} {location}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Persisted data does not have the expected shape.
    #[error("Format error: {reason} {location}")]
    Format {
        /// Description of the parse failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A simulated key or pointer action could not be delivered.
    #[error("Input injection failed: {reason} {location}")]
    Injection {
        /// Description of the injection failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The OS refused a global hotkey.
    #[error("Hotkey registration failed for {chord}: {reason} {location}")]
    HotkeyRegistration {
        /// Chord that failed.
        chord: String,
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The global input listener could not be installed.
    #[error("Input listener error: {reason} {location}")]
    Listener {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Coarse classification of [`MacroError`] used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller supplied data that breaks an invariant.
    Validation,
    /// File could not be read or written.
    Io,
    /// Persisted data is corrupt.
    Format,
    /// Simulated input could not be delivered.
    Injection,
    /// Hotkey or listener could not be installed.
    Registration,
    /// Session state machine rejected a transition.
    Session,
}

impl MacroError {
    /// Build an [`MacroError::Io`] for `path`.
    #[track_caller]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MacroError::Io {
            path: path.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Build a [`MacroError::Format`].
    #[track_caller]
    pub fn format(reason: impl Into<String>) -> Self {
        MacroError::Format {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Build a [`MacroError::Injection`].
    #[track_caller]
    pub fn injection(reason: impl Into<String>) -> Self {
        MacroError::Injection {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Which branch of the error taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            MacroError::EmptyRecording { .. }
            | MacroError::DuplicateChord { .. }
            | MacroError::InvalidChord { .. }
            | MacroError::InvalidBinding { .. }
            | MacroError::InvalidEvent { .. }
            | MacroError::IndexOutOfRange { .. } => ErrorCategory::Validation,
            MacroError::Io { .. } => ErrorCategory::Io,
            MacroError::Format { .. } => ErrorCategory::Format,
            MacroError::Injection { .. } => ErrorCategory::Injection,
            MacroError::HotkeyRegistration { .. } | MacroError::Listener { .. } => {
                ErrorCategory::Registration
            }
            MacroError::InvalidTransition { .. } => ErrorCategory::Session,
        }
    }
}

/// Result type alias using [`MacroError`].
pub type Result<T> = std::result::Result<T, MacroError>;
