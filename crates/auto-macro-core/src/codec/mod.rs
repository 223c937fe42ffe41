//! Macro file codec.
//!
//! A macro file is a JSON array of 6-field records
//! `[kind, x, y, aux, pressed, timestamp]`:
//!
//! | kind      | x, y        | aux                           | pressed           |
//! |-----------|-------------|-------------------------------|-------------------|
//! | `"move"`  | coordinates | `null`                        | `null`            |
//! | `"click"` | coordinates | `"left"`/`"right"`/`"middle"` | press or release  |
//! | `"key"`   | `null`      | key symbol                    | `is_special_key`  |
//!
//! Files are written atomically (temp file, fsync, rename), so a failed save
//! never leaves a truncated macro behind.

mod atomic;

pub(crate) use atomic::write_atomic;

use crate::{
    CoreResult, MacroError,
    event::{Event, KeySymbol, MouseButton, Recording},
};

use std::{fs, panic::Location, path::Path};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// File extension used for macro files.
pub const MACRO_EXTENSION: &str = "macro";

#[derive(Debug, Serialize, Deserialize)]
struct Record(
    String,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<bool>,
    f64,
);

impl From<&Event> for Record {
    fn from(event: &Event) -> Self {
        let kind = event.kind().to_string();
        match event {
            Event::Move { x, y, t } => {
                Record(kind, Some(i64::from(*x)), Some(i64::from(*y)), None, None, *t)
            }
            Event::Click {
                x,
                y,
                button,
                pressed,
                t,
            } => Record(
                kind,
                Some(i64::from(*x)),
                Some(i64::from(*y)),
                Some(button.name().to_string()),
                Some(*pressed),
                *t,
            ),
            Event::KeyAction { key, t } => Record(
                kind,
                None,
                None,
                Some(key.symbol().to_string()),
                Some(key.is_special_key()),
                *t,
            ),
        }
    }
}

impl Record {
    #[track_caller]
    fn into_event(self, index: usize) -> CoreResult<Event> {
        let Record(kind, x, y, aux, pressed, t) = self;

        let event = match kind.as_str() {
            "move" => {
                let (x, y) = coordinates(index, x, y)?;
                Event::Move { x, y, t }
            }
            "click" => {
                let (x, y) = coordinates(index, x, y)?;
                let button = aux
                    .ok_or_else(|| missing(index, "button"))?
                    .parse::<MouseButton>()
                    .map_err(|reason| MacroError::format(format!("record {index}: {reason}")))?;
                let pressed = pressed.ok_or_else(|| missing(index, "pressed"))?;
                Event::Click {
                    x,
                    y,
                    button,
                    pressed,
                    t,
                }
            }
            "key" => {
                let symbol = aux.ok_or_else(|| missing(index, "key symbol"))?;
                let is_special_key = pressed.ok_or_else(|| missing(index, "is_special_key"))?;
                Event::KeyAction {
                    key: KeySymbol::from_parts(&symbol, is_special_key)?,
                    t,
                }
            }
            other => {
                return Err(MacroError::format(format!(
                    "record {index}: unknown kind {other:?}"
                )));
            }
        };

        event.validate(index)?;
        Ok(event)
    }
}

#[track_caller]
fn missing(index: usize, field: &str) -> MacroError {
    MacroError::format(format!("record {index}: missing {field}"))
}

#[track_caller]
fn coordinates(index: usize, x: Option<i64>, y: Option<i64>) -> CoreResult<(i32, i32)> {
    let (Some(x), Some(y)) = (x, y) else {
        return Err(missing(index, "coordinates"));
    };

    match (i32::try_from(x), i32::try_from(y)) {
        (Ok(x), Ok(y)) if x >= 0 && y >= 0 => Ok((x, y)),
        _ => Err(MacroError::InvalidEvent {
            index,
            reason: format!("coordinates ({x}, {y}) must be non-negative 32-bit integers"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

/// Serialize events to macro-file JSON.
#[track_caller]
pub fn encode(events: &[Event]) -> CoreResult<String> {
    let records: Vec<Record> = events.iter().map(Record::from).collect();
    serde_json::to_string(&records)
        .map_err(|e| MacroError::format(format!("Failed to serialize recording: {}", e)))
}

/// Parse macro-file JSON into a validated recording.
#[track_caller]
pub fn decode(contents: &str) -> CoreResult<Recording> {
    let records: Vec<Record> = serde_json::from_str(contents)
        .map_err(|e| MacroError::format(format!("Failed to parse recording: {}", e)))?;

    let events = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_event(index))
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(Recording::from_captured(events))
}

/// Write `recording` to `path`.
///
/// # Errors
///
/// [`MacroError::EmptyRecording`] if there is nothing to save (no file is
/// created), [`MacroError::Io`] if the file cannot be written.
#[track_caller]
#[instrument(skip(recording), fields(event_count = recording.len()))]
pub fn save(recording: &Recording, path: &Path) -> CoreResult<()> {
    if recording.is_empty() {
        warn!(path = ?path, "Nothing to save, recording is empty");
        return Err(MacroError::EmptyRecording {
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let contents = encode(recording.events())?;
    write_atomic(path, contents.as_bytes())?;

    info!(path = ?path, event_count = recording.len(), "Macro saved");

    Ok(())
}

/// Read a recording from `path`.
///
/// # Errors
///
/// [`MacroError::Io`] if the file cannot be read, [`MacroError::Format`] or
/// [`MacroError::InvalidEvent`] if its content is not a valid macro.
#[track_caller]
#[instrument]
pub fn load(path: &Path) -> CoreResult<Recording> {
    let contents = fs::read_to_string(path).map_err(|e| MacroError::io(path, e))?;
    let recording = decode(&contents)?;

    info!(path = ?path, event_count = recording.len(), "Macro loaded");

    Ok(recording)
}
