//! Typed representation of recorded input.
//!
//! Key identity is decided once, at capture time, as a [`KeySymbol`]: either a
//! member of the closed [`SpecialKey`] set or literal text. Nothing downstream
//! re-derives it from string patterns.

mod recording;
mod special_key;

pub use {recording::Recording, special_key::SpecialKey};

use crate::{CoreResult, MacroError};

use std::{fmt, panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// Mouse buttons the engine records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button.
    Middle,
}

impl MouseButton {
    /// Name used in macro files.
    pub fn name(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => Err(format!("unknown mouse button {other:?}")),
        }
    }
}

/// What a key event replays as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySymbol {
    /// Tapped as a named key.
    Special(SpecialKey),
    /// Typed as literal text.
    Text(String),
}

impl KeySymbol {
    /// Build a symbol from its persisted `{symbol, is_special_key}` pair.
    ///
    /// The flag alone decides the interpretation: `("esc", false)` is the
    /// three letters e, s, c.
    #[track_caller]
    pub fn from_parts(symbol: &str, is_special_key: bool) -> CoreResult<Self> {
        if is_special_key {
            SpecialKey::from_name(symbol)
                .map(KeySymbol::Special)
                .ok_or_else(|| MacroError::format(format!("unknown special key {symbol:?}")))
        } else if symbol.is_empty() {
            Err(MacroError::format("key text is empty"))
        } else {
            Ok(KeySymbol::Text(symbol.to_string()))
        }
    }

    /// Canonical name for special keys, the literal text otherwise.
    pub fn symbol(&self) -> &str {
        match self {
            KeySymbol::Special(key) => key.name(),
            KeySymbol::Text(text) => text,
        }
    }

    /// Whether this symbol names a special key.
    pub fn is_special_key(&self) -> bool {
        matches!(self, KeySymbol::Special(_))
    }
}

/// One recorded action with its capture time in epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Absolute pointer move.
    Move {
        /// Screen x in pixels.
        x: i32,
        /// Screen y in pixels.
        y: i32,
        /// Capture time.
        t: f64,
    },
    /// Button press or release at a position.
    Click {
        /// Screen x in pixels.
        x: i32,
        /// Screen y in pixels.
        y: i32,
        /// Which button.
        button: MouseButton,
        /// `true` for press, `false` for release.
        pressed: bool,
        /// Capture time.
        t: f64,
    },
    /// A key press.
    KeyAction {
        /// What to tap or type on replay.
        key: KeySymbol,
        /// Capture time.
        t: f64,
    },
}

impl Event {
    /// Capture time in epoch seconds.
    pub fn timestamp(&self) -> f64 {
        match self {
            Event::Move { t, .. } | Event::Click { t, .. } | Event::KeyAction { t, .. } => *t,
        }
    }

    /// Short kind name, as used in macro files.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Move { .. } => "move",
            Event::Click { .. } => "click",
            Event::KeyAction { .. } => "key",
        }
    }

    /// Check the event can be replayed. `index` is only used for reporting.
    #[track_caller]
    pub fn validate(&self, index: usize) -> CoreResult<()> {
        let reason = match self {
            _ if !self.timestamp().is_finite() => {
                format!("timestamp {} is not finite", self.timestamp())
            }
            Event::Move { x, y, .. } | Event::Click { x, y, .. } if *x < 0 || *y < 0 => {
                format!("negative coordinates ({x}, {y})")
            }
            Event::KeyAction {
                key: KeySymbol::Text(text),
                ..
            } if text.is_empty() => "key text is empty".to_string(),
            _ => return Ok(()),
        };

        Err(MacroError::InvalidEvent {
            index,
            reason,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
