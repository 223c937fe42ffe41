use crate::{CoreResult, MacroError};

use std::{collections::BTreeSet, fmt, panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// Modifier keys, declared in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    /// Control.
    Ctrl,
    /// Alt / Option.
    Alt,
    /// Shift.
    Shift,
    /// Super / Command / Windows.
    Super,
}

impl Modifier {
    /// Canonical token.
    pub fn name(&self) -> &'static str {
        match self {
            Modifier::Ctrl => "ctrl",
            Modifier::Alt => "alt",
            Modifier::Shift => "shift",
            Modifier::Super => "super",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" => Some(Modifier::Ctrl),
            "alt" | "option" => Some(Modifier::Alt),
            "shift" => Some(Modifier::Shift),
            "super" | "meta" | "cmd" | "command" | "win" => Some(Modifier::Super),
            _ => None,
        }
    }
}

/// A key combination such as `ctrl+shift+f5`.
///
/// Parsing is case-insensitive and normalizes aliases, so two chords compare
/// equal exactly when they describe the same keys. [`fmt::Display`] yields the
/// canonical form: modifiers in ctrl, alt, shift, super order, then the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord {
    modifiers: BTreeSet<Modifier>,
    key: String,
}

impl Chord {
    /// Parse chord text.
    ///
    /// # Errors
    ///
    /// [`MacroError::InvalidChord`] when the text is empty, ends with `+`,
    /// names an unknown key, or names zero or several non-modifier keys.
    #[track_caller]
    pub fn parse(text: &str) -> CoreResult<Self> {
        let location = ErrorLocation::from(Location::caller());
        Self::parse_tokens(text).map_err(|reason| MacroError::InvalidChord {
            chord: text.to_string(),
            reason,
            location,
        })
    }

    fn parse_tokens(text: &str) -> Result<Self, String> {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return Err("shortcut is empty".to_string());
        }
        if normalized.ends_with('+') {
            return Err("shortcut is incomplete".to_string());
        }

        let mut modifiers = BTreeSet::new();
        let mut key: Option<String> = None;

        for token in normalized.split('+').map(str::trim) {
            if token.is_empty() {
                return Err("empty key between '+' separators".to_string());
            }
            if let Some(modifier) = Modifier::from_token(token) {
                modifiers.insert(modifier);
                continue;
            }
            let name = key_name(token).ok_or_else(|| format!("unknown key {:?}", token))?;
            if let Some(existing) = &key {
                return Err(format!("more than one key ({} and {})", existing, name));
            }
            key = Some(name);
        }

        let key = key.ok_or_else(|| "shortcut has no key besides modifiers".to_string())?;
        Ok(Self { modifiers, key })
    }

    /// Modifiers in canonical order.
    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.modifiers.iter().copied()
    }

    /// The non-modifier key, in canonical spelling.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether `modifier` is part of the chord.
    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

fn key_name(token: &str) -> Option<String> {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let bindable = c.is_ascii_alphanumeric() || "`\\[],=-.';/".contains(c);
        return bindable.then(|| c.to_string());
    }

    if let Some(n) = token.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        return (1..=24).contains(&n).then(|| format!("f{}", n));
    }

    let name = match token {
        "esc" | "escape" => "esc",
        "enter" | "return" => "enter",
        "space" => "space",
        "tab" => "tab",
        "backspace" => "backspace",
        "delete" | "del" => "delete",
        "insert" | "ins" => "insert",
        "home" => "home",
        "end" => "end",
        "pageup" | "page_up" | "pgup" => "pageup",
        "pagedown" | "page_down" | "pgdn" => "pagedown",
        "up" => "up",
        "down" => "down",
        "left" => "left",
        "right" => "right",
        _ => return None,
    };
    Some(name.to_string())
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.name())?;
        }
        f.write_str(&self.key)
    }
}

impl FromStr for Chord {
    type Err = MacroError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        Chord::parse(s)
    }
}
