//! OS-level hotkey registration through `global-hotkey`.

use crate::{AppError, AppResult};

use auto_macro_core::{Chord, CoreResult, HotkeyRegistrar, MacroError, Modifier};

use std::{collections::HashMap, panic::Location};

use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyManager,
    hotkey::{Code, HotKey, Modifiers},
};
use tracing::{debug, instrument};

/// [`HotkeyRegistrar`] backed by the platform hotkey manager.
///
/// Must be created and used on a thread with a message pump (the main
/// thread running the `tao` event loop) so that `WM_HOTKEY` messages are
/// dispatched on Windows.
pub struct GlobalHotkeyRegistrar {
    manager: GlobalHotKeyManager,
    hotkeys: HashMap<u32, (HotKey, String)>,
}

impl GlobalHotkeyRegistrar {
    /// Create the platform hotkey manager.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            manager,
            hotkeys: HashMap::new(),
        })
    }
}

impl HotkeyRegistrar for GlobalHotkeyRegistrar {
    #[track_caller]
    fn register(&mut self, chord: &Chord) -> CoreResult<u32> {
        let hotkey = to_hotkey(chord)?;

        self.manager
            .register(hotkey)
            .map_err(|e| MacroError::HotkeyRegistration {
                chord: chord.to_string(),
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let id = hotkey.id();
        self.hotkeys.insert(id, (hotkey, chord.to_string()));
        debug!(chord = %chord, id, "Hotkey registered with OS");

        Ok(id)
    }

    #[track_caller]
    fn unregister(&mut self, id: u32) -> CoreResult<()> {
        let Some((hotkey, chord)) = self.hotkeys.remove(&id) else {
            return Ok(());
        };

        self.manager
            .unregister(hotkey)
            .map_err(|e| MacroError::HotkeyRegistration {
                chord,
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// Translate a parsed chord into the OS hotkey description.
#[track_caller]
pub(crate) fn to_hotkey(chord: &Chord) -> CoreResult<HotKey> {
    let code = key_code(chord.key()).ok_or_else(|| MacroError::HotkeyRegistration {
        chord: chord.to_string(),
        reason: format!("key '{}' has no OS key code", chord.key()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let modifiers = chord
        .modifiers()
        .fold(Modifiers::empty(), |acc, modifier| {
            acc | match modifier {
                Modifier::Ctrl => Modifiers::CONTROL,
                Modifier::Alt => Modifiers::ALT,
                Modifier::Shift => Modifiers::SHIFT,
                Modifier::Super => Modifiers::SUPER,
            }
        });

    Ok(HotKey::new(
        (!modifiers.is_empty()).then_some(modifiers),
        code,
    ))
}

/// Physical key code for a canonical chord key name.
pub(crate) fn key_code(key: &str) -> Option<Code> {
    let code = match key {
        "a" => Code::KeyA,
        "b" => Code::KeyB,
        "c" => Code::KeyC,
        "d" => Code::KeyD,
        "e" => Code::KeyE,
        "f" => Code::KeyF,
        "g" => Code::KeyG,
        "h" => Code::KeyH,
        "i" => Code::KeyI,
        "j" => Code::KeyJ,
        "k" => Code::KeyK,
        "l" => Code::KeyL,
        "m" => Code::KeyM,
        "n" => Code::KeyN,
        "o" => Code::KeyO,
        "p" => Code::KeyP,
        "q" => Code::KeyQ,
        "r" => Code::KeyR,
        "s" => Code::KeyS,
        "t" => Code::KeyT,
        "u" => Code::KeyU,
        "v" => Code::KeyV,
        "w" => Code::KeyW,
        "x" => Code::KeyX,
        "y" => Code::KeyY,
        "z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        "`" => Code::Backquote,
        "\\" => Code::Backslash,
        "[" => Code::BracketLeft,
        "]" => Code::BracketRight,
        "," => Code::Comma,
        "=" => Code::Equal,
        "-" => Code::Minus,
        "." => Code::Period,
        "'" => Code::Quote,
        ";" => Code::Semicolon,
        "/" => Code::Slash,
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,
        "f13" => Code::F13,
        "f14" => Code::F14,
        "f15" => Code::F15,
        "f16" => Code::F16,
        "f17" => Code::F17,
        "f18" => Code::F18,
        "f19" => Code::F19,
        "f20" => Code::F20,
        "f21" => Code::F21,
        "f22" => Code::F22,
        "f23" => Code::F23,
        "f24" => Code::F24,
        "esc" => Code::Escape,
        "enter" => Code::Enter,
        "space" => Code::Space,
        "tab" => Code::Tab,
        "backspace" => Code::Backspace,
        "delete" => Code::Delete,
        "insert" => Code::Insert,
        "home" => Code::Home,
        "end" => Code::End,
        "pageup" => Code::PageUp,
        "pagedown" => Code::PageDown,
        "up" => Code::ArrowUp,
        "down" => Code::ArrowDown,
        "left" => Code::ArrowLeft,
        "right" => Code::ArrowRight,
        _ => return None,
    };
    Some(code)
}
