use crate::{
    CoreResult, MacroError,
    event::{KeySymbol, MouseButton, SpecialKey},
    input::{CapturedInput, InputEvent, InputHub},
};

use std::{
    panic::Location,
    sync::atomic::{AtomicBool, Ordering},
    thread::JoinHandle,
};

use error_location::ErrorLocation;
use rdev::{Button, EventType, Key};
use tracing::{error, info, instrument};

static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Process-wide OS input hook backed by `rdev::listen`.
///
/// `rdev::listen` never returns while the hook is healthy, so it gets its own
/// thread and is installed at most once per process. Session-scoped listeners
/// attach to the [`InputHub`] instead of to the OS.
pub struct RdevHook;

impl RdevHook {
    /// Start the hook thread, publishing normalized input into `hub`.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::Listener`] if a hook is already installed or the
    /// thread cannot be spawned.
    #[track_caller]
    #[instrument(skip(hub))]
    pub fn install(hub: InputHub) -> CoreResult<JoinHandle<()>> {
        if HOOK_INSTALLED.swap(true, Ordering::AcqRel) {
            return Err(MacroError::Listener {
                reason: "Global input hook is already installed".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let handle = std::thread::Builder::new()
            .name("input-hook".to_string())
            .spawn(move || {
                info!("Global input hook started");
                let result = rdev::listen(move |event| {
                    if let Some(input) = normalize(&event) {
                        hub.publish(input);
                    }
                });
                if let Err(e) = result {
                    error!(error = ?e, "Global input hook stopped");
                }
                HOOK_INSTALLED.store(false, Ordering::Release);
            })
            .map_err(|e| {
                HOOK_INSTALLED.store(false, Ordering::Release);
                MacroError::Listener {
                    reason: format!("Failed to spawn input hook thread: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

        Ok(handle)
    }
}

/// Turn an OS event into engine input; `None` for events the model ignores.
pub(crate) fn normalize(event: &rdev::Event) -> Option<CapturedInput> {
    let input = match event.event_type {
        EventType::MouseMove { x, y } => InputEvent::PointerMove { x, y },
        EventType::ButtonPress(button) => InputEvent::PointerButton {
            button: mouse_button(button)?,
            pressed: true,
        },
        EventType::ButtonRelease(button) => InputEvent::PointerButton {
            button: mouse_button(button)?,
            pressed: false,
        },
        EventType::KeyPress(key) => InputEvent::KeyPress {
            key: key_symbol(key, event.name.as_deref())?,
        },
        EventType::KeyRelease(_) | EventType::Wheel { .. } => return None,
    };

    Some(CapturedInput::at(input, event.time))
}

fn mouse_button(button: Button) -> Option<MouseButton> {
    match button {
        Button::Left => Some(MouseButton::Left),
        Button::Right => Some(MouseButton::Right),
        Button::Middle => Some(MouseButton::Middle),
        Button::Unknown(_) => None,
    }
}

/// Special keys win over whatever text the OS reports for them (Escape
/// reports `"\u{1b}"` on some platforms); anything else must carry printable
/// text.
fn key_symbol(key: Key, name: Option<&str>) -> Option<KeySymbol> {
    if let Some(special) = special_key(key) {
        return Some(KeySymbol::Special(special));
    }

    name.filter(|text| !text.is_empty() && !text.chars().any(char::is_control))
        .map(|text| KeySymbol::Text(text.to_string()))
}

fn special_key(key: Key) -> Option<SpecialKey> {
    let special = match key {
        Key::Alt | Key::AltGr => SpecialKey::Alt,
        Key::Backspace => SpecialKey::Backspace,
        Key::CapsLock => SpecialKey::CapsLock,
        Key::MetaLeft => SpecialKey::Cmd,
        Key::MetaRight => SpecialKey::CmdR,
        Key::ControlLeft => SpecialKey::Ctrl,
        Key::ControlRight => SpecialKey::CtrlR,
        Key::Delete => SpecialKey::Delete,
        Key::DownArrow => SpecialKey::Down,
        Key::End => SpecialKey::End,
        Key::Return => SpecialKey::Enter,
        Key::Escape => SpecialKey::Esc,
        Key::F1 => SpecialKey::F1,
        Key::F2 => SpecialKey::F2,
        Key::F3 => SpecialKey::F3,
        Key::F4 => SpecialKey::F4,
        Key::F5 => SpecialKey::F5,
        Key::F6 => SpecialKey::F6,
        Key::F7 => SpecialKey::F7,
        Key::F8 => SpecialKey::F8,
        Key::F9 => SpecialKey::F9,
        Key::F10 => SpecialKey::F10,
        Key::F11 => SpecialKey::F11,
        Key::F12 => SpecialKey::F12,
        Key::Home => SpecialKey::Home,
        Key::Insert => SpecialKey::Insert,
        Key::LeftArrow => SpecialKey::Left,
        Key::NumLock => SpecialKey::NumLock,
        Key::PageDown => SpecialKey::PageDown,
        Key::PageUp => SpecialKey::PageUp,
        Key::Pause => SpecialKey::Pause,
        Key::PrintScreen => SpecialKey::PrintScreen,
        Key::RightArrow => SpecialKey::Right,
        Key::ScrollLock => SpecialKey::ScrollLock,
        Key::ShiftLeft => SpecialKey::Shift,
        Key::ShiftRight => SpecialKey::ShiftR,
        Key::Space => SpecialKey::Space,
        Key::Tab => SpecialKey::Tab,
        Key::UpArrow => SpecialKey::Up,
        _ => return None,
    };
    Some(special)
}
