use crate::{
    CoreResult, MacroError,
    event::{MouseButton, SpecialKey},
};

use std::sync::Arc;

use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use tracing::debug;

/// Write access to the pointer and keyboard.
///
/// Not `Send`: implementations are built on the thread that uses them,
/// through an [`InjectorFactory`].
pub trait InputInjector {
    /// Move the pointer to absolute screen coordinates.
    fn move_pointer(&mut self, x: i32, y: i32) -> CoreResult<()>;

    /// Press or release a mouse button at the current position.
    fn button(&mut self, button: MouseButton, pressed: bool) -> CoreResult<()>;

    /// Press then release a named key.
    fn tap_key(&mut self, key: SpecialKey) -> CoreResult<()>;

    /// Type literal text.
    fn type_text(&mut self, text: &str) -> CoreResult<()>;

    /// Current pointer position.
    fn pointer_location(&self) -> CoreResult<(i32, i32)>;
}

/// Builds an injector on the calling thread.
pub type InjectorFactory = Arc<dyn Fn() -> CoreResult<Box<dyn InputInjector>> + Send + Sync>;

/// [`InputInjector`] backed by `enigo`.
pub struct EnigoInjector {
    enigo: Enigo,
}

impl EnigoInjector {
    /// Connect to the platform input layer.
    #[track_caller]
    pub fn new() -> CoreResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| MacroError::injection(format!("Failed to create Enigo: {}", e)))?;

        debug!("Enigo injector created");

        Ok(Self { enigo })
    }

    /// Factory producing a fresh `EnigoInjector` per call.
    pub fn factory() -> InjectorFactory {
        Arc::new(|| Ok(Box::new(EnigoInjector::new()?) as Box<dyn InputInjector>))
    }
}

impl InputInjector for EnigoInjector {
    #[track_caller]
    fn move_pointer(&mut self, x: i32, y: i32) -> CoreResult<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| MacroError::injection(format!("Failed to move pointer: {}", e)))
    }

    #[track_caller]
    fn button(&mut self, button: MouseButton, pressed: bool) -> CoreResult<()> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        };
        let direction = if pressed {
            Direction::Press
        } else {
            Direction::Release
        };

        self.enigo.button(button, direction).map_err(|e| {
            MacroError::injection(format!("Failed to send {:?} {:?}: {}", button, direction, e))
        })
    }

    #[track_caller]
    fn tap_key(&mut self, key: SpecialKey) -> CoreResult<()> {
        let enigo_key = enigo_key(key).ok_or_else(|| {
            MacroError::injection(format!("Key {key} cannot be simulated on this platform"))
        })?;

        self.enigo
            .key(enigo_key, Direction::Click)
            .map_err(|e| MacroError::injection(format!("Failed to tap {key}: {}", e)))
    }

    #[track_caller]
    fn type_text(&mut self, text: &str) -> CoreResult<()> {
        self.enigo
            .text(text)
            .map_err(|e| MacroError::injection(format!("Failed to type {text:?}: {}", e)))
    }

    #[track_caller]
    fn pointer_location(&self) -> CoreResult<(i32, i32)> {
        self.enigo
            .location()
            .map_err(|e| MacroError::injection(format!("Failed to read pointer location: {}", e)))
    }
}

fn enigo_key(key: SpecialKey) -> Option<Key> {
    let key = match key {
        SpecialKey::Alt => Key::Alt,
        SpecialKey::Backspace => Key::Backspace,
        SpecialKey::CapsLock => Key::CapsLock,
        SpecialKey::Cmd | SpecialKey::CmdR => Key::Meta,
        SpecialKey::Ctrl | SpecialKey::CtrlR => Key::Control,
        SpecialKey::Delete => Key::Delete,
        SpecialKey::Down => Key::DownArrow,
        SpecialKey::End => Key::End,
        SpecialKey::Enter => Key::Return,
        SpecialKey::Esc => Key::Escape,
        SpecialKey::F1 => Key::F1,
        SpecialKey::F2 => Key::F2,
        SpecialKey::F3 => Key::F3,
        SpecialKey::F4 => Key::F4,
        SpecialKey::F5 => Key::F5,
        SpecialKey::F6 => Key::F6,
        SpecialKey::F7 => Key::F7,
        SpecialKey::F8 => Key::F8,
        SpecialKey::F9 => Key::F9,
        SpecialKey::F10 => Key::F10,
        SpecialKey::F11 => Key::F11,
        SpecialKey::F12 => Key::F12,
        SpecialKey::Home => Key::Home,
        SpecialKey::Left => Key::LeftArrow,
        SpecialKey::PageDown => Key::PageDown,
        SpecialKey::PageUp => Key::PageUp,
        SpecialKey::Right => Key::RightArrow,
        SpecialKey::Shift | SpecialKey::ShiftR => Key::Shift,
        SpecialKey::Space => Key::Space,
        SpecialKey::Tab => Key::Tab,
        SpecialKey::Up => Key::UpArrow,
        SpecialKey::Insert
        | SpecialKey::NumLock
        | SpecialKey::Pause
        | SpecialKey::PrintScreen
        | SpecialKey::ScrollLock => Key::Other(platform_keycode(key)?),
    };
    Some(key)
}

/// Raw keycodes for keys enigo has no portable variant for.
#[cfg(target_os = "windows")]
fn platform_keycode(key: SpecialKey) -> Option<u32> {
    // Virtual-key codes.
    match key {
        SpecialKey::Insert => Some(0x2D),
        SpecialKey::NumLock => Some(0x90),
        SpecialKey::Pause => Some(0x13),
        SpecialKey::PrintScreen => Some(0x2C),
        SpecialKey::ScrollLock => Some(0x91),
        _ => None,
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn platform_keycode(key: SpecialKey) -> Option<u32> {
    // X11 keysyms.
    match key {
        SpecialKey::Insert => Some(0xff63),
        SpecialKey::NumLock => Some(0xff7f),
        SpecialKey::Pause => Some(0xff13),
        SpecialKey::PrintScreen => Some(0xff61),
        SpecialKey::ScrollLock => Some(0xff14),
        _ => None,
    }
}

#[cfg(not(any(target_os = "windows", all(unix, not(target_os = "macos")))))]
fn platform_keycode(_key: SpecialKey) -> Option<u32> {
    None
}
