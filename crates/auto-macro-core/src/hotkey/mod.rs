mod chord;
mod dispatch;
mod table;

pub use {
    chord::{Chord, Modifier},
    dispatch::{
        ActionFactory, FixedAction, FixedHotkeys, HotkeyAction, HotkeyDispatchTable,
        HotkeyRegistrar, HotkeyRoutes, RegisteredHotkey, RegistrationReport,
    },
    table::{SHORTCUTS_FILE, ShortcutBinding, ShortcutTable},
};
