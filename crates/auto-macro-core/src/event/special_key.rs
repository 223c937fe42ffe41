use std::{fmt, str::FromStr};

macro_rules! special_keys {
    ($($variant:ident => $name:literal,)+) => {
        /// Non-printable keys the engine can capture and replay.
        ///
        /// The canonical names are what gets written to macro files.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SpecialKey {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl SpecialKey {
            /// Every special key, in declaration order.
            pub const ALL: &'static [SpecialKey] = &[$(SpecialKey::$variant,)+];

            /// Canonical name used in macro files.
            pub fn name(self) -> &'static str {
                match self {
                    $(SpecialKey::$variant => $name,)+
                }
            }

            /// Look up a key by its canonical name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(SpecialKey::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

special_keys! {
    Alt => "alt",
    Backspace => "backspace",
    CapsLock => "caps_lock",
    Cmd => "cmd",
    CmdR => "cmd_r",
    Ctrl => "ctrl",
    CtrlR => "ctrl_r",
    Delete => "delete",
    Down => "down",
    End => "end",
    Enter => "enter",
    Esc => "esc",
    F1 => "f1",
    F2 => "f2",
    F3 => "f3",
    F4 => "f4",
    F5 => "f5",
    F6 => "f6",
    F7 => "f7",
    F8 => "f8",
    F9 => "f9",
    F10 => "f10",
    F11 => "f11",
    F12 => "f12",
    Home => "home",
    Insert => "insert",
    Left => "left",
    NumLock => "num_lock",
    PageDown => "page_down",
    PageUp => "page_up",
    Pause => "pause",
    PrintScreen => "print_screen",
    Right => "right",
    ScrollLock => "scroll_lock",
    Shift => "shift",
    ShiftR => "shift_r",
    Space => "space",
    Tab => "tab",
    Up => "up",
}

impl fmt::Display for SpecialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpecialKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpecialKey::from_name(s).ok_or_else(|| format!("unknown special key {s:?}"))
    }
}
