mod hotkey;
mod session;
