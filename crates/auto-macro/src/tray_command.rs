use crate::TrayIconState;

/// Commands sent from the async runtime to the main UI thread.
///
/// The main thread owns `TrayManager` (because `TrayIcon` is `!Send`) and the
/// hotkey dispatch table (the OS hotkey manager must stay on the thread that
/// pumps its messages), so tray mutations, shortcut reloads and process
/// lifecycle events flow through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    /// Update the tray icon to a new state.
    SetState(TrayIconState),
    /// Re-read the shortcut file and re-register every user chord.
    ReloadShortcuts,
    /// Shut down the application. The main thread will exit the event loop.
    Shutdown,
}
