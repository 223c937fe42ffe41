//! Auto-macro Core Library
//!
//! Records desktop mouse and keyboard input with its timing, persists it as
//! `.macro` files and replays it, optionally on a global hotkey. Capture goes
//! through `rdev`, replay through `enigo`.
//!
//! # Example
//!
//! ```no_run
//! use auto_macro_core::{CoreResult, EnigoInjector, InputHub, RdevHook, SessionCoordinator, codec};
//!
//! use std::{path::Path, thread::sleep, time::Duration};
//!
//! fn main() -> CoreResult<()> {
//!     let hub = InputHub::new();
//!     RdevHook::install(hub.clone())?;
//!     let coordinator = SessionCoordinator::new(hub, EnigoInjector::factory());
//!
//!     coordinator.start_recording()?;
//!     sleep(Duration::from_secs(5));
//!     let recording = coordinator.stop_recording()?;
//!
//!     codec::save(&recording, Path::new("demo.macro"))?;
//!     let outcome = coordinator.start_playback(recording)?.join()?;
//!
//!     println!("Replayed {} events", outcome.executed);
//!     Ok(())
//! }
//! ```

pub mod codec;
mod error;
mod event;
mod hotkey;
mod input;
mod session;

pub use {
    error::{ErrorCategory, MacroError, Result as CoreResult},
    event::{Event, KeySymbol, MouseButton, Recording, SpecialKey},
    hotkey::{
        ActionFactory, Chord, FixedAction, FixedHotkeys, HotkeyAction, HotkeyDispatchTable,
        HotkeyRegistrar, HotkeyRoutes, Modifier, RegisteredHotkey, RegistrationReport,
        SHORTCUTS_FILE, ShortcutBinding, ShortcutTable,
    },
    input::{
        CapturedInput, EnigoInjector, InjectorFactory, InputEvent, InputHub, InputInjector,
        ListenerKind, RdevHook, Subscription,
    },
    session::{
        CancelFlag, DEFAULT_POLL_INTERVAL, PlaybackHandle, PlaybackOutcome, PlaybackScheduler,
        Recorder, SessionCoordinator, SessionState, SessionStatus, schedule_offsets,
    },
};

#[cfg(test)]
mod tests;
