//! Chord-to-macro dispatch on top of an OS hotkey layer.
//!
//! The OS layer is reached through [`HotkeyRegistrar`]; it hands out a
//! numeric id per registered chord and later reports presses by that id.
//! [`HotkeyRoutes`] maps those ids back to actions and may be shared with
//! whichever thread receives the presses.
//!
//! Refresh is always total: every tracked handle is unregistered before the
//! table is registered again, so no stale or duplicate handle survives an
//! edit.

use crate::{
    CoreResult, MacroError,
    hotkey::{Chord, ShortcutBinding, ShortcutTable},
};

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use tracing::{debug, error, info, instrument, warn};

/// OS-level global hotkey registration.
pub trait HotkeyRegistrar {
    /// Claim `chord` system-wide and return the id its presses will carry.
    ///
    /// # Errors
    ///
    /// [`MacroError::HotkeyRegistration`] if the OS refuses the chord.
    fn register(&mut self, chord: &Chord) -> CoreResult<u32>;

    /// Release a handle returned by [`HotkeyRegistrar::register`].
    ///
    /// # Errors
    ///
    /// [`MacroError::HotkeyRegistration`] if the OS refuses.
    fn unregister(&mut self, id: u32) -> CoreResult<()>;
}

/// Action run when a bound chord is pressed.
pub type HotkeyAction = Arc<dyn Fn() + Send + Sync>;

/// Builds the action for a binding, given the resolved macro path.
pub type ActionFactory = Box<dyn Fn(&ShortcutBinding, &Path) -> HotkeyAction + Send>;

struct Route {
    chord: String,
    action: HotkeyAction,
}

/// Shared map from registered hotkey id to its action.
#[derive(Clone, Default)]
pub struct HotkeyRoutes {
    routes: Arc<RwLock<HashMap<u32, Route>>>,
}

impl HotkeyRoutes {
    /// Run the action registered under `id`.
    ///
    /// Returns `false` if no route exists, e.g. because a refresh removed it
    /// after the press was queued. The action runs without any lock held.
    pub fn dispatch(&self, id: u32) -> bool {
        let route = {
            let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
            routes
                .get(&id)
                .map(|route| (route.chord.clone(), Arc::clone(&route.action)))
        };

        match route {
            Some((chord, action)) => {
                debug!(id, chord = %chord, "Dispatching hotkey");
                action();
                true
            }
            None => {
                debug!(id, "No route for hotkey");
                false
            }
        }
    }

    /// Chord routed under `id`.
    pub fn chord(&self, id: u32) -> Option<String> {
        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        routes.get(&id).map(|route| route.chord.clone())
    }

    /// Number of live routes.
    pub fn len(&self) -> usize {
        self.routes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no route is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn replace(&self, routes: HashMap<u32, Route>) {
        *self.routes.write().unwrap_or_else(|e| e.into_inner()) = routes;
    }
}

impl fmt::Debug for HotkeyRoutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyRoutes")
            .field("len", &self.len())
            .finish()
    }
}

/// A chord currently held with the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredHotkey {
    /// Id reported by the registrar.
    pub id: u32,
    /// Registered chord.
    pub chord: Chord,
    /// Macro file it plays.
    pub recording_path: PathBuf,
}

/// Result of one registration pass.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Canonical chords now registered.
    pub registered: Vec<String>,
    /// Chords that were skipped, with the reason.
    pub failures: Vec<(String, MacroError)>,
}

impl RegistrationReport {
    /// `true` if every chord registered.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The user shortcut table plus the OS handles registered for it.
pub struct HotkeyDispatchTable<R: HotkeyRegistrar> {
    table: ShortcutTable,
    registrar: R,
    registered: Vec<RegisteredHotkey>,
    routes: HotkeyRoutes,
    action_factory: ActionFactory,
}

impl<R: HotkeyRegistrar> HotkeyDispatchTable<R> {
    /// Take ownership of `table` and `registrar`. Nothing is registered
    /// until [`HotkeyDispatchTable::register_all`].
    pub fn new(table: ShortcutTable, registrar: R, action_factory: ActionFactory) -> Self {
        Self {
            table,
            registrar,
            registered: Vec::new(),
            routes: HotkeyRoutes::default(),
            action_factory,
        }
    }

    /// Routes handle for the thread that receives hotkey presses.
    pub fn routes(&self) -> HotkeyRoutes {
        self.routes.clone()
    }

    /// All bindings in table order.
    pub fn list_all(&self) -> &[ShortcutBinding] {
        self.table.bindings()
    }

    /// Handles currently held with the OS.
    pub fn registered(&self) -> &[RegisteredHotkey] {
        &self.registered
    }

    /// Unregister every tracked handle, then register every binding.
    ///
    /// A chord that does not parse or that the OS refuses is logged, listed
    /// in the report and skipped; the rest still register.
    #[instrument(skip(self), fields(bindings = self.table.len()))]
    pub fn register_all(&mut self) -> RegistrationReport {
        self.unregister_all();

        let mut report = RegistrationReport::default();
        let mut routes = HashMap::new();

        for binding in self.table.bindings() {
            let registered = Chord::parse(&binding.chord).and_then(|chord| {
                let id = self.registrar.register(&chord)?;
                Ok((id, chord))
            });

            match registered {
                Ok((id, chord)) => {
                    let recording_path = self.table.resolve(binding);
                    let action = (self.action_factory)(binding, &recording_path);
                    routes.insert(
                        id,
                        Route {
                            chord: chord.to_string(),
                            action,
                        },
                    );
                    debug!(id, chord = %chord, path = ?recording_path, "Hotkey registered");
                    report.registered.push(chord.to_string());
                    self.registered.push(RegisteredHotkey {
                        id,
                        chord,
                        recording_path,
                    });
                }
                Err(e) => {
                    warn!(chord = %binding.chord, error = %e, "Skipping shortcut");
                    report.failures.push((binding.chord.clone(), e));
                }
            }
        }

        self.routes.replace(routes);

        info!(
            registered = report.registered.len(),
            failed = report.failures.len(),
            "Shortcuts registered"
        );

        report
    }

    /// Release every tracked handle and clear the routes.
    pub fn unregister_all(&mut self) {
        self.routes.replace(HashMap::new());
        for hotkey in self.registered.drain(..) {
            if let Err(e) = self.registrar.unregister(hotkey.id) {
                error!(id = hotkey.id, chord = %hotkey.chord, error = %e, "Failed to unregister hotkey");
            }
        }
    }

    /// Add a binding, persist it and refresh all registrations.
    ///
    /// # Errors
    ///
    /// Errors of [`ShortcutTable::add`]; registrations are untouched then.
    #[track_caller]
    pub fn add(&mut self, chord: &str, file: &str) -> CoreResult<RegistrationReport> {
        self.table.add(chord, file)?;
        Ok(self.register_all())
    }

    /// Remove the binding at `index`, persist and refresh all registrations.
    ///
    /// # Errors
    ///
    /// Errors of [`ShortcutTable::remove`]; registrations are untouched then.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> CoreResult<RegistrationReport> {
        self.table.remove(index)?;
        Ok(self.register_all())
    }

    /// Re-read the shortcut file and refresh all registrations.
    ///
    /// # Errors
    ///
    /// Errors of [`ShortcutTable::reload`]; registrations are untouched then.
    #[track_caller]
    pub fn reload(&mut self) -> CoreResult<RegistrationReport> {
        self.table.reload()?;
        Ok(self.register_all())
    }
}

impl<R: HotkeyRegistrar> Drop for HotkeyDispatchTable<R> {
    fn drop(&mut self) {
        self.unregister_all();
    }
}

/// What a fixed hotkey does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedAction {
    /// Arm the recorder.
    StartRecording,
    /// Disarm the recorder.
    StopRecording,
}

/// The permanent start/stop recording chords.
///
/// Registered once at start-up and never touched by
/// [`HotkeyDispatchTable::register_all`].
#[derive(Debug, Clone, Default)]
pub struct FixedHotkeys {
    ids: HashMap<u32, FixedAction>,
    chords: Vec<Chord>,
}

impl FixedHotkeys {
    /// Register `start` and `stop` through `registrar`.
    ///
    /// A chord the OS refuses is logged and listed in the report; the other
    /// one still registers. Both chords are reserved either way.
    #[instrument(skip(registrar), fields(start = %start, stop = %stop))]
    pub fn register<R: HotkeyRegistrar>(
        registrar: &mut R,
        start: Chord,
        stop: Chord,
    ) -> (Self, RegistrationReport) {
        let mut fixed = Self::default();
        let mut report = RegistrationReport::default();

        for (chord, action) in [
            (start, FixedAction::StartRecording),
            (stop, FixedAction::StopRecording),
        ] {
            match registrar.register(&chord) {
                Ok(id) => {
                    debug!(id, chord = %chord, ?action, "Fixed hotkey registered");
                    fixed.ids.insert(id, action);
                    report.registered.push(chord.to_string());
                }
                Err(e) => {
                    error!(chord = %chord, error = %e, "Failed to register fixed hotkey");
                    report.failures.push((chord.to_string(), e));
                }
            }
            fixed.chords.push(chord);
        }

        (fixed, report)
    }

    /// Action bound to `id`, if it is one of the fixed hotkeys.
    pub fn action(&self, id: u32) -> Option<FixedAction> {
        self.ids.get(&id).copied()
    }

    /// Chords reserved by the fixed hotkeys.
    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }
}
