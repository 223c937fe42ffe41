//! Process-wide session state machine.
//!
//! ```text
//! Idle --start_recording--> Recording --stop_recording--> Idle
//! Idle --start_playback---> Playing   --finish/cancel---> Idle
//! any  --emergency_stop---> Idle
//! ```
//!
//! Every transition happens under one lock, so "can I start X now" has a
//! single answer. Session-scoped listeners are owned by the session value
//! itself and are released whenever that value is replaced.

use crate::{
    CoreResult, MacroError,
    event::{KeySymbol, Recording, SpecialKey},
    input::{InjectorFactory, InputEvent, InputHub, ListenerKind},
    session::{
        CancelFlag, PlaybackOutcome, PlaybackScheduler, Recorder, SessionState, SessionStatus,
    },
};

use std::{
    panic::Location,
    sync::{Arc, Mutex, MutexGuard, TryLockError, mpsc},
    thread::JoinHandle,
    time::Instant,
};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

enum Session {
    Idle,
    Recording {
        started_at: Instant,
        session_id: Uuid,
        recorder: Recorder,
    },
    Playing {
        started_at: Instant,
        session_id: Uuid,
        cancel: CancelFlag,
    },
}

impl Session {
    fn view(&self) -> SessionState {
        match self {
            Session::Idle => SessionState::Idle,
            Session::Recording {
                started_at,
                session_id,
                ..
            } => SessionState::Recording {
                started_at: *started_at,
                session_id: *session_id,
            },
            Session::Playing {
                started_at,
                session_id,
                ..
            } => SessionState::Playing {
                started_at: *started_at,
                session_id: *session_id,
            },
        }
    }
}

struct Shared {
    session: Mutex<Session>,
    hub: InputHub,
    injector_factory: InjectorFactory,
    scheduler: PlaybackScheduler,
    /// Held by a playback thread for its whole pass, so two passes never
    /// drive the devices at once.
    device: Mutex<()>,
    status_tx: Option<mpsc::Sender<SessionStatus>>,
}

impl Shared {
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| {
            error!("Session lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    fn emit(&self, status: SessionStatus) {
        if let Some(tx) = &self.status_tx {
            // A closed receiver only means nobody is displaying status.
            let _ = tx.send(status);
        }
    }

    /// Cancel `session_id` if it is still the active playback.
    fn cancel_playback(&self, session_id: Uuid) -> bool {
        let mut session = self.lock_session();
        match &*session {
            Session::Playing {
                session_id: active,
                cancel,
                ..
            } if *active == session_id => {
                cancel.raise();
                *session = Session::Idle;
                info!(session_id = %session_id, "Playback cancelled");
                true
            }
            _ => false,
        }
    }

    fn finish_playback(&self, session_id: Uuid, outcome: PlaybackOutcome) {
        {
            let mut session = self.lock_session();
            if matches!(&*session, Session::Playing { session_id: active, .. } if *active == session_id)
            {
                *session = Session::Idle;
            }
        }

        self.emit(SessionStatus::PlaybackFinished {
            session_id,
            outcome,
        });
    }
}

/// Owns the session state and every session-scoped resource.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct SessionCoordinator {
    shared: Arc<Shared>,
}

/// Handle to a running playback thread.
#[derive(Debug)]
pub struct PlaybackHandle {
    session_id: Uuid,
    join: JoinHandle<CoreResult<PlaybackOutcome>>,
}

impl PlaybackHandle {
    /// Session ID of the playback.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Whether the playback thread has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Block until the pass ends.
    #[track_caller]
    pub fn join(self) -> CoreResult<PlaybackOutcome> {
        self.join.join().map_err(|_| MacroError::Injection {
            reason: "Playback thread panicked".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?
    }
}

impl SessionCoordinator {
    /// Coordinator reading input from `hub` and replaying through injectors
    /// built by `injector_factory`.
    pub fn new(hub: InputHub, injector_factory: InjectorFactory) -> Self {
        Self::with_options(hub, injector_factory, PlaybackScheduler::default(), None)
    }

    /// Like [`SessionCoordinator::new`] with an explicit scheduler and an
    /// optional status channel.
    pub fn with_options(
        hub: InputHub,
        injector_factory: InjectorFactory,
        scheduler: PlaybackScheduler,
        status_tx: Option<mpsc::Sender<SessionStatus>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(Session::Idle),
                hub,
                injector_factory,
                scheduler,
                device: Mutex::new(()),
                status_tx,
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.shared.lock_session().view()
    }

    /// Arm the recorder. Only allowed from Idle.
    ///
    /// # Errors
    ///
    /// [`MacroError::InvalidTransition`] when recording or playing, or while
    /// a stopped playback is still releasing the devices; the running
    /// session and its buffer are left untouched.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start_recording(&self) -> CoreResult<Uuid> {
        let mut session = self.shared.lock_session();
        if !matches!(*session, Session::Idle) {
            return Err(MacroError::InvalidTransition {
                current: session.view().name(),
                requested: "start recording",
                location: ErrorLocation::from(Location::caller()),
            });
        }

        // A cancelled playback is Idle at once but may still be finishing
        // its in-flight event or releasing held buttons.
        if let Err(TryLockError::WouldBlock) = self.shared.device.try_lock() {
            debug!("Device lease still held by a stopping playback");
            return Err(MacroError::InvalidTransition {
                current: "stopping playback",
                requested: "start recording",
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let pointer = self.probe_pointer();
        let session_id = Uuid::new_v4();
        *session = Session::Recording {
            started_at: Instant::now(),
            session_id,
            recorder: Recorder::arm(&self.shared.hub, pointer),
        };
        drop(session);

        info!(session_id = %session_id, "Recording started");
        self.shared
            .emit(SessionStatus::RecordingStarted { session_id });

        Ok(session_id)
    }

    /// Disarm the recorder and take the captured events.
    ///
    /// # Errors
    ///
    /// [`MacroError::InvalidTransition`] unless recording.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop_recording(&self) -> CoreResult<Recording> {
        let mut session = self.shared.lock_session();
        match std::mem::replace(&mut *session, Session::Idle) {
            Session::Recording {
                started_at,
                session_id,
                recorder,
            } => {
                drop(session);
                let recording = recorder.disarm();

                info!(
                    session_id = %session_id,
                    event_count = recording.len(),
                    duration_ms = started_at.elapsed().as_millis(),
                    "Recording stopped"
                );
                self.shared.emit(SessionStatus::RecordingStopped {
                    session_id,
                    event_count: recording.len(),
                });

                Ok(recording)
            }
            other => {
                let current = other.view().name();
                *session = other;
                Err(MacroError::InvalidTransition {
                    current,
                    requested: "stop recording",
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Start replaying `recording` on a background thread.
    ///
    /// Returns as soon as the thread is running. While it runs, pressing
    /// Escape cancels it.
    ///
    /// # Errors
    ///
    /// [`MacroError::EmptyRecording`] for an empty recording and
    /// [`MacroError::InvalidTransition`] unless idle; the state is unchanged
    /// in both cases.
    #[track_caller]
    #[instrument(skip(self, recording), fields(event_count = recording.len()))]
    pub fn start_playback(&self, recording: Recording) -> CoreResult<PlaybackHandle> {
        if recording.is_empty() {
            warn!("No events to play");
            return Err(MacroError::EmptyRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut session = self.shared.lock_session();
        if !matches!(*session, Session::Idle) {
            return Err(MacroError::InvalidTransition {
                current: session.view().name(),
                requested: "start playback",
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let session_id = Uuid::new_v4();
        let cancel = CancelFlag::new();
        let event_count = recording.len();

        let shared = Arc::clone(&self.shared);
        let thread_cancel = cancel.clone();
        let join = std::thread::Builder::new()
            .name("macro-playback".to_string())
            .spawn(move || run_playback(shared, session_id, recording, thread_cancel))
            .map_err(|e| MacroError::Injection {
                reason: format!("Failed to spawn playback thread: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        // The thread cannot leave Playing, or report its end, before this
        // lock is released.
        *session = Session::Playing {
            started_at: Instant::now(),
            session_id,
            cancel,
        };
        info!(session_id = %session_id, event_count, "Playback started");
        self.shared.emit(SessionStatus::PlaybackStarted {
            session_id,
            event_count,
        });
        drop(session);

        Ok(PlaybackHandle { session_id, join })
    }

    /// Cancel the running playback. A no-op unless playing.
    #[instrument(skip(self))]
    pub fn stop_playback(&self) {
        let mut session = self.shared.lock_session();
        match &*session {
            Session::Playing {
                session_id, cancel, ..
            } => {
                cancel.raise();
                info!(session_id = %session_id, "Playback stop requested");
                *session = Session::Idle;
            }
            other => debug!(state = other.view().name(), "No playback to stop"),
        }
    }

    /// Force the engine back to Idle from any state.
    ///
    /// An active capture is discarded with its listeners; an active playback
    /// is cancelled.
    #[instrument(skip(self))]
    pub fn emergency_stop(&self) {
        let mut session = self.shared.lock_session();
        match std::mem::replace(&mut *session, Session::Idle) {
            Session::Idle => debug!("Emergency stop while idle"),
            Session::Recording {
                session_id,
                recorder,
                ..
            } => {
                drop(session);
                drop(recorder);
                warn!(session_id = %session_id, "Emergency stop, recording discarded");
                self.shared
                    .emit(SessionStatus::RecordingDiscarded { session_id });
            }
            Session::Playing {
                session_id, cancel, ..
            } => {
                cancel.raise();
                warn!(session_id = %session_id, "Emergency stop, playback cancelled");
            }
        }
    }

    fn probe_pointer(&self) -> Option<(i32, i32)> {
        match (self.shared.injector_factory)().and_then(|injector| injector.pointer_location()) {
            Ok(position) => Some(position),
            Err(e) => {
                debug!(error = %e, "Pointer position unavailable at arm time");
                None
            }
        }
    }
}

fn run_playback(
    shared: Arc<Shared>,
    session_id: Uuid,
    recording: Recording,
    cancel: CancelFlag,
) -> CoreResult<PlaybackOutcome> {
    let lease = shared.device.lock().unwrap_or_else(|e| e.into_inner());

    let result = {
        let escape = {
            let weak = Arc::downgrade(&shared);
            shared.hub.subscribe(ListenerKind::KeyPress, move |input| {
                let is_escape = matches!(
                    &input.event,
                    InputEvent::KeyPress {
                        key: KeySymbol::Special(SpecialKey::Esc)
                    }
                );
                if !is_escape {
                    return;
                }
                if let Some(shared) = weak.upgrade() {
                    warn!(session_id = %session_id, "Escape pressed, stopping playback");
                    shared.cancel_playback(session_id);
                }
            })
        };

        let result = (shared.injector_factory)().and_then(|mut injector| {
            shared
                .scheduler
                .run(recording.events(), injector.as_mut(), &cancel)
        });

        drop(escape);
        result
    };
    drop(lease);

    let outcome = match &result {
        Ok(outcome) => *outcome,
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Playback failed");
            shared.emit(SessionStatus::Error {
                message: e.to_string(),
            });
            PlaybackOutcome {
                executed: 0,
                failed: 0,
                cancelled: cancel.is_raised(),
                elapsed: std::time::Duration::ZERO,
            }
        }
    };

    shared.finish_playback(session_id, outcome);

    result
}
