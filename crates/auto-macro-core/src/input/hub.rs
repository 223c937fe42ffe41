use crate::event::{KeySymbol, MouseButton};

use std::{
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::{error, trace};

/// Input observed on the physical devices, already normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer moved to an absolute position.
    PointerMove {
        /// Screen x in pixels.
        x: f64,
        /// Screen y in pixels.
        y: f64,
    },
    /// Button pressed or released.
    PointerButton {
        /// Which button.
        button: MouseButton,
        /// `true` for press.
        pressed: bool,
    },
    /// Key pressed.
    KeyPress {
        /// Resolved key identity.
        key: KeySymbol,
    },
}

impl InputEvent {
    /// Which listener stream this event belongs to.
    pub fn kind(&self) -> ListenerKind {
        match self {
            InputEvent::PointerMove { .. } => ListenerKind::PointerMove,
            InputEvent::PointerButton { .. } => ListenerKind::PointerButton,
            InputEvent::KeyPress { .. } => ListenerKind::KeyPress,
        }
    }
}

/// An input event with its capture time in epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedInput {
    /// What happened.
    pub event: InputEvent,
    /// When it happened.
    pub time: f64,
}

impl CapturedInput {
    /// Stamp `event` with an explicit capture time.
    pub fn at(event: InputEvent, time: SystemTime) -> Self {
        let time = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self { event, time }
    }

    /// Stamp `event` with the current wall-clock time.
    pub fn now(event: InputEvent) -> Self {
        Self::at(event, SystemTime::now())
    }
}

/// Independent listener streams a subscriber can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Pointer motion.
    PointerMove,
    /// Button presses and releases.
    PointerButton,
    /// Key presses.
    KeyPress,
}

type Callback = Arc<dyn Fn(&CapturedInput) + Send + Sync>;

struct Listener {
    id: u64,
    kind: ListenerKind,
    callback: Callback,
}

#[derive(Default)]
struct HubInner {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

/// Fan-out point between the global OS hook and session-scoped listeners.
///
/// The OS hook is installed once per process and publishes into the hub.
/// Sessions subscribe for as long as they need input and get a
/// [`Subscription`] back; dropping it detaches the listener, whichever thread
/// does the dropping.
#[derive(Clone, Default)]
pub struct InputHub {
    inner: Arc<HubInner>,
}

impl InputHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `callback` to the `kind` stream until the returned guard drops.
    pub fn subscribe<F>(&self, kind: ListenerKind, callback: F) -> Subscription
    where
        F: Fn(&CapturedInput) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        self.lock_listeners().push(Listener {
            id,
            kind,
            callback: Arc::new(callback),
        });

        trace!(listener_id = id, kind = ?kind, "Listener attached");

        Subscription {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `input` to every listener of its kind.
    ///
    /// Callbacks run after the listener list lock is released, so a callback
    /// may drop subscriptions (its own included) without deadlocking.
    pub fn publish(&self, input: CapturedInput) {
        let kind = input.event.kind();
        let callbacks: Vec<Callback> = self
            .lock_listeners()
            .iter()
            .filter(|listener| listener.kind == kind)
            .map(|listener| Arc::clone(&listener.callback))
            .collect();

        for callback in callbacks {
            callback(&input);
        }
    }

    /// Number of attached listeners across all kinds.
    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<Listener>> {
        lock_listeners(&self.inner)
    }
}

fn lock_listeners(inner: &HubInner) -> std::sync::MutexGuard<'_, Vec<Listener>> {
    inner.listeners.lock().unwrap_or_else(|e| {
        error!("Listener list lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}

/// Keeps one listener attached to an [`InputHub`]; detaches it on drop.
#[must_use = "the listener is detached as soon as the subscription is dropped"]
pub struct Subscription {
    id: u64,
    hub: Weak<HubInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            lock_listeners(&inner).retain(|listener| listener.id != self.id);
            trace!(listener_id = self.id, "Listener detached");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
