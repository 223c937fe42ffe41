use crate::{
    event::{Event, Recording},
    input::{CapturedInput, InputEvent, InputHub, ListenerKind, Subscription},
};

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Default)]
struct CaptureBuffer {
    events: Vec<Event>,
    pointer: Option<(i32, i32)>,
    last_time: f64,
}

impl CaptureBuffer {
    /// Clamp so the buffer stays non-decreasing even if two streams race.
    fn stamp(&mut self, time: f64) -> f64 {
        let time = time.max(self.last_time);
        self.last_time = time;
        time
    }

    fn record(&mut self, input: &CapturedInput) {
        match &input.event {
            InputEvent::PointerMove { x, y } => {
                let Some((x, y)) = pixel_position(*x, *y) else {
                    trace!(x, y, "Dropping pointer move outside the replayable area");
                    return;
                };
                self.pointer = Some((x, y));
                let t = self.stamp(input.time);
                self.events.push(Event::Move { x, y, t });
            }
            InputEvent::PointerButton { button, pressed } => {
                let Some((x, y)) = self.pointer else {
                    warn!(button = %button, pressed, "Dropping click, pointer position unknown");
                    return;
                };
                let t = self.stamp(input.time);
                self.events.push(Event::Click {
                    x,
                    y,
                    button: *button,
                    pressed: *pressed,
                    t,
                });
            }
            InputEvent::KeyPress { key } => {
                let t = self.stamp(input.time);
                self.events.push(Event::KeyAction {
                    key: key.clone(),
                    t,
                });
            }
        }
    }
}

fn pixel_position(x: f64, y: f64) -> Option<(i32, i32)> {
    let in_range = |v: f64| v.is_finite() && v >= 0.0 && v <= f64::from(i32::MAX);
    if in_range(x) && in_range(y) {
        Some((x.round() as i32, y.round() as i32))
    } else {
        None
    }
}

/// An armed capture session.
///
/// Holds one subscription per listener stream. The subscriptions are
/// released when the recorder is disarmed or dropped, from any thread.
pub struct Recorder {
    buffer: Arc<Mutex<CaptureBuffer>>,
    subscriptions: Vec<Subscription>,
}

impl Recorder {
    /// Attach to the pointer-move, pointer-button and key-press streams of
    /// `hub` with an empty buffer.
    ///
    /// `pointer` seeds the position used for clicks that arrive before any
    /// pointer motion.
    pub fn arm(hub: &InputHub, pointer: Option<(i32, i32)>) -> Self {
        let buffer = Arc::new(Mutex::new(CaptureBuffer {
            pointer,
            ..CaptureBuffer::default()
        }));

        let subscriptions = [
            ListenerKind::PointerMove,
            ListenerKind::PointerButton,
            ListenerKind::KeyPress,
        ]
        .into_iter()
        .map(|kind| {
            let buffer = Arc::clone(&buffer);
            hub.subscribe(kind, move |input| lock_buffer(&buffer).record(input))
        })
        .collect();

        info!(pointer = ?pointer, "Recorder armed");

        Self {
            buffer,
            subscriptions,
        }
    }

    /// Number of events captured so far.
    pub fn len(&self) -> usize {
        lock_buffer(&self.buffer).events.len()
    }

    /// `true` while nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detach all listeners and hand over the captured events.
    pub fn disarm(self) -> Recording {
        let Self {
            buffer,
            subscriptions,
        } = self;

        // Listeners go first so nothing lands in the buffer after the take.
        drop(subscriptions);

        let events = std::mem::take(&mut lock_buffer(&buffer).events);
        debug!(event_count = events.len(), "Recorder disarmed");

        Recording::from_captured(events)
    }
}

fn lock_buffer(buffer: &Mutex<CaptureBuffer>) -> MutexGuard<'_, CaptureBuffer> {
    buffer.lock().unwrap_or_else(|e| {
        error!("Capture buffer lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}
