//! Timing-faithful replay of a recording.
//!
//! Delays between events are rebuilt from the recorded timestamps and turned
//! into absolute offsets from the start of playback, so the time spent
//! injecting one event does not push every later event back.

use crate::{
    CoreResult, MacroError,
    event::{Event, KeySymbol, MouseButton},
    input::InputInjector,
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Default cancellation polling tick.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shared stop request for one playback pass.
///
/// Raising it is idempotent and visible to the playback thread within one
/// polling tick.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that has not been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Sleep until `deadline` in slices of `tick`.
    ///
    /// Returns `false` as soon as the flag is seen raised.
    pub fn sleep_until(&self, deadline: Instant, tick: Duration) -> bool {
        loop {
            if self.is_raised() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(tick));
        }
    }
}

/// How a playback pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOutcome {
    /// Events handed to the injector.
    pub executed: usize,
    /// Executed events whose injection failed and was skipped.
    pub failed: usize,
    /// Whether the pass stopped early on a cancel request.
    pub cancelled: bool,
    /// Wall time of the pass.
    pub elapsed: Duration,
}

/// Offset of every event from the start of playback.
///
/// Backwards or equal timestamps contribute no delay.
pub fn schedule_offsets(events: &[Event]) -> Vec<Duration> {
    let mut offsets = Vec::with_capacity(events.len());
    let mut total = Duration::ZERO;
    let mut base = events.first().map(Event::timestamp).unwrap_or_default();

    for event in events {
        let t = event.timestamp();
        let delay = t - base;
        if delay.is_finite() && delay > 0.0 {
            total = total.saturating_add(
                Duration::try_from_secs_f64(delay).unwrap_or(Duration::MAX),
            );
        }
        base = t;
        offsets.push(total);
    }

    offsets
}

/// Replays events against an [`InputInjector`].
#[derive(Debug, Clone, Copy)]
pub struct PlaybackScheduler {
    poll_interval: Duration,
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl PlaybackScheduler {
    /// Scheduler that checks for cancellation every `poll_interval`.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Run one linear pass over `events`, blocking the calling thread.
    ///
    /// Injection failures of single events are logged and skipped. Any
    /// button still held when the pass ends is released.
    ///
    /// # Errors
    ///
    /// [`MacroError::EmptyRecording`] if `events` is empty; nothing is
    /// injected in that case.
    #[track_caller]
    #[instrument(skip(self, events, injector, cancel), fields(event_count = events.len()))]
    pub fn run(
        &self,
        events: &[Event],
        injector: &mut dyn InputInjector,
        cancel: &CancelFlag,
    ) -> CoreResult<PlaybackOutcome> {
        if events.is_empty() {
            warn!("No events to play");
            return Err(MacroError::EmptyRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let offsets = schedule_offsets(events);
        let start = Instant::now();
        let mut held = HeldButtons::new(injector);
        let mut executed = 0;
        let mut failed = 0;
        let mut cancelled = false;

        for (index, (event, offset)) in events.iter().zip(offsets).enumerate() {
            let Some(deadline) = start.checked_add(offset) else {
                warn!(index, "Delay exceeds the clock range, stopping playback");
                cancelled = true;
                break;
            };

            if !cancel.sleep_until(deadline, self.poll_interval) {
                cancelled = true;
                break;
            }

            executed += 1;
            if let Err(e) = held.inject(event) {
                failed += 1;
                warn!(index, kind = event.kind(), error = %e, "Skipping event that failed to inject");
            }
        }

        drop(held);

        let outcome = PlaybackOutcome {
            executed,
            failed,
            cancelled,
            elapsed: start.elapsed(),
        };

        if cancelled {
            info!(executed, total = events.len(), "Playback cancelled");
        } else {
            info!(
                executed,
                failed,
                duration_ms = outcome.elapsed.as_millis(),
                "Playback finished"
            );
        }

        Ok(outcome)
    }
}

/// Routes events to the injector and releases, on drop, every button that
/// was pressed during the pass and not released by the recording.
///
/// Release on drop is best effort; a failure is only logged.
struct HeldButtons<'a> {
    injector: &'a mut dyn InputInjector,
    held: Vec<MouseButton>,
}

impl<'a> HeldButtons<'a> {
    fn new(injector: &'a mut dyn InputInjector) -> Self {
        Self {
            injector,
            held: Vec::new(),
        }
    }

    fn inject(&mut self, event: &Event) -> CoreResult<()> {
        match event {
            Event::Move { x, y, .. } => self.injector.move_pointer(*x, *y),
            Event::Click {
                x,
                y,
                button,
                pressed,
                ..
            } => {
                self.injector.move_pointer(*x, *y)?;
                self.injector.button(*button, *pressed)?;
                if *pressed {
                    self.held.push(*button);
                } else {
                    self.held.retain(|held| held != button);
                }
                Ok(())
            }
            Event::KeyAction {
                key: KeySymbol::Special(key),
                ..
            } => self.injector.tap_key(*key),
            Event::KeyAction {
                key: KeySymbol::Text(text),
                ..
            } => self.injector.type_text(text),
        }
    }
}

impl Drop for HeldButtons<'_> {
    fn drop(&mut self) {
        for button in std::mem::take(&mut self.held) {
            match self.injector.button(button, false) {
                Ok(()) => debug!(button = %button, "Released held button"),
                Err(e) => warn!(button = %button, error = %e, "Failed to release held button"),
            }
        }
    }
}
