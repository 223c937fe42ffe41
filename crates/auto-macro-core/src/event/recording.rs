use crate::{CoreResult, event::Event};

use std::time::Duration;

/// An ordered sequence of events, the unit of storage and replay.
///
/// A recording is moved, never shared: the recorder hands it out on disarm,
/// the codec hands it out on load, and playback consumes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    events: Vec<Event>,
}

impl Recording {
    /// Build a recording after validating every event.
    #[track_caller]
    pub fn new(events: Vec<Event>) -> CoreResult<Self> {
        for (index, event) in events.iter().enumerate() {
            event.validate(index)?;
        }
        Ok(Self { events })
    }

    /// Events captured by the recorder are validated as they arrive.
    pub(crate) fn from_captured(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Events in recorded order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` when there is nothing to replay.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time between the first and the last event.
    pub fn duration(&self) -> Duration {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => {
                Duration::try_from_secs_f64((last.timestamp() - first.timestamp()).max(0.0))
                    .unwrap_or(Duration::MAX)
            }
            _ => Duration::ZERO,
        }
    }
}
