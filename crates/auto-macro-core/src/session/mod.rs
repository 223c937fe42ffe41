mod coordinator;
mod recorder;
mod scheduler;
mod state;

pub use {
    coordinator::{PlaybackHandle, SessionCoordinator},
    recorder::Recorder,
    scheduler::{
        CancelFlag, DEFAULT_POLL_INTERVAL, PlaybackOutcome, PlaybackScheduler, schedule_offsets,
    },
    state::{SessionState, SessionStatus},
};
