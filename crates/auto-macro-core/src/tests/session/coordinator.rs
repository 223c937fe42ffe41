use crate::{
    InjectorFactory, MacroError,
    event::{Event, KeySymbol, MouseButton, Recording, SpecialKey},
    input::{CapturedInput, InputEvent, InputHub, InputInjector},
    session::{PlaybackScheduler, SessionCoordinator, SessionState, SessionStatus},
    tests::fakes::{Action, ActionLog, FakeInjector, fake_factory},
};

use std::{
    sync::{Arc, Mutex, mpsc},
    time::{Duration, Instant},
};

fn coordinator(hub: &InputHub, log: &ActionLog) -> SessionCoordinator {
    SessionCoordinator::with_options(
        hub.clone(),
        fake_factory(log, Some((50, 60))),
        PlaybackScheduler::new(Duration::from_millis(2)),
        None,
    )
}

#[allow(clippy::unwrap_used)]
fn spaced_moves(count: u32, spacing: f64) -> Recording {
    Recording::new(
        (0..count)
            .map(|i| Event::Move {
                x: i as i32,
                y: 1,
                t: f64::from(i) * spacing,
            })
            .collect(),
    )
    .unwrap()
}

fn key_press(key: KeySymbol) -> CapturedInput {
    CapturedInput::now(InputEvent::KeyPress { key })
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

/// WHAT: Arming while already recording is rejected and changes nothing
/// WHY: A second arm must not reset the buffer and lose events
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_arming_again_then_rejected_and_buffer_kept() {
    // Given: A recording session with one captured key
    let hub = InputHub::new();
    let log = ActionLog::default();
    let coordinator = coordinator(&hub, &log);
    let first = coordinator.start_recording().unwrap();
    hub.publish(key_press(KeySymbol::Text("q".to_string())));

    // When: Arming again
    let result = coordinator.start_recording();

    // Then: Rejected, same session, same buffer, same listeners
    assert!(matches!(
        result,
        Err(MacroError::InvalidTransition {
            current: "recording",
            ..
        })
    ));
    assert!(matches!(
        coordinator.state(),
        SessionState::Recording { session_id, .. } if session_id == first
    ));
    assert_eq!(hub.listener_count(), 3);

    let recording = coordinator.stop_recording().unwrap();
    assert_eq!(recording.len(), 1);
    assert!(coordinator.state().is_idle());
}

/// WHAT: Clicks before any motion use the pointer position probed at arm
/// WHY: The first click of a macro is often made without moving
#[test]
#[allow(clippy::unwrap_used)]
fn given_arm_when_clicking_before_motion_then_probed_position_used() {
    // Given: A fake pointer at (50, 60)
    let hub = InputHub::new();
    let log = ActionLog::default();
    let coordinator = coordinator(&hub, &log);
    coordinator.start_recording().unwrap();

    // When: Clicking right away
    hub.publish(CapturedInput::now(InputEvent::PointerButton {
        button: crate::event::MouseButton::Left,
        pressed: true,
    }));
    let recording = coordinator.stop_recording().unwrap();

    // Then: The click carries the probed position
    assert!(matches!(
        recording.events(),
        [Event::Click { x: 50, y: 60, .. }]
    ));
}

/// WHAT: Stopping a recording that was never started is rejected
/// WHY: Only Recording may transition to Idle by disarm
#[test]
fn given_idle_when_stopping_recording_then_invalid_transition() {
    let hub = InputHub::new();
    let coordinator = coordinator(&hub, &ActionLog::default());

    let result = coordinator.stop_recording();

    assert!(matches!(result, Err(MacroError::InvalidTransition { .. })));
    assert!(coordinator.state().is_idle());
}

/// WHAT: Playing an empty recording is rejected with no side effects
/// WHY: play([]) must leave the engine idle and the devices untouched
#[test]
fn given_empty_recording_when_starting_playback_then_rejected_idle() {
    // Given: An idle coordinator
    let hub = InputHub::new();
    let log = ActionLog::default();
    let coordinator = coordinator(&hub, &log);

    // When: Playing nothing
    let result = coordinator.start_playback(Recording::default());

    // Then: Rejected, idle, no actions
    assert!(matches!(result, Err(MacroError::EmptyRecording { .. })));
    assert!(coordinator.state().is_idle());
    assert_eq!(log.len(), 0);
}

/// WHAT: Playback runs in the background and returns to Idle
/// WHY: The caller must not block for the macro's duration
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_when_playing_then_returns_immediately_and_finishes_idle() {
    // Given: Three moves spanning 300ms
    let hub = InputHub::new();
    let log = ActionLog::default();
    let coordinator = coordinator(&hub, &log);

    // When: Starting playback
    let started = Instant::now();
    let handle = coordinator.start_playback(spaced_moves(3, 0.15)).unwrap();
    let returned_after = started.elapsed();

    // Then: The call returned before the macro finished
    assert!(returned_after < Duration::from_millis(250));
    assert!(matches!(coordinator.state(), SessionState::Playing { .. }));

    let outcome = handle.join().unwrap();
    assert_eq!(outcome.executed, 3);
    assert!(!outcome.cancelled);
    assert!(coordinator.state().is_idle());
    assert_eq!(hub.listener_count(), 0);
}

/// WHAT: Recording or playing again while playing is rejected
/// WHY: Sessions never overlap on the shared devices
#[test]
#[allow(clippy::unwrap_used)]
fn given_playback_when_starting_other_session_then_rejected() {
    // Given: A long playback
    let hub = InputHub::new();
    let log = ActionLog::default();
    let coordinator = coordinator(&hub, &log);
    let handle = coordinator.start_playback(spaced_moves(2, 5.0)).unwrap();

    // When: Starting a recording and a second playback
    let record = coordinator.start_recording();
    let play = coordinator.start_playback(spaced_moves(1, 0.0));

    // Then: Both rejected
    assert!(matches!(record, Err(MacroError::InvalidTransition { .. })));
    assert!(matches!(play, Err(MacroError::InvalidTransition { .. })));

    coordinator.stop_playback();
    handle.join().unwrap();
}

/// WHAT: Stopping mid-playback returns to Idle and skips the rest
/// WHY: Cancellation takes effect within a polling tick
#[test]
#[allow(clippy::unwrap_used)]
fn given_hundred_event_playback_when_stopped_then_idle_and_rest_skipped() {
    // Given: 100 moves spanning about two seconds
    let hub = InputHub::new();
    let log = ActionLog::default();
    let coordinator = coordinator(&hub, &log);
    let handle = coordinator.start_playback(spaced_moves(100, 0.02)).unwrap();
    assert!(wait_until(|| log.len() >= 10));

    // When: Stopping
    coordinator.stop_playback();
    let executed_at_stop = log.len();

    // Then: Idle at once, at most the in-flight event after the stop
    assert!(coordinator.state().is_idle());
    let outcome = handle.join().unwrap();
    assert!(outcome.cancelled);
    assert!(outcome.executed < 100);
    assert!(log.len() <= executed_at_stop + 1);

    // And stopping again is a no-op
    coordinator.stop_playback();
    assert!(coordinator.state().is_idle());
}

/// WHAT: Escape cancels playback and its listener is torn down afterwards
/// WHY: The emergency key must never stay hooked after playback
#[test]
#[allow(clippy::unwrap_used)]
fn given_playback_when_escape_pressed_then_cancelled_and_listener_released() {
    // Given: A long playback with its Escape listener attached
    let hub = InputHub::new();
    let log = ActionLog::default();
    let coordinator = coordinator(&hub, &log);
    let handle = coordinator.start_playback(spaced_moves(2, 30.0)).unwrap();
    assert!(wait_until(|| hub.listener_count() == 1 && log.len() == 1));

    // When: Other keys, then Escape
    hub.publish(key_press(KeySymbol::Text("x".to_string())));
    assert!(matches!(coordinator.state(), SessionState::Playing { .. }));
    hub.publish(key_press(KeySymbol::Special(SpecialKey::Esc)));

    // Then: Cancelled after the first event, nothing left listening
    assert!(coordinator.state().is_idle());
    let outcome = handle.join().unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.executed, 1);
    assert_eq!(hub.listener_count(), 0);
}

/// WHAT: Emergency stop discards a capture and releases its listeners
/// WHY: Any state must be able to fall back to Idle
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_when_emergency_stop_then_idle_and_discarded() {
    // Given: A recording session reporting status
    let hub = InputHub::new();
    let (tx, rx) = mpsc::channel();
    let coordinator = SessionCoordinator::with_options(
        hub.clone(),
        fake_factory(&ActionLog::default(), None),
        PlaybackScheduler::default(),
        Some(tx),
    );
    let session_id = coordinator.start_recording().unwrap();

    // When: Emergency stop, twice
    coordinator.emergency_stop();
    coordinator.emergency_stop();

    // Then: Idle, no listeners, discard reported
    assert!(coordinator.state().is_idle());
    assert_eq!(hub.listener_count(), 0);
    let statuses: Vec<SessionStatus> = rx.try_iter().collect();
    assert_eq!(
        statuses,
        vec![
            SessionStatus::RecordingStarted { session_id },
            SessionStatus::RecordingDiscarded { session_id },
        ]
    );
}

/// WHAT: Playback reports start and finish through the status channel
/// WHY: The tray shows these notifications
#[test]
#[allow(clippy::unwrap_used)]
fn given_status_channel_when_playing_then_started_and_finished_reported() {
    // Given: A coordinator with a status channel
    let hub = InputHub::new();
    let (tx, rx) = mpsc::channel();
    let coordinator = SessionCoordinator::with_options(
        hub,
        fake_factory(&ActionLog::default(), None),
        PlaybackScheduler::default(),
        Some(tx),
    );

    // When: Playing one event to completion
    let handle = coordinator.start_playback(spaced_moves(1, 0.0)).unwrap();
    let session_id = handle.session_id();
    let outcome = handle.join().unwrap();

    // Then: Started then finished with the same outcome
    let statuses: Vec<SessionStatus> = rx.try_iter().collect();
    assert_eq!(
        statuses,
        vec![
            SessionStatus::PlaybackStarted {
                session_id,
                event_count: 1
            },
            SessionStatus::PlaybackFinished {
                session_id,
                outcome
            },
        ]
    );
}

/// Factory whose injector blocks inside its first button action until
/// `resume` receives, signalling `entered` on the way in.
fn blocking_on_first_button(
    log: &ActionLog,
    entered: mpsc::Sender<()>,
    resume: mpsc::Receiver<()>,
) -> InjectorFactory {
    let log = log.clone();
    let entered = Arc::new(Mutex::new(entered));
    let resume = Arc::new(Mutex::new(resume));
    Arc::new(move || {
        let entered = Arc::clone(&entered);
        let resume = Arc::clone(&resume);
        let mut blocked = false;
        let injector = FakeInjector::new(log.clone()).on_action(move |_, action| {
            if blocked || !matches!(action, Action::Button(..)) {
                return;
            }
            blocked = true;
            if let Ok(entered) = entered.lock() {
                let _ = entered.send(());
            }
            if let Ok(resume) = resume.lock() {
                let _ = resume.recv_timeout(Duration::from_secs(5));
            }
        });
        Ok(Box::new(injector) as Box<dyn InputInjector>)
    })
}

/// WHAT: Arming is refused while a stopped playback still drives the devices
/// WHY: The held-button release of a cancelled pass must not be recorded
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_playback_still_releasing_when_arming_then_rejected_until_done() {
    // Given: A playback blocked inside its first button press
    let hub = InputHub::new();
    let log = ActionLog::default();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (resume_tx, resume_rx) = mpsc::channel();
    let coordinator = SessionCoordinator::with_options(
        hub.clone(),
        blocking_on_first_button(&log, entered_tx, resume_rx),
        PlaybackScheduler::new(Duration::from_millis(2)),
        None,
    );
    let recording = Recording::new(vec![
        Event::Click {
            x: 5,
            y: 5,
            button: MouseButton::Left,
            pressed: true,
            t: 0.0,
        },
        Event::Move { x: 9, y: 9, t: 30.0 },
    ])
    .unwrap();
    let handle = coordinator.start_playback(recording).unwrap();
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    // When: Stopping, then arming while the press is still in flight
    coordinator.stop_playback();
    let armed_early = coordinator.start_recording();

    // Then: Idle but refused; the pass releases the button and finishes
    assert!(coordinator.state().is_idle());
    assert!(matches!(
        armed_early,
        Err(MacroError::InvalidTransition {
            current: "stopping playback",
            ..
        })
    ));
    assert_eq!(hub.listener_count(), 1);

    resume_tx.send(()).unwrap();
    let outcome = handle.join().unwrap();
    assert!(outcome.cancelled);
    assert_eq!(
        log.actions().last(),
        Some(&Action::Button(MouseButton::Left, false))
    );

    // And arming works once the devices are free
    coordinator.start_recording().unwrap();
    assert_eq!(coordinator.stop_recording().unwrap().len(), 0);
}
