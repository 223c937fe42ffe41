use crate::{
    event::{Event, KeySymbol, MouseButton, SpecialKey},
    input::{CapturedInput, InputEvent, InputHub},
    session::Recorder,
};

fn input(event: InputEvent, time: f64) -> CapturedInput {
    CapturedInput { event, time }
}

/// WHAT: All three streams feed one ordered buffer
/// WHY: Moves, clicks and keys interleave in a real macro
#[test]
fn given_armed_recorder_when_input_arrives_then_events_captured_in_order() {
    // Given: An armed recorder
    let hub = InputHub::new();
    let recorder = Recorder::arm(&hub, None);

    // When: Moving, clicking and typing
    hub.publish(input(InputEvent::PointerMove { x: 10.4, y: 20.6 }, 1.0));
    hub.publish(input(
        InputEvent::PointerButton {
            button: MouseButton::Left,
            pressed: true,
        },
        1.1,
    ));
    hub.publish(input(
        InputEvent::KeyPress {
            key: KeySymbol::Special(SpecialKey::Enter),
        },
        1.2,
    ));
    let recording = recorder.disarm();

    // Then: Rounded positions, click at the last pointer position
    assert_eq!(
        recording.events(),
        &[
            Event::Move { x: 10, y: 21, t: 1.0 },
            Event::Click {
                x: 10,
                y: 21,
                button: MouseButton::Left,
                pressed: true,
                t: 1.1,
            },
            Event::KeyAction {
                key: KeySymbol::Special(SpecialKey::Enter),
                t: 1.2,
            },
        ]
    );
}

/// WHAT: Disarming detaches every listener
/// WHY: No capture stream may outlive the session
#[test]
fn given_armed_recorder_when_disarmed_then_no_listeners_remain() {
    // Given: An armed recorder holding three listeners
    let hub = InputHub::new();
    let recorder = Recorder::arm(&hub, None);
    assert_eq!(hub.listener_count(), 3);

    // When: Disarming, then publishing more input
    let recording = recorder.disarm();
    hub.publish(input(InputEvent::PointerMove { x: 1.0, y: 1.0 }, 5.0));

    // Then: Nothing listens and the buffer is unaffected
    assert_eq!(hub.listener_count(), 0);
    assert!(recording.is_empty());
}

/// WHAT: Clicks without a known position are dropped, seeded ones are kept
/// WHY: A click event must carry coordinates
#[test]
fn given_pointer_seed_when_clicking_before_motion_then_seed_used() {
    // Given: One recorder without and one with a seeded position
    let hub = InputHub::new();
    let click = input(
        InputEvent::PointerButton {
            button: MouseButton::Right,
            pressed: false,
        },
        2.0,
    );

    // When: A click arrives before any motion
    let unseeded = Recorder::arm(&hub, None);
    hub.publish(click.clone());
    let unseeded = unseeded.disarm();

    let seeded = Recorder::arm(&hub, Some((7, 8)));
    hub.publish(click);
    let seeded = seeded.disarm();

    // Then: Only the seeded recorder keeps it
    assert!(unseeded.is_empty());
    assert_eq!(
        seeded.events(),
        &[Event::Click {
            x: 7,
            y: 8,
            button: MouseButton::Right,
            pressed: false,
            t: 2.0,
        }]
    );
}

/// WHAT: Negative positions are dropped and timestamps never go backwards
/// WHY: Captured recordings must pass load-time validation
#[test]
fn given_odd_input_when_capturing_then_buffer_stays_valid() {
    // Given: An armed recorder
    let hub = InputHub::new();
    let recorder = Recorder::arm(&hub, None);

    // When: A negative move, then events with a clock step backwards
    hub.publish(input(InputEvent::PointerMove { x: -3.0, y: 4.0 }, 1.0));
    hub.publish(input(InputEvent::PointerMove { x: 3.0, y: 4.0 }, 10.0));
    hub.publish(input(InputEvent::PointerMove { x: 5.0, y: 4.0 }, 9.5));
    assert_eq!(recorder.len(), 2);
    let recording = recorder.disarm();

    // Then: Two moves, the second clamped to the first one's time
    assert_eq!(
        recording.events(),
        &[
            Event::Move { x: 3, y: 4, t: 10.0 },
            Event::Move { x: 5, y: 4, t: 10.0 },
        ]
    );
}
