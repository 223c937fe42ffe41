use crate::{
    ErrorCategory, MacroError,
    hotkey::{Chord, Modifier},
};

/// WHAT: Chords normalize case, aliases and modifier order
/// WHY: Equal key combinations must compare equal for duplicate checks
#[test]
#[allow(clippy::unwrap_used)]
fn given_aliases_and_order_when_parsing_then_canonical_form() {
    let cases = [
        ("Ctrl+Alt+1", "ctrl+alt+1"),
        ("alt+control+1", "ctrl+alt+1"),
        (" Shift + CMD + F5 ", "shift+super+f5"),
        ("option+Escape", "alt+esc"),
        ("ctrl+PgUp", "ctrl+pageup"),
        ("a", "a"),
    ];

    for (input, canonical) in cases {
        let chord: Chord = input.parse().unwrap();
        assert_eq!(chord.to_string(), canonical, "parsing {input:?}");
    }
}

/// WHAT: Parsed chords expose modifiers and key
/// WHY: Registrars build OS hotkeys from the parts
#[test]
#[allow(clippy::unwrap_used)]
fn given_chord_when_inspecting_then_parts_available() {
    let chord = Chord::parse("shift+ctrl+k").unwrap();

    assert_eq!(
        chord.modifiers().collect::<Vec<_>>(),
        vec![Modifier::Ctrl, Modifier::Shift]
    );
    assert_eq!(chord.key(), "k");
    assert!(chord.has(Modifier::Ctrl));
    assert!(!chord.has(Modifier::Alt));
}

/// WHAT: Malformed chords are rejected as validation errors
/// WHY: Bad chords are reported, never registered
#[test]
#[allow(clippy::panic)]
fn given_malformed_text_when_parsing_then_invalid_chord() {
    let cases = ["", "   ", "ctrl+", "ctrl++a", "ctrl+alt", "ctrl+a+b", "ctrl+hyper", "f25", "!"];

    for input in cases {
        let result = Chord::parse(input);
        match &result {
            Err(e @ MacroError::InvalidChord { .. }) => {
                assert_eq!(e.category(), ErrorCategory::Validation);
            }
            other => panic!("expected InvalidChord for {input:?}, got {other:?}"),
        }
    }
}
