use crate::{
    MacroError,
    hotkey::{Chord, SHORTCUTS_FILE, ShortcutBinding, ShortcutTable},
};

use std::fs;

use tempfile::TempDir;

/// WHAT: A missing shortcut file loads as an empty table
/// WHY: First start has no shortcuts yet
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_file_when_loading_then_empty_table() {
    let dir = TempDir::new().unwrap();

    let table = ShortcutTable::load(dir.path()).unwrap();

    assert!(table.is_empty());
    assert_eq!(table.path(), dir.path().join(SHORTCUTS_FILE));
}

/// WHAT: Added bindings are persisted with the shortcut/file field names
/// WHY: The file is shared with other tooling
#[test]
#[allow(clippy::unwrap_used)]
fn given_new_binding_when_adding_then_persisted_canonical() {
    // Given: An empty table
    let dir = TempDir::new().unwrap();
    let mut table = ShortcutTable::load(dir.path()).unwrap();

    // When: Adding a binding with a non-canonical chord
    table.add("Alt+Ctrl+1", "greet.macro").unwrap();

    // Then: Stored canonically, on disk and in memory
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(table.path()).unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{ "shortcut": "ctrl+alt+1", "file": "greet.macro" }])
    );
    let reloaded = ShortcutTable::load(dir.path()).unwrap();
    assert_eq!(
        reloaded.bindings(),
        &[ShortcutBinding {
            chord: "ctrl+alt+1".to_string(),
            file: "greet.macro".to_string(),
        }]
    );
    assert_eq!(
        reloaded.resolve(&reloaded.bindings()[0]),
        dir.path().join("greet.macro")
    );
}

/// WHAT: Adding an existing chord fails and leaves the table unchanged
/// WHY: Duplicates are errors, never silent overwrites
#[test]
#[allow(clippy::unwrap_used)]
fn given_existing_chord_when_adding_then_duplicate_error_and_unchanged() {
    // Given: A table with ctrl+alt+1
    let dir = TempDir::new().unwrap();
    let mut table = ShortcutTable::load(dir.path()).unwrap();
    table.add("ctrl+alt+1", "first.macro").unwrap();
    let on_disk = fs::read_to_string(table.path()).unwrap();

    // When: Adding the same chord spelled differently
    let result = table.add("ALT+CTRL+1", "second.macro");

    // Then: Duplicate error, memory and disk untouched
    assert!(matches!(
        result,
        Err(MacroError::DuplicateChord { ref chord, .. }) if chord == "ctrl+alt+1"
    ));
    assert_eq!(table.len(), 1);
    assert_eq!(table.bindings()[0].file, "first.macro");
    assert_eq!(fs::read_to_string(table.path()).unwrap(), on_disk);
}

/// WHAT: Reserved chords cannot be bound
/// WHY: The record/stop hotkeys share the OS namespace with user chords
#[test]
#[allow(clippy::unwrap_used)]
fn given_reserved_chord_when_adding_then_duplicate_error() {
    let dir = TempDir::new().unwrap();
    let mut table = ShortcutTable::load(dir.path())
        .unwrap()
        .with_reserved([Chord::parse("ctrl+1").unwrap()]);

    let result = table.add("Control+1", "x.macro");

    assert!(matches!(result, Err(MacroError::DuplicateChord { .. })));
    assert!(table.is_empty());
    assert!(!table.path().exists());
}

/// WHAT: Bindings need a chord that parses and a file
/// WHY: Incomplete bindings cannot be dispatched
#[test]
#[allow(clippy::unwrap_used)]
fn given_incomplete_binding_when_adding_then_validation_error() {
    let dir = TempDir::new().unwrap();
    let mut table = ShortcutTable::load(dir.path()).unwrap();

    let bad_chord = table.add("ctrl+", "x.macro");
    let no_file = table.add("ctrl+3", "  ");

    assert!(matches!(bad_chord, Err(MacroError::InvalidChord { .. })));
    assert!(matches!(no_file, Err(MacroError::InvalidBinding { .. })));
    assert!(table.is_empty());
}

/// WHAT: Removing by position deletes and persists
/// WHY: The editor removes the selected row
#[test]
#[allow(clippy::unwrap_used)]
fn given_bindings_when_removing_by_index_then_persisted() {
    // Given: Two bindings
    let dir = TempDir::new().unwrap();
    let mut table = ShortcutTable::load(dir.path()).unwrap();
    table.add("ctrl+alt+1", "one.macro").unwrap();
    table.add("ctrl+alt+2", "two.macro").unwrap();

    // When: Removing the first, then an index past the end
    let removed = table.remove(0).unwrap();
    let out_of_range = table.remove(5);

    // Then: The second remains on disk
    assert_eq!(removed.file, "one.macro");
    assert!(matches!(
        out_of_range,
        Err(MacroError::IndexOutOfRange { index: 5, len: 1, .. })
    ));
    let reloaded = ShortcutTable::load(dir.path()).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.bindings()[0].chord, "ctrl+alt+2");
}

/// WHAT: A corrupt shortcut file is a format error
/// WHY: Corruption must be reported, not treated as empty
#[test]
#[allow(clippy::unwrap_used)]
fn given_corrupt_file_when_loading_then_format_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(SHORTCUTS_FILE), "{ nope").unwrap();

    let result = ShortcutTable::load(dir.path());

    assert!(matches!(result, Err(MacroError::Format { .. })));
}
