use crate::{
    MacroError,
    hotkey::{
        ActionFactory, Chord, FixedAction, FixedHotkeys, HotkeyAction, HotkeyDispatchTable,
        SHORTCUTS_FILE, ShortcutBinding, ShortcutTable,
    },
    tests::fakes::FakeRegistrar,
};

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tempfile::TempDir;

/// Action factory whose actions push the bound path into `fired`.
fn recording_actions(fired: &Arc<Mutex<Vec<PathBuf>>>) -> ActionFactory {
    let fired = Arc::clone(fired);
    Box::new(move |_binding: &ShortcutBinding, path: &Path| -> HotkeyAction {
        let fired = Arc::clone(&fired);
        let path = path.to_path_buf();
        Arc::new(move || {
            if let Ok(mut fired) = fired.lock() {
                fired.push(path.clone());
            }
        })
    })
}

#[allow(clippy::unwrap_used)]
fn table_with(dir: &TempDir, json: &str) -> ShortcutTable {
    fs::write(dir.path().join(SHORTCUTS_FILE), json).unwrap();
    ShortcutTable::load(dir.path()).unwrap()
}

/// WHAT: One malformed chord among four is skipped, the rest register
/// WHY: A single bad chord must not block the others
#[test]
#[allow(clippy::unwrap_used)]
fn given_one_malformed_of_four_when_registering_all_then_three_registered_one_failure() {
    // Given: Four bindings, the third one malformed
    let dir = TempDir::new().unwrap();
    let table = table_with(
        &dir,
        r#"[
            {"shortcut": "ctrl+alt+1", "file": "one.macro"},
            {"shortcut": "ctrl+alt+2", "file": "two.macro"},
            {"shortcut": "ctrl+alt+", "file": "bad.macro"},
            {"shortcut": "ctrl+alt+4", "file": "four.macro"}
        ]"#,
    );
    let registrar = FakeRegistrar::default();
    let fired = Arc::new(Mutex::new(Vec::new()));
    let mut dispatch = HotkeyDispatchTable::new(table, registrar.clone(), recording_actions(&fired));

    // When: Registering everything
    let report = dispatch.register_all();

    // Then: Three registered, exactly one failure naming the bad chord
    assert_eq!(report.registered, vec!["ctrl+alt+1", "ctrl+alt+2", "ctrl+alt+4"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "ctrl+alt+");
    assert!(matches!(report.failures[0].1, MacroError::InvalidChord { .. }));
    assert_eq!(registrar.active_chords().len(), 3);
    assert_eq!(dispatch.routes().len(), 3);
}

/// WHAT: A chord the OS refuses is reported and skipped
/// WHY: Another program may already own the combination
#[test]
#[allow(clippy::unwrap_used)]
fn given_os_refusal_when_registering_all_then_reported_and_skipped() {
    let dir = TempDir::new().unwrap();
    let table = table_with(
        &dir,
        r#"[{"shortcut": "ctrl+alt+1", "file": "a.macro"}, {"shortcut": "ctrl+alt+2", "file": "b.macro"}]"#,
    );
    let registrar = FakeRegistrar::refusing("ctrl+alt+1");
    let mut dispatch =
        HotkeyDispatchTable::new(table, registrar.clone(), recording_actions(&Arc::default()));

    let report = dispatch.register_all();

    assert!(!report.is_complete());
    assert!(matches!(
        report.failures[0].1,
        MacroError::HotkeyRegistration { .. }
    ));
    assert_eq!(registrar.active_chords(), vec!["ctrl+alt+2"]);
}

/// WHAT: Registering twice leaves exactly one handle per chord
/// WHY: Full refresh must never leak or duplicate OS handles
#[test]
#[allow(clippy::unwrap_used)]
fn given_registered_table_when_registering_again_then_no_duplicate_handles() {
    // Given: Two registered bindings
    let dir = TempDir::new().unwrap();
    let table = table_with(
        &dir,
        r#"[{"shortcut": "ctrl+alt+1", "file": "a.macro"}, {"shortcut": "ctrl+alt+2", "file": "b.macro"}]"#,
    );
    let registrar = FakeRegistrar::default();
    let mut dispatch =
        HotkeyDispatchTable::new(table, registrar.clone(), recording_actions(&Arc::default()));
    dispatch.register_all();

    // When: Registering again
    let report = dispatch.register_all();

    // Then: Old handles released first, same chords active once each
    assert!(report.is_complete());
    assert_eq!(registrar.active_chords(), vec!["ctrl+alt+1", "ctrl+alt+2"]);
    assert_eq!(registrar.with_state(|s| s.unregister_calls), 2);
    assert_eq!(dispatch.registered().len(), 2);
}

/// WHAT: Adding a binding persists it and makes it dispatchable
/// WHY: Every mutation is followed by a full re-registration
#[test]
#[allow(clippy::unwrap_used)]
fn given_dispatch_table_when_adding_binding_then_pressing_it_fires_action() {
    // Given: An empty dispatch table
    let dir = TempDir::new().unwrap();
    let table = ShortcutTable::load(dir.path()).unwrap();
    let fired = Arc::new(Mutex::new(Vec::new()));
    let mut dispatch =
        HotkeyDispatchTable::new(table, FakeRegistrar::default(), recording_actions(&fired));

    // When: Adding a binding and pressing its id
    let report = dispatch.add("ctrl+shift+p", "play.macro").unwrap();
    let id = dispatch.registered()[0].id;
    let routes = dispatch.routes();
    let handled = routes.dispatch(id);

    // Then: The action received the resolved path
    assert_eq!(report.registered, vec!["ctrl+shift+p"]);
    assert!(handled);
    assert_eq!(*fired.lock().unwrap(), vec![dir.path().join("play.macro")]);
    assert_eq!(dispatch.list_all().len(), 1);
    assert!(!routes.dispatch(id + 100));
}

/// WHAT: A duplicate add leaves registrations untouched
/// WHY: Failed edits must not churn OS handles
#[test]
#[allow(clippy::unwrap_used)]
fn given_existing_chord_when_adding_through_dispatch_then_error_without_refresh() {
    let dir = TempDir::new().unwrap();
    let table = ShortcutTable::load(dir.path()).unwrap();
    let registrar = FakeRegistrar::default();
    let mut dispatch =
        HotkeyDispatchTable::new(table, registrar.clone(), recording_actions(&Arc::default()));
    dispatch.add("ctrl+alt+1", "a.macro").unwrap();
    let calls_before = registrar.with_state(|s| s.register_calls);

    let result = dispatch.add("ctrl+alt+1", "b.macro");

    assert!(matches!(result, Err(MacroError::DuplicateChord { .. })));
    assert_eq!(registrar.with_state(|s| s.register_calls), calls_before);
    assert_eq!(dispatch.list_all().len(), 1);
}

/// WHAT: Removing a binding drops its handle and route
/// WHY: A removed shortcut must stop firing
#[test]
#[allow(clippy::unwrap_used)]
fn given_two_bindings_when_removing_one_then_only_other_routed() {
    // Given: Two registered bindings
    let dir = TempDir::new().unwrap();
    let table = ShortcutTable::load(dir.path()).unwrap();
    let registrar = FakeRegistrar::default();
    let mut dispatch =
        HotkeyDispatchTable::new(table, registrar.clone(), recording_actions(&Arc::default()));
    dispatch.add("ctrl+alt+1", "a.macro").unwrap();
    dispatch.add("ctrl+alt+2", "b.macro").unwrap();

    // When: Removing the first
    dispatch.remove(0).unwrap();

    // Then: Only the second is registered and routed
    assert_eq!(registrar.active_chords(), vec!["ctrl+alt+2"]);
    let routes = dispatch.routes();
    assert_eq!(routes.len(), 1);
    assert_eq!(
        routes.chord(dispatch.registered()[0].id).as_deref(),
        Some("ctrl+alt+2")
    );
}

/// WHAT: Reload picks up edits made to the file
/// WHY: The shortcut file can be edited outside the app
#[test]
#[allow(clippy::unwrap_used)]
fn given_edited_file_when_reloading_then_new_bindings_registered() {
    let dir = TempDir::new().unwrap();
    let table = table_with(&dir, r#"[{"shortcut": "ctrl+alt+1", "file": "a.macro"}]"#);
    let registrar = FakeRegistrar::default();
    let mut dispatch =
        HotkeyDispatchTable::new(table, registrar.clone(), recording_actions(&Arc::default()));
    dispatch.register_all();

    fs::write(
        dir.path().join(SHORTCUTS_FILE),
        r#"[{"shortcut": "ctrl+alt+9", "file": "z.macro"}]"#,
    )
    .unwrap();
    let report = dispatch.reload().unwrap();

    assert_eq!(report.registered, vec!["ctrl+alt+9"]);
    assert_eq!(registrar.active_chords(), vec!["ctrl+alt+9"]);
}

/// WHAT: Fixed hotkeys survive user refreshes and the table's drop
/// WHY: Record/stop chords live in a separate, permanent scope
#[test]
#[allow(clippy::unwrap_used)]
fn given_fixed_hotkeys_when_user_table_refreshed_and_dropped_then_fixed_remain() {
    // Given: Fixed chords registered before the dispatch table
    let dir = TempDir::new().unwrap();
    let mut registrar = FakeRegistrar::default();
    let (fixed, report) = FixedHotkeys::register(
        &mut registrar,
        Chord::parse("ctrl+1").unwrap(),
        Chord::parse("ctrl+2").unwrap(),
    );
    let table = ShortcutTable::load(dir.path())
        .unwrap()
        .with_reserved(fixed.chords().to_vec());
    let mut dispatch =
        HotkeyDispatchTable::new(table, registrar.clone(), recording_actions(&Arc::default()));

    // When: Adding a user chord, refreshing, then dropping the table
    dispatch.add("ctrl+3", "three.macro").unwrap();
    dispatch.register_all();
    assert_eq!(registrar.active_chords(), vec!["ctrl+1", "ctrl+2", "ctrl+3"]);
    drop(dispatch);

    // Then: Only the fixed chords remain, with their actions
    assert!(report.is_complete());
    assert_eq!(registrar.active_chords(), vec!["ctrl+1", "ctrl+2"]);
    let actions: Vec<_> = registrar.with_state(|s| {
        let mut ids: Vec<u32> = s.active.keys().copied().collect();
        ids.sort();
        ids.into_iter().map(|id| fixed.action(id)).collect()
    });
    assert_eq!(
        actions,
        vec![
            Some(FixedAction::StartRecording),
            Some(FixedAction::StopRecording)
        ]
    );
}
