use crate::{CoreResult, MacroError, codec::write_atomic, hotkey::Chord};

use std::{
    fs, io,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// File name of the shortcut table inside the macro directory.
pub const SHORTCUTS_FILE: &str = "shortcuts.json";

/// One user-defined chord bound to a macro file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    /// Chord text, canonical for bindings added through [`ShortcutTable::add`].
    #[serde(rename = "shortcut")]
    pub chord: String,
    /// Macro file, relative to the macro directory unless absolute.
    pub file: String,
}

/// Ordered, persisted list of [`ShortcutBinding`]s with unique chords.
///
/// Every successful mutation is written back to disk before it returns; a
/// mutation whose write fails leaves the in-memory table as it was.
#[derive(Debug, Clone)]
pub struct ShortcutTable {
    path: PathBuf,
    macro_dir: PathBuf,
    bindings: Vec<ShortcutBinding>,
    reserved: Vec<Chord>,
}

impl ShortcutTable {
    /// Empty table stored at `<macro_dir>/shortcuts.json`.
    pub fn new(macro_dir: impl Into<PathBuf>) -> Self {
        let macro_dir = macro_dir.into();
        Self {
            path: macro_dir.join(SHORTCUTS_FILE),
            macro_dir,
            bindings: Vec::new(),
            reserved: Vec::new(),
        }
    }

    /// Read `<macro_dir>/shortcuts.json`. A missing file yields an empty table.
    ///
    /// # Errors
    ///
    /// [`MacroError::Io`] if the file exists but cannot be read,
    /// [`MacroError::Format`] if it is not a list of bindings.
    #[track_caller]
    #[instrument]
    pub fn load(macro_dir: &Path) -> CoreResult<Self> {
        let mut table = Self::new(macro_dir);
        table.bindings = read_bindings(&table.path)?;
        info!(path = ?table.path, count = table.bindings.len(), "Shortcuts loaded");
        Ok(table)
    }

    /// Chords that bindings may never use, such as the fixed record/stop
    /// hotkeys.
    pub fn with_reserved(mut self, reserved: impl IntoIterator<Item = Chord>) -> Self {
        self.reserved = reserved.into_iter().collect();
        self
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory binding files are resolved against.
    pub fn macro_dir(&self) -> &Path {
        &self.macro_dir
    }

    /// Bindings in insertion order.
    pub fn bindings(&self) -> &[ShortcutBinding] {
        &self.bindings
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the table has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Absolute path of the macro file bound by `binding`.
    pub fn resolve(&self, binding: &ShortcutBinding) -> PathBuf {
        let file = Path::new(&binding.file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.macro_dir.join(file)
        }
    }

    /// Append a binding and persist the table.
    ///
    /// The chord is stored in canonical form.
    ///
    /// # Errors
    ///
    /// - [`MacroError::InvalidChord`] if `chord` does not parse
    /// - [`MacroError::InvalidBinding`] if `file` is blank
    /// - [`MacroError::DuplicateChord`] if the chord is bound or reserved
    /// - [`MacroError::Io`] if the table cannot be written
    ///
    /// The table is unchanged on every error.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn add(&mut self, chord: &str, file: &str) -> CoreResult<()> {
        let location = ErrorLocation::from(Location::caller());
        let chord = Chord::parse(chord)?;

        let file = file.trim();
        if file.is_empty() {
            return Err(MacroError::InvalidBinding {
                reason: "no macro file selected".to_string(),
                location,
            });
        }

        if self.contains(&chord) {
            warn!(chord = %chord, "Shortcut already exists");
            return Err(MacroError::DuplicateChord {
                chord: chord.to_string(),
                location,
            });
        }

        self.bindings.push(ShortcutBinding {
            chord: chord.to_string(),
            file: file.to_string(),
        });

        if let Err(e) = self.save() {
            self.bindings.pop();
            return Err(e);
        }

        info!(chord = %chord, file, "Shortcut added");
        Ok(())
    }

    /// Delete the binding at `index` and persist the table.
    ///
    /// # Errors
    ///
    /// [`MacroError::IndexOutOfRange`] past the end, [`MacroError::Io`] if
    /// the table cannot be written. The table is unchanged on error.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn remove(&mut self, index: usize) -> CoreResult<ShortcutBinding> {
        if index >= self.bindings.len() {
            return Err(MacroError::IndexOutOfRange {
                index,
                len: self.bindings.len(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let removed = self.bindings.remove(index);
        if let Err(e) = self.save() {
            self.bindings.insert(index, removed);
            return Err(e);
        }

        info!(chord = %removed.chord, file = %removed.file, "Shortcut removed");
        Ok(removed)
    }

    /// Re-read the backing file, replacing the in-memory bindings.
    ///
    /// # Errors
    ///
    /// Same as [`ShortcutTable::load`]; the table is unchanged on error.
    #[track_caller]
    pub fn reload(&mut self) -> CoreResult<()> {
        self.bindings = read_bindings(&self.path)?;
        debug!(count = self.bindings.len(), "Shortcuts reloaded");
        Ok(())
    }

    /// Write the table as pretty JSON.
    ///
    /// # Errors
    ///
    /// [`MacroError::Io`] if the macro directory or the file cannot be
    /// written.
    #[track_caller]
    pub fn save(&self) -> CoreResult<()> {
        fs::create_dir_all(&self.macro_dir).map_err(|e| MacroError::io(&self.macro_dir, e))?;

        let contents = serde_json::to_string_pretty(&self.bindings)
            .map_err(|e| MacroError::format(format!("Failed to serialize shortcuts: {}", e)))?;
        write_atomic(&self.path, contents.as_bytes())?;

        debug!(path = ?self.path, count = self.bindings.len(), "Shortcuts saved");
        Ok(())
    }

    fn contains(&self, chord: &Chord) -> bool {
        self.reserved.contains(chord)
            || self
                .bindings
                .iter()
                .any(|binding| match Chord::parse(&binding.chord) {
                    Ok(existing) => existing == *chord,
                    Err(_) => binding.chord.trim().eq_ignore_ascii_case(&chord.to_string()),
                })
    }
}

#[track_caller]
fn read_bindings(path: &Path) -> CoreResult<Vec<ShortcutBinding>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = ?path, "No shortcut file yet");
            return Ok(Vec::new());
        }
        Err(e) => return Err(MacroError::io(path, e)),
    };

    serde_json::from_str(&contents).map_err(|e| {
        MacroError::format(format!("Failed to parse shortcuts {}: {}", path.display(), e))
    })
}
