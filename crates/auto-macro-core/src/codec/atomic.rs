use crate::{CoreResult, MacroError};

use std::{
    ffi::OsString,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tracing::debug;

/// Write `contents` to `path` via a sibling temp file and a rename.
///
/// The temp file is removed again if any step fails.
#[track_caller]
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> CoreResult<()> {
    let temp_path = temp_path_for(path);

    let result = write_and_sync(&temp_path, contents)
        .and_then(|()| fs::rename(&temp_path, path).map_err(|e| MacroError::io(path, e)));

    if result.is_err() && temp_path.exists() {
        let _ = fs::remove_file(&temp_path);
        debug!(temp_path = ?temp_path, "Removed temp file after failed write");
    }

    result
}

#[track_caller]
fn write_and_sync(temp_path: &Path, contents: &[u8]) -> CoreResult<()> {
    let mut file = fs::File::create(temp_path).map_err(|e| MacroError::io(temp_path, e))?;
    file.write_all(contents)
        .map_err(|e| MacroError::io(temp_path, e))?;
    file.sync_all().map_err(|e| MacroError::io(temp_path, e))?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
