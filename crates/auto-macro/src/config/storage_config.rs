use std::path::PathBuf;

use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};

/// Where macros and the shortcut table live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Macro directory; `shortcuts.json` is kept inside it.
    #[serde(default = "default_macro_dir")]
    pub macro_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            macro_dir: default_macro_dir(),
        }
    }
}

/// `<Downloads>/mouse_click`, else `<data dir>/macros`.
pub(crate) fn default_macro_dir() -> PathBuf {
    if let Some(downloads) = UserDirs::new().and_then(|dirs| dirs.download_dir().map(PathBuf::from))
    {
        return downloads.join("mouse_click");
    }

    ProjectDirs::from("com", "auto-macro", "Auto-Macro")
        .map(|dirs| dirs.data_dir().join("macros"))
        .unwrap_or_else(|| PathBuf::from("macros"))
}
