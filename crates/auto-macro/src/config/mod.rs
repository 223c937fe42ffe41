#[allow(clippy::module_inception)]
mod config;
mod hotkey_config;
mod playback_config;
mod storage_config;

pub(crate) use {
    config::Config, hotkey_config::HotkeyConfig, playback_config::PlaybackConfig,
    storage_config::StorageConfig,
};

pub(crate) const DEFAULT_START_RECORDING: &str = "ctrl+1";
pub(crate) const DEFAULT_STOP_RECORDING: &str = "ctrl+2";
pub(crate) const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
pub(crate) const MAX_POLL_INTERVAL_MS: u64 = 100;

pub(crate) fn default_start_recording() -> String {
    DEFAULT_START_RECORDING.to_string()
}

pub(crate) fn default_stop_recording() -> String {
    DEFAULT_STOP_RECORDING.to_string()
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
