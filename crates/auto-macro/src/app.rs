use crate::{AppCommand, AppError, AppResult, MenuIds, TrayCommand, TrayIconState};

use auto_macro_core::{Recording, SessionCoordinator, SessionStatus, codec};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    sync::mpsc as std_mpsc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use error_location::ErrorLocation;
use tao::event_loop::EventLoopProxy;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::MenuEvent;

/// Main application state.
///
/// Runs on the async runtime thread. Tray updates and shortcut reloads go
/// back to the main thread through `tray_proxy` because `TrayIcon` and the
/// OS hotkey manager must remain on the UI thread.
pub struct App {
    pub(crate) coordinator: SessionCoordinator,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) macro_dir: PathBuf,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) menu_ids: MenuIds,
    pub(crate) last_recording: Option<Recording>,
}

impl App {
    /// Run the main application event loop.
    ///
    /// `status_rx` is the coordinator's status channel.
    #[instrument(skip_all)]
    pub(crate) async fn run(
        mut self,
        status_rx: std_mpsc::Receiver<SessionStatus>,
    ) -> AppResult<()> {
        info!("Auto-Macro starting");

        // MenuEvent::receiver() is a blocking crossbeam receiver; one
        // persistent blocking task forwards it until tray_event_rx is dropped.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        let (status_tx, mut status_event_rx) = mpsc::channel(32);
        let status_handle = tokio::task::spawn_blocking(move || {
            while let Ok(status) = status_rx.recv() {
                if status_tx.blocking_send(status).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    if let Err(e) = self.handle_tray_event(event).await {
                        error!(error = ?e, "Failed to handle tray event");
                    }
                }

                Some(status) = status_event_rx.recv() => {
                    self.handle_status(&status);
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::StartRecording => {
                            if let Err(e) = self.start_recording() {
                                error!(error = ?e, "Failed to start recording");
                            }
                        }
                        AppCommand::StopRecording => {
                            if let Err(e) = self.stop_recording() {
                                error!(error = ?e, "Failed to stop recording");
                            }
                        }
                        AppCommand::PlayFile { path } => {
                            if let Err(e) = self.play_file(&path) {
                                error!(path = ?path, error = ?e, "Failed to play macro file");
                            }
                        }
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        // No listener or held button may outlive the process.
        self.coordinator.emergency_stop();

        drop(tray_event_rx);
        drop(status_event_rx);

        for (name, handle) in [("Tray", tray_handle), ("Status", status_handle)] {
            match tokio::time::timeout(Duration::from_secs(1), handle).await {
                Ok(Ok(())) => debug!(forwarder = name, "Event forwarder stopped cleanly"),
                Ok(Err(e)) => error!(forwarder = name, error = ?e, "Event forwarder task panicked"),
                Err(_) => debug!(
                    forwarder = name,
                    "Event forwarder did not stop within timeout, will be cleaned up on exit"
                ),
            }
        }

        let _ = self.shutdown_tx.send(true);
        info!("Auto-Macro shut down successfully");

        Ok(())
    }

    #[instrument(skip(self))]
    fn start_recording(&self) -> AppResult<()> {
        let session_id = self.coordinator.start_recording()?;
        debug!(session_id = %session_id, "Recorder armed");
        Ok(())
    }

    /// Disarm the recorder; the capture becomes the last recording.
    #[instrument(skip(self))]
    fn stop_recording(&mut self) -> AppResult<()> {
        let recording = self.coordinator.stop_recording()?;
        info!(
            event_count = recording.len(),
            duration_ms = recording.duration().as_millis(),
            "Recording kept as last recording"
        );
        self.last_recording = Some(recording);
        Ok(())
    }

    /// Load a macro file and start replaying it.
    #[instrument(skip(self))]
    fn play_file(&self, path: &Path) -> AppResult<()> {
        let recording = codec::load(path)?;
        let handle = self.coordinator.start_playback(recording)?;
        debug!(session_id = %handle.session_id(), "Playback running");
        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn play_last(&self) -> AppResult<()> {
        let recording = self.last_recording.clone().ok_or_else(|| AppError::NoRecording {
            location: ErrorLocation::from(Location::caller()),
        })?;
        let handle = self.coordinator.start_playback(recording)?;
        debug!(session_id = %handle.session_id(), "Playback running");
        Ok(())
    }

    /// Save the last recording as `recording-<epoch ms>.macro`.
    #[track_caller]
    #[instrument(skip(self))]
    fn save_recording(&self) -> AppResult<Option<PathBuf>> {
        let Some(recording) = self.last_recording.as_ref() else {
            return Err(AppError::NoRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        };

        if recording.is_empty() {
            warn!("Last recording is empty, nothing saved");
            return Ok(None);
        }

        let path = recording_path(&self.macro_dir, SystemTime::now());
        codec::save(recording, &path)?;
        Ok(Some(path))
    }

    /// Mirror engine statuses on the tray.
    fn handle_status(&self, status: &SessionStatus) {
        match status {
            SessionStatus::PlaybackFinished {
                session_id,
                outcome,
            } => info!(
                session_id = %session_id,
                executed = outcome.executed,
                failed = outcome.failed,
                cancelled = outcome.cancelled,
                "Playback finished"
            ),
            SessionStatus::Error { message } => error!(message = %message, "Engine error"),
            other => debug!(status = ?other, "Session status"),
        }

        self.send_tray(TrayCommand::SetState(TrayIconState::after(status)));
    }

    fn send_tray(&self, command: TrayCommand) {
        if let Err(e) = self.tray_proxy.send_event(command) {
            warn!(error = ?e, "Tray event loop closed");
        }
    }

    /// Handle tray menu events.
    #[instrument(skip(self))]
    async fn handle_tray_event(&mut self, event: MenuEvent) -> AppResult<()> {
        let event_id = &event.id;
        let ids = self.menu_ids.clone();

        if *event_id == ids.start_recording {
            self.start_recording()?;
        } else if *event_id == ids.stop_recording {
            self.stop_recording()?;
        } else if *event_id == ids.play_last {
            self.play_last()?;
        } else if *event_id == ids.stop_playback {
            self.coordinator.stop_playback();
        } else if *event_id == ids.save_recording {
            if let Some(path) = self.save_recording()? {
                info!(path = ?path, "Recording saved");
            }
        } else if *event_id == ids.reload_shortcuts {
            self.send_tray(TrayCommand::ReloadShortcuts);
        } else if *event_id == ids.open_folder {
            open::that(&self.macro_dir)?;
            info!(macro_dir = ?self.macro_dir, "Opened macro folder");
        } else if *event_id == ids.exit {
            info!("Exit requested from tray menu");
            self.coordinator.emergency_stop();
            self.send_tray(TrayCommand::Shutdown);
            self.command_tx
                .send(AppCommand::Shutdown)
                .await
                .map_err(|e| AppError::ChannelSendFailed {
                    message: format!("Failed to send shutdown command: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        Ok(())
    }
}

/// `<macro_dir>/recording-<epoch ms>.macro`, with a `-N` suffix when that
/// name is already taken.
pub(crate) fn recording_path(macro_dir: &Path, now: SystemTime) -> PathBuf {
    let epoch_ms = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let stem = format!("recording-{}", epoch_ms);

    let mut path = macro_dir.join(format!("{}.{}", stem, codec::MACRO_EXTENSION));
    let mut suffix = 1;
    while path.exists() {
        path = macro_dir.join(format!("{}-{}.{}", stem, suffix, codec::MACRO_EXTENSION));
        suffix += 1;
    }
    path
}
