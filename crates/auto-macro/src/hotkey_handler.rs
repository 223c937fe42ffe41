//! Global hotkey event routing.
//!
//! Fixed record/stop chords become [`AppCommand`]s; user chords run the
//! action the dispatch table bound to their OS id.

use crate::{AppCommand, AppError, AppResult};

use auto_macro_core::{FixedAction, FixedHotkeys, HotkeyRoutes};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use global_hotkey::{GlobalHotKeyEvent, HotKeyState};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Routes OS hotkey presses to commands and macro actions.
pub struct HotkeyHandler {
    fixed: FixedHotkeys,
    routes: HotkeyRoutes,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Create a handler for already registered hotkeys.
    ///
    /// This struct is `Send` and can live on any thread; it only listens on
    /// the global [`GlobalHotKeyEvent`] channel. `routes` is shared with the
    /// dispatch table, so reloads on the main thread are seen here at once.
    pub fn new(
        fixed: FixedHotkeys,
        routes: HotkeyRoutes,
        command_tx: mpsc::Sender<AppCommand>,
    ) -> Self {
        Self {
            fixed,
            routes,
            command_tx,
        }
    }

    /// Run the hotkey handler event loop.
    ///
    /// This method blocks until a shutdown signal is received.
    #[instrument(skip(self))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // One persistent blocking task forwards hotkey events; it stops at
        // the first blocking_send after event_rx is dropped.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    if event.state != HotKeyState::Pressed {
                        continue;
                    }
                    if let Err(e) = self.handle_press(event.id).await {
                        warn!(hotkey_id = event.id, error = ?e, "Failed to handle hotkey");
                    }
                }
            }
        }

        drop(event_rx);

        // The blocking task may be stuck in recv() until the next OS event.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// Handle one press of the hotkey with OS id `id`.
    #[instrument(skip(self))]
    pub(crate) async fn handle_press(&self, id: u32) -> AppResult<()> {
        if let Some(action) = self.fixed.action(id) {
            let command = match action {
                FixedAction::StartRecording => AppCommand::StartRecording,
                FixedAction::StopRecording => AppCommand::StopRecording,
            };

            return self
                .command_tx
                .send(command)
                .await
                .map_err(|e| AppError::ChannelSendFailed {
                    message: format!("Failed to send {:?}: {}", action, e),
                    location: ErrorLocation::from(Location::caller()),
                });
        }

        if !self.routes.dispatch(id) {
            debug!(hotkey_id = id, "Hotkey id not bound to any action");
        }

        Ok(())
    }
}
