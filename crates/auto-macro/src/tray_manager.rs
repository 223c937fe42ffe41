//! System tray icon with state-based updates.
//!
//! Manages a system tray icon with three states (Idle, Recording, Playing)
//! and the context menu driving the recorder.

use crate::{AppError, AppResult, TrayIconState};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{info, instrument};
use tray_icon::menu::{Menu, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const ICON_SIZE: u32 = 32;

/// Ids of the tray menu entries, handed to the async side.
#[derive(Debug, Clone)]
pub struct MenuIds {
    /// Start Recording.
    pub start_recording: MenuId,
    /// Stop Recording.
    pub stop_recording: MenuId,
    /// Play Last Recording.
    pub play_last: MenuId,
    /// Stop Playback.
    pub stop_playback: MenuId,
    /// Save Recording.
    pub save_recording: MenuId,
    /// Reload Shortcuts.
    pub reload_shortcuts: MenuId,
    /// Open Macro Folder.
    pub open_folder: MenuId,
    /// Exit.
    pub exit: MenuId,
}

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    start_item: MenuItem,
    stop_item: MenuItem,
    play_item: MenuItem,
    stop_playback_item: MenuItem,
    menu_ids: MenuIds,
}

impl TrayManager {
    /// Create a new tray manager in the Idle state.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let start_item = MenuItem::new("Start Recording", true, None);
        let stop_item = MenuItem::new("Stop Recording", false, None);
        let play_item = MenuItem::new("Play Last Recording", true, None);
        let stop_playback_item = MenuItem::new("Stop Playback", false, None);
        let save_item = MenuItem::new("Save Recording", true, None);
        let reload_item = MenuItem::new("Reload Shortcuts", true, None);
        let folder_item = MenuItem::new("Open Macro Folder", true, None);
        let exit_item = MenuItem::new("Exit", true, None);

        let menu_ids = MenuIds {
            start_recording: start_item.id().clone(),
            stop_recording: stop_item.id().clone(),
            play_last: play_item.id().clone(),
            stop_playback: stop_playback_item.id().clone(),
            save_recording: save_item.id().clone(),
            reload_shortcuts: reload_item.id().clone(),
            open_folder: folder_item.id().clone(),
            exit: exit_item.id().clone(),
        };

        let separator = PredefinedMenuItem::separator();
        menu.append_items(&[
            &start_item,
            &stop_item,
            &separator,
            &play_item,
            &stop_playback_item,
            &save_item,
            &separator,
            &reload_item,
            &folder_item,
            &separator,
            &exit_item,
        ])
        .map_err(|e| AppError::TrayError {
            reason: format!("Failed to build tray menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(TrayIconState::Idle.tooltip())
            .with_menu(Box::new(menu))
            .with_icon(Self::render_icon(TrayIconState::Idle)?)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            start_item,
            stop_item,
            play_item,
            stop_playback_item,
            menu_ids,
        })
    }

    /// Update icon, tooltip and which menu entries are enabled.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        self.tray_icon
            .set_icon(Some(Self::render_icon(state)?))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon
            .set_tooltip(Some(state.tooltip()))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let idle = state == TrayIconState::Idle;
        self.start_item.set_enabled(idle);
        self.play_item.set_enabled(idle);
        self.stop_item.set_enabled(state == TrayIconState::Recording);
        self.stop_playback_item
            .set_enabled(state == TrayIconState::Playing);

        Ok(())
    }

    /// Draw the state icon: a filled disc on a transparent square.
    #[track_caller]
    fn render_icon(state: TrayIconState) -> AppResult<Icon> {
        Icon::from_rgba(disc_rgba(ICON_SIZE, state.color()), ICON_SIZE, ICON_SIZE).map_err(|e| {
            AppError::TrayError {
                reason: format!("Failed to create icon from RGBA: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    /// Menu entry ids.
    pub fn menu_ids(&self) -> &MenuIds {
        &self.menu_ids
    }
}

/// RGBA pixels of a `size`x`size` disc filled with `color`.
pub(crate) fn disc_rgba(size: u32, color: [u8; 4]) -> Vec<u8> {
    let center = (size as f32 - 1.0) / 2.0;
    let radius = size as f32 / 2.0 - 1.0;

    (0..size * size)
        .flat_map(|i| {
            let dx = (i % size) as f32 - center;
            let dy = (i / size) as f32 - center;
            if dx * dx + dy * dy <= radius * radius {
                color
            } else {
                [0, 0, 0, 0]
            }
        })
        .collect()
}
