//! Auto-Macro: record and replay desktop input from the system tray.

mod app;
mod app_command;
mod cli;
mod config;
mod error;
mod hotkey_handler;
mod hotkey_registrar;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    hotkey_registrar::GlobalHotkeyRegistrar,
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::{MenuIds, TrayManager},
};

use crate::{cli::Cli, config::Config};

use auto_macro_core::{
    ActionFactory, EnigoInjector, FixedHotkeys, HotkeyAction, HotkeyDispatchTable, InputHub,
    PlaybackScheduler, RdevHook, SessionCoordinator, ShortcutBinding, ShortcutTable,
};

use std::{path::Path, sync::Arc};

use clap::Parser;
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "auto_macro=debug,auto_macro_core=debug";

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    if let Some(command) = cli.command {
        let result = Config::load().and_then(|config| command.run(&config));
        if let Err(e) = result {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    run_tray();
}

/// Dispatch-table action: ask the app to play the bound file.
fn play_file_action(command_tx: mpsc::Sender<AppCommand>) -> ActionFactory {
    Box::new(move |binding: &ShortcutBinding, path: &Path| -> HotkeyAction {
        let command_tx = command_tx.clone();
        let chord = binding.chord.clone();
        let path = path.to_path_buf();
        Arc::new(move || {
            let command = AppCommand::PlayFile { path: path.clone() };
            if let Err(e) = command_tx.try_send(command) {
                warn!(chord = %chord, error = %e, "Dropped shortcut press");
            }
        })
    })
}

fn run_tray() {
    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new() {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Persists across event loop iterations; dropping it unregisters every
    // user chord. The fixed chords live in its registrar.
    let mut dispatch: Option<HotkeyDispatchTable<GlobalHotkeyRegistrar>> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    TrayCommand::SetState(state) => {
                        if let Err(e) = tray_manager.update_state(state) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::ReloadShortcuts => {
                        if let Some(dispatch) = dispatch.as_mut() {
                            match dispatch.reload() {
                                Ok(report) => info!(
                                    registered = report.registered.len(),
                                    failed = report.failures.len(),
                                    "Shortcuts reloaded"
                                ),
                                Err(e) => error!(error = ?e, "Failed to reload shortcuts"),
                            }
                        }
                    }
                    TrayCommand::Shutdown => {
                        dispatch = None;
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let config = match Config::load() {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let macro_dir = match config.ensure_macro_dir() {
                    Ok(dir) => dir.to_path_buf(),
                    Err(e) => {
                        error!("Failed to create macro directory: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let (start_chord, stop_chord) = match config.hotkeys.chords() {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Invalid record/stop hotkeys in config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let (command_tx, command_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);

                // Register hotkeys on the main thread: tao's event loop pumps
                // the Windows messages needed for WM_HOTKEY delivery.
                let mut registrar = match GlobalHotkeyRegistrar::new() {
                    Ok(r) => r,
                    Err(e) => {
                        error!("Failed to create hotkey manager: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let (fixed, fixed_report) =
                    FixedHotkeys::register(&mut registrar, start_chord, stop_chord);
                if !fixed_report.is_complete() {
                    warn!(
                        failed = fixed_report.failures.len(),
                        "Some record/stop hotkeys are unavailable; use the tray menu"
                    );
                }

                let table = match ShortcutTable::load(&macro_dir) {
                    Ok(t) => t.with_reserved(fixed.chords().to_vec()),
                    Err(e) => {
                        error!(error = ?e, "Failed to load shortcuts, starting with none");
                        ShortcutTable::new(&macro_dir).with_reserved(fixed.chords().to_vec())
                    }
                };

                let mut user_hotkeys = HotkeyDispatchTable::new(
                    table,
                    registrar,
                    play_file_action(command_tx.clone()),
                );
                user_hotkeys.register_all();
                let routes = user_hotkeys.routes();
                dispatch = Some(user_hotkeys);

                let hub = InputHub::new();
                if let Err(e) = RdevHook::install(hub.clone()) {
                    error!("Failed to install input hook: {:?}", e);
                    std::process::exit(1);
                }

                let (status_tx, status_rx) = std::sync::mpsc::channel();
                let coordinator = SessionCoordinator::with_options(
                    hub,
                    EnigoInjector::factory(),
                    PlaybackScheduler::new(config.playback.poll_interval()),
                    Some(status_tx),
                );

                let tray_proxy = tray_proxy.clone();
                let menu_ids = tray_manager.menu_ids().clone();

                // Spawn tokio runtime on separate thread.
                // TrayManager and the hotkey manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let hotkey_handler = HotkeyHandler::new(fixed, routes, command_tx.clone());

                        let app = App {
                            coordinator,
                            tray_proxy,
                            macro_dir,
                            command_tx,
                            command_rx,
                            shutdown_tx,
                            menu_ids,
                            last_recording: None,
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run(status_rx).await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }
    });
}
