//! Command line surface.
//!
//! Without a subcommand the tray application starts; the subcommands edit
//! the shortcut table or replay one macro without any UI.

use crate::{AppResult, config::Config};

use auto_macro_core::{
    EnigoInjector, InputHub, PlaybackScheduler, RdevHook, SessionCoordinator, ShortcutTable, codec,
};

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::instrument;

#[derive(Parser, Debug)]
#[command(name = "auto-macro")]
#[command(about = "Record and replay mouse and keyboard macros from the system tray")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Manage shortcut bindings (chord -> macro file)
    #[command(subcommand)]
    Shortcuts(ShortcutCommand),
    /// Replay a macro file once; press Escape to stop
    Play {
        /// Path to the .macro file
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ShortcutCommand {
    /// List bindings with their index
    List,
    /// Bind a chord such as "ctrl+alt+1" to a macro file
    Add {
        /// Key chord, e.g. "ctrl+shift+p"
        chord: String,
        /// Macro file, relative to the macro folder or absolute
        file: String,
    },
    /// Remove the binding at an index shown by `list`
    Remove {
        /// Zero-based position in the list
        index: usize,
    },
}

impl Commands {
    /// Execute the subcommand against `config`.
    #[instrument(skip(config))]
    pub fn run(self, config: &Config) -> AppResult<()> {
        match self {
            Commands::Shortcuts(command) => command.run(config),
            Commands::Play { file } => play(config, file),
        }
    }
}

impl ShortcutCommand {
    fn run(self, config: &Config) -> AppResult<()> {
        let macro_dir = config.ensure_macro_dir()?;
        let (start, stop) = config.hotkeys.chords()?;
        let mut table = ShortcutTable::load(macro_dir)?.with_reserved([start, stop]);

        match self {
            ShortcutCommand::List => {
                if table.is_empty() {
                    println!("No shortcuts in {}", table.path().display());
                }
                for (index, binding) in table.bindings().iter().enumerate() {
                    println!(
                        "{:>3}  {:<20} {}",
                        index,
                        binding.chord,
                        table.resolve(binding).display()
                    );
                }
            }
            ShortcutCommand::Add { chord, file } => {
                table.add(&chord, &file)?;
                println!("Added {}", format_last(&table));
            }
            ShortcutCommand::Remove { index } => {
                let removed = table.remove(index)?;
                println!("Removed {} -> {}", removed.chord, removed.file);
            }
        }

        Ok(())
    }
}

fn format_last(table: &ShortcutTable) -> String {
    table
        .bindings()
        .last()
        .map(|binding| format!("{} -> {}", binding.chord, binding.file))
        .unwrap_or_default()
}

/// Replay `file` with the OS hook installed for the Escape stop.
fn play(config: &Config, file: PathBuf) -> AppResult<()> {
    let recording = codec::load(&file)?;

    let hub = InputHub::new();
    let _hook = RdevHook::install(hub.clone())?;
    let coordinator = SessionCoordinator::with_options(
        hub,
        EnigoInjector::factory(),
        PlaybackScheduler::new(config.playback.poll_interval()),
        None,
    );

    println!(
        "Playing {} ({} events, {:.1}s), press Esc to stop",
        file.display(),
        recording.len(),
        recording.duration().as_secs_f64()
    );

    let outcome = coordinator.start_playback(recording)?.join()?;

    println!(
        "{} {} events ({} failed) in {:.1}s",
        if outcome.cancelled { "Stopped after" } else { "Played" },
        outcome.executed,
        outcome.failed,
        outcome.elapsed.as_secs_f64()
    );

    Ok(())
}
