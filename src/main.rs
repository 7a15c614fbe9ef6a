//! cli-arcade - A collection of small terminal games
//!
//! Every game draws into a virtual screen that is flushed as one frame of
//! ANSI output per iteration, with keys read on a background thread (termios
//! on POSIX, the console API on Windows).
//!
//! # Quick Start
//!
//! ```text
//! cli-arcade                     # Game menu
//! cli-arcade list                # List games with their indices
//! cli-arcade run 0               # Run a game by index
//! cli-arcade run "Star Ship"     # ... or by name
//! cli-arcade reset -y            # Delete all highscores
//! ```
//!
//! # Keys in games
//!
//! | Key | Action |
//! |-----|--------|
//! | Arrows / WASD | Move |
//! | Backspace | Pause/Resume |
//! | ESC | Quit |
//! | Ctrl+C | Exit the arcade |

mod config;
mod core;
mod game;
mod games;
mod launcher;
mod registry;
mod ui;

use std::env;
use std::io;
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{app_dir, Config};
use crate::core::SessionError;
use crate::registry::{GameRegistry, LookupError};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Overrides `log_level` from the config file
const LOG_ENV: &str = "CLI_ARCADE_LOG";

/// Shell convention for termination by SIGINT
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Menu,
    List,
    Run(String),
    Reset { game: Option<String>, yes: bool },
    Help,
    Version,
}

fn print_version() {
    println!("cli-arcade {}", VERSION);
}

fn print_help() {
    println!("cli-arcade {} - Terminal arcade games", VERSION);
    println!();
    println!("Usage: cli-arcade [COMMAND]");
    println!();
    println!("Commands:");
    println!("  (none)                    Open the game menu");
    println!("  list                      List available games");
    println!("  run <INDEX|NAME>          Run a game by zero-based index or name");
    println!("  reset [INDEX|NAME] [-y]   Delete highscores for one game or all games");
    println!();
    println!("Options:");
    println!("  -y, --yes                 Do not prompt before deleting (reset)");
    println!("  -v, --version             Show version");
    println!("  -h, --help                Show this help");
    println!();
    println!("Examples:");
    println!("  cli-arcade run 0");
    println!("  cli-arcade run \"Byte Bouncer\"");
    println!("  cli-arcade reset \"Byte Bouncer\" -y");
    println!();
    println!("Configuration: ~/.cli-arcade/config.toml");
    println!("Log file:      ~/.cli-arcade/arcade.log ({} overrides the level)", LOG_ENV);
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut command = None;
    let mut positional: Vec<&str> = Vec::new();
    let mut yes = false;

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--version" => return Ok(Command::Version),
            "-y" | "--yes" => yes = true,
            "list" | "run" | "reset" if command.is_none() => command = Some(arg.as_str()),
            other if other.starts_with('-') && other.parse::<i64>().is_err() => {
                return Err(format!("Unknown argument: {}. Use -h for help.", other));
            }
            other => positional.push(other),
        }
    }

    let single = |positional: &[&str]| -> Result<Option<String>, String> {
        match positional {
            [] => Ok(None),
            [one] => Ok(Some(one.to_string())),
            [_, extra, ..] => Err(format!("Unexpected argument: {}", extra)),
        }
    };

    match command {
        None if positional.is_empty() => Ok(Command::Menu),
        None => Err(format!("Unknown command: {}. Use -h for help.", positional[0])),
        Some("list") => match positional.first() {
            None => Ok(Command::List),
            Some(extra) => Err(format!("Unexpected argument: {}", extra)),
        },
        Some("run") => single(&positional)?
            .map(Command::Run)
            .ok_or_else(|| "Missing game argument for run".to_string()),
        Some(_) => Ok(Command::Reset {
            game: single(&positional)?,
            yes,
        }),
    }
}

/// Log to `~/.cli-arcade/arcade.log`; never to the terminal being drawn on
fn init_logging(level: &str) {
    let log_path = app_dir()
        .map(|dir| dir.join("arcade.log"))
        .unwrap_or_else(|| std::path::PathBuf::from("arcade.log"));

    // Create log directory if needed
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!("panic: {}", panic_info);
        default_hook(panic_info);
    }));
}

/// Print a lookup failure the way the CLI reports it
fn report_lookup(registry: &GameRegistry, err: &LookupError, with_list: bool) -> io::Result<()> {
    println!("  [INFO] {}", err);
    if with_list {
        launcher::list_indented(registry, &mut io::stdout())?;
    }
    Ok(())
}

fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    let registry = GameRegistry::builtin();
    let ctx = config.play_context();

    match command {
        Command::Help => print_help(),
        Command::Version => print_version(),
        Command::List => launcher::list(&registry, &mut io::stdout())?,
        Command::Menu => launcher::run_menu(&registry, &ctx)?,
        Command::Run(token) => match registry.resolve(&token) {
            Ok(index) => {
                if let Some(entry) = registry.get(index) {
                    launcher::run_game(entry, &ctx)?;
                }
            }
            Err(e) => report_lookup(&registry, &e, true)?,
        },
        Command::Reset { game, yes } => {
            let index = match game.as_deref().map(|token| registry.resolve(token)) {
                None => None,
                Some(Ok(index)) => Some(index),
                Some(Err(e)) => return Ok(report_lookup(&registry, &e, false)?),
            };
            let Some(data_dir) = config.data_dir() else {
                println!("  [INFO] Could not determine the highscore directory.");
                return Ok(());
            };
            let stdin = io::stdin();
            launcher::reset(&registry, &data_dir, index, yes, &mut stdin.lock(), &mut io::stdout())?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            return ExitCode::FAILURE;
        }
    };

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_logging(&config.log_level);
    install_panic_hook();
    if let Some(e) = config_error {
        warn!("{}, using defaults", e);
    }
    info!("cli-arcade {} starting ({:?})", VERSION, command);

    match run(command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if SessionError::is_interrupt(&e) => {
            info!("interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_args(&args)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse(&[]), Ok(Command::Menu));
        assert_eq!(parse(&["list"]), Ok(Command::List));
        assert_eq!(parse(&["run", "Star Ship"]), Ok(Command::Run("Star Ship".into())));
        assert_eq!(parse(&["run", "-1"]), Ok(Command::Run("-1".into())));
        assert_eq!(parse(&["reset"]), Ok(Command::Reset { game: None, yes: false }));
        assert_eq!(
            parse(&["reset", "0", "--yes"]),
            Ok(Command::Reset { game: Some("0".into()), yes: true })
        );
        assert_eq!(parse(&["reset", "-y", "tumble"]), Ok(Command::Reset { game: Some("tumble".into()), yes: true }));
        assert_eq!(parse(&["run", "--help"]), Ok(Command::Help));
        assert_eq!(parse(&["-v"]), Ok(Command::Version));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["run"]).is_err());
        assert!(parse(&["play"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["run", "0", "1"]).is_err());
        assert!(parse(&["list", "x"]).is_err());
    }
}
