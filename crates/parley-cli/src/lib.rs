//! Parley CLI library
//!
//! Drives the session-event router from the command line: replays scripted
//! session events against a console UI, and decodes or produces file-transfer
//! wire elements.

pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;

pub use cli::{Cli, Commands};
pub use commands::{CommandDispatcher, ReplayReport};
pub use config::AppConfig;
pub use console::{ConsoleConnector, ConsolePresenter, ConsoleSurface, ScriptedSession, Transcript};
pub use error::{CliError, Result};
