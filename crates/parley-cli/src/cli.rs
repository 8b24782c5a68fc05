//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Feed a JSON-lines event script through the router
    Replay {
        /// Script with one `{"account": ..., "event": ...}` object per line
        script: PathBuf,
    },
    /// Decode one file-transfer element and print it
    Decode {
        /// File holding a single XML element
        file: PathBuf,
    },
    /// Print the in-band bytestream elements that carry a file
    Chunk {
        /// File to send
        file: PathBuf,
        /// Stream session id
        #[arg(long, default_value = "parley-ibb")]
        sid: String,
        /// Maximum payload bytes per data element
        #[arg(short, long, default_value_t = 4096)]
        block_size: u16,
        /// Carry data in message stanzas instead of iq stanzas
        #[arg(long)]
        message: bool,
    },
}
