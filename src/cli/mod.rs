//! CLI module - Command-line interface for foodlog

use clap::{Parser, Subcommand};

/// foodlog - nutrition lookup backend with per-user search history
#[derive(Parser)]
#[command(name = "foodlog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Write a default config.toml in the working directory if none exists
    InitConfig,
}
