// ABOUTME: Terminal front end: command-line arguments, REPL command parsing, and text rendering.
// ABOUTME: The REPL loop itself lives in app.rs.

pub mod command;
pub mod render;

use std::path::PathBuf;

use clap::Parser;

pub use command::{Command, Target, parse_line};

/// Terminal client for the parley chat API.
#[derive(Debug, Parser)]
#[command(name = "parley", version, about)]
pub struct Args {
    /// Base URL of the chat API (overrides config and PARLEY_API_URL).
    #[arg(long)]
    pub api_url: Option<String>,

    /// Path to an alternative config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to the session storage file.
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Forget any stored session before starting.
    #[arg(long)]
    pub fresh: bool,
}

impl Args {
    /// Apply CLI overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut crate::config::Config) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(path) = &self.storage {
            config.storage.path = Some(path.clone());
        }
    }
}
