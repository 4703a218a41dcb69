pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feed-courier")]
#[command(about = "Relay new feed entries to a Telegram chat", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// State file location (overrides config and environment)
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one poll cycle (the default)
    Run,
    /// Inspect or reset the persisted delivery state
    State {
        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(Subcommand)]
pub enum StateAction {
    /// Print the persisted state as JSON
    Show,
    /// Forget the cursor and validators; the next run is a cold start
    Reset,
}
