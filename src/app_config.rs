//! Application configuration and CLI argument parsing
//!
//! This module handles all command-line interface definitions,
//! argument parsing, and selection string handling.

use clap::{Parser, Subcommand};

use vyfun::{Color, Selection};

/// Command-line interface definition for VyFun
#[derive(Parser)]
#[command(name = "vyfun")]
#[command(about = "Round-based color prediction betting engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, default_value = "~/.vyfun")]
    pub data_dir: String,

    #[arg(short, long)]
    pub nickname: Option<String>,

    #[arg(short, long)]
    pub verbose: bool,
}

/// Available commands for the VyFun CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Start the round clock and follow rounds live
    Start,

    /// Place a bet in the current round and follow it to resolution
    Bet {
        /// What to back: a digit 0-9, or green/violet/red
        selection: String,

        /// Stake in chips
        amount: u64,
    },

    /// Show chip balance and lifetime account totals
    Balance,

    /// Show engine and ledger statistics
    Stats,

    /// Run a deterministic multi-player simulation
    Simulate {
        #[arg(long, default_value = "10")]
        rounds: u32,

        #[arg(long, default_value = "4")]
        players: u32,

        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

impl Commands {
    /// Check if this command runs the live round clock
    pub fn runs_rounds(&self) -> bool {
        matches!(self, Commands::Start | Commands::Bet { .. })
    }

    /// Get the command name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Start => "start",
            Commands::Bet { .. } => "bet",
            Commands::Balance => "balance",
            Commands::Stats => "stats",
            Commands::Simulate { .. } => "simulate",
        }
    }
}

/// Parse a selection string: a bare digit ("7"), a prefixed digit
/// ("number:7"), or a color name
pub fn parse_selection(input: &str) -> Result<Selection, String> {
    let normalized = input.trim().to_lowercase();
    let digit_part = normalized.strip_prefix("number:").unwrap_or(&normalized);

    if let Ok(digit) = digit_part.parse::<u8>() {
        return Selection::number(digit)
            .map_err(|_| format!("digit must be between 0 and 9, got '{}'", input));
    }

    match normalized.as_str() {
        "green" => Ok(Selection::Color(Color::Green)),
        "violet" | "purple" => Ok(Selection::Color(Color::Violet)),
        "red" => Ok(Selection::Color(Color::Red)),
        _ => Err(format!(
            "invalid selection '{}'. Use a digit 0-9, or one of: green, violet, red",
            input
        )),
    }
}

/// Validate and expand data directory path
pub fn resolve_data_dir(data_dir: &str) -> Result<String, String> {
    if data_dir.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            Ok(data_dir.replacen('~', &home, 1))
        } else {
            Err(
                "Cannot resolve ~ in data directory path - HOME environment variable not set"
                    .to_string(),
            )
        }
    } else {
        Ok(data_dir.to_string())
    }
}
