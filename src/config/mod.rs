//! Configuration for the engine and the application shell.
//!
//! Defaults match the production game: a 180 second betting window with a
//! 10 second cutoff, ten visible history rows, and a 10 000 chip opening
//! grant. Every knob can be overridden through `VYFUN_*` environment
//! variables; the CLI supplies the data directory and nickname on top.

use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};

use crate::error::{Error, Result};

/// Chip denominations offered as quick wager amounts
pub const QUICK_BET_AMOUNTS: [u64; 6] = [10, 50, 100, 500, 1000, 5000];

/// Round engine tuning
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Length of one betting window in countdown seconds
    pub window_secs: u32,
    /// Countdown value at and below which new bets are rejected
    pub bet_cutoff_secs: u32,
    /// Wall-clock duration of one countdown tick
    pub tick_interval: Duration,
    /// Number of resolved rounds kept in the history log
    pub history_depth: usize,
    /// Chips granted when an account is opened for the first time
    pub starting_balance: u64,
    /// Smallest accepted wager in chips
    pub min_bet: u64,
    /// Largest accepted wager in chips
    pub max_bet: u64,
    /// Fixed first period number; `None` derives a date-encoded seed
    pub initial_period: Option<u64>,
    /// Capacity of the engine event broadcast channel
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_secs: 180,
            bet_cutoff_secs: 10,
            tick_interval: Duration::from_secs(1),
            history_depth: 10,
            starting_balance: 10_000,
            min_bet: 1,
            max_bet: 1_000_000,
            initial_period: None,
            event_capacity: 1000,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("VYFUN_WINDOW_SECS") {
            if let Ok(secs) = val.parse() {
                config.window_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("VYFUN_BET_CUTOFF_SECS") {
            if let Ok(secs) = val.parse() {
                config.bet_cutoff_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("VYFUN_TICK_MS") {
            if let Ok(ms) = val.parse() {
                config.tick_interval = Duration::from_millis(ms);
            }
        }
        if let Ok(val) = std::env::var("VYFUN_HISTORY_DEPTH") {
            if let Ok(depth) = val.parse() {
                config.history_depth = depth;
            }
        }
        if let Ok(val) = std::env::var("VYFUN_STARTING_BALANCE") {
            if let Ok(chips) = val.parse() {
                config.starting_balance = chips;
            }
        }
        if let Ok(val) = std::env::var("VYFUN_MIN_BET") {
            if let Ok(chips) = val.parse() {
                config.min_bet = chips;
            }
        }
        if let Ok(val) = std::env::var("VYFUN_MAX_BET") {
            if let Ok(chips) = val.parse() {
                config.max_bet = chips;
            }
        }
        if let Ok(val) = std::env::var("VYFUN_INITIAL_PERIOD") {
            if let Ok(period) = val.parse() {
                config.initial_period = Some(period);
            }
        }

        config
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            return Err(Error::Config("window_secs must be positive".into()));
        }
        if self.bet_cutoff_secs >= self.window_secs {
            return Err(Error::Config(format!(
                "bet cutoff {}s must be shorter than the {}s window",
                self.bet_cutoff_secs, self.window_secs
            )));
        }
        if self.tick_interval.is_zero() {
            return Err(Error::Config("tick_interval must be positive".into()));
        }
        if self.history_depth == 0 {
            return Err(Error::Config("history_depth must be at least 1".into()));
        }
        if self.min_bet == 0 {
            return Err(Error::Config("min_bet must be positive".into()));
        }
        if self.min_bet > self.max_bet {
            return Err(Error::Config(format!(
                "min_bet {} exceeds max_bet {}",
                self.min_bet, self.max_bet
            )));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be positive".into()));
        }
        Ok(())
    }

    /// Period number for the first round of this engine instance
    pub fn first_period(&self) -> u64 {
        self.initial_period
            .unwrap_or_else(|| date_seed_period(Utc::now().date_naive()))
    }
}

/// First period for a calendar date, `YYYYMMDD × 1000 + 1`
/// (2025-01-05 seeds period 20250105001)
pub fn date_seed_period(date: NaiveDate) -> u64 {
    let ymd = date.year() as u64 * 10_000 + date.month() as u64 * 100 + date.day() as u64;
    ymd * 1000 + 1
}

/// Application shell configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory for the account file and other local state
    pub data_dir: String,
    /// Display name; also seeds the local player id
    pub nickname: Option<String>,
    /// Engine tuning
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.vyfun".to_string(),
            nickname: None,
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load application configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self {
            engine: EngineConfig::from_env(),
            ..Self::default()
        };

        if let Ok(dir) = std::env::var("VYFUN_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Ok(nick) = std::env::var("VYFUN_NICKNAME") {
            config.nickname = Some(nick);
        }

        config
    }
}
