//! Error types for the VyFun betting engine.
//!
//! Every fallible operation in the crate returns [`Result`]. Bet rejections
//! (`BettingClosed`, `InsufficientFunds`, `InvalidBet`) are expected,
//! user-correctable outcomes; the engine never treats them as fatal and the
//! round timer keeps running regardless of them.

use thiserror::Error;

/// Result type alias for VyFun operations
pub type Result<T> = std::result::Result<T, Error>;

/// VyFun error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Betting closed: {0}")]
    BettingClosed(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Invalid bet: {0}")]
    InvalidBet(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON error: {}", err))
    }
}

impl Error {
    /// Create an insufficient funds error with the amounts involved
    pub fn insufficient_funds_for(
        operation: impl Into<String>,
        required: u64,
        available: u64,
    ) -> Self {
        Error::InsufficientFunds(format!(
            "insufficient funds for {}: required {}, available {}",
            operation.into(),
            required,
            available
        ))
    }

    /// Create a betting closed error for the given period and countdown
    pub fn betting_closed_at(period: u64, seconds_remaining: u32) -> Self {
        Error::BettingClosed(format!(
            "period {} no longer accepts bets ({}s remaining)",
            period, seconds_remaining
        ))
    }

    /// True for the rejections a player can correct and resubmit
    pub fn is_bet_rejection(&self) -> bool {
        matches!(
            self,
            Error::BettingClosed(_) | Error::InsufficientFunds(_) | Error::InvalidBet(_)
        )
    }
}
