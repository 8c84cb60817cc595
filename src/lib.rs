//! VyFun - a round-based color prediction betting engine
//!
//! Players wager on the outcome of a periodically drawn digit (0-9)
//! before the betting window closes, and are paid by fixed multiplier
//! rules when the round resolves. Each module covers one concern:
//! - rules: the fixed contract between outcomes, colors, and payouts
//! - ledger: chip accounts with debit-at-intake accounting
//! - engine: the round state machine, settlement, and history
//! - rng: where outcome digits come from
//! - store: account snapshots on disk behind a background writer
//!
//! The engine is deliberately small: one round at a time behind one
//! lock, balances moved only at bet intake and settlement.

pub mod error;
pub mod config; // Engine tuning and session configuration
pub mod rules; // Outcome digits, colors, selections, payout table
pub mod ledger; // Chip accounts and balance movements
pub mod rng; // Pluggable outcome sources
pub mod engine; // Round state machine, settlement, and history
pub mod store; // Durable account snapshots
pub mod identity; // Local player profile
pub mod app; // Session assembly

// Re-export commonly used types for easy access
pub use error::{Error, Result};
pub use rules::{Color, Multiplier, Outcome, PayoutTable, Selection, OUTCOME_SPACE};
pub use ledger::{Account, AccountSnapshot, BalanceLedger, Chips, LedgerEvent, PlayerId};
pub use engine::{
    Bet, BetAck, EngineEvent, EngineStats, GameEngine, HistoryRecord, RoundPhase, RoundSnapshot,
    Scheduler,
};
pub use rng::{FixedOutcomes, OutcomeSource, SeededOutcomes, ThreadRngOutcomes};
pub use store::{AccountStore, JsonAccountStore, MemoryAccountStore};
pub use config::{date_seed_period, AppConfig, EngineConfig, QUICK_BET_AMOUNTS};
pub use app::{AppStats, VyFunApp};
pub use identity::PlayerProfile;
