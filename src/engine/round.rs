//! Round state and bet records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{Chips, PlayerId};
use crate::rules::{Outcome, Selection};

/// Phases of one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Accepting bets above the cutoff
    Open,
    /// Inside the cutoff window; bets rejected, draw pending
    Locked,
    /// Outcome drawn and settled
    Resolved,
}

/// A wager recorded against the current round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: Uuid,
    pub player: PlayerId,
    pub selection: Selection,
    pub amount: Chips,
    pub placed_at: DateTime<Utc>,
}

impl Bet {
    pub fn new(player: PlayerId, selection: Selection, amount: Chips) -> Self {
        Self {
            id: Uuid::new_v4(),
            player,
            selection,
            amount,
            placed_at: Utc::now(),
        }
    }
}

/// Acknowledgement returned for an accepted bet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetAck {
    pub bet_id: Uuid,
    pub period: u64,
    pub selection: Selection,
    pub amount: Chips,
}

/// The current round: period, countdown, and the in-flight bet set.
/// Exactly one of these exists at a time; resolution archives it into the
/// history log and replaces it with the next period.
#[derive(Debug)]
pub struct Round {
    pub period: u64,
    pub phase: RoundPhase,
    pub seconds_remaining: u32,
    pub outcome: Option<Outcome>,
    bets: Vec<Bet>,
}

impl Round {
    /// Open a fresh round with a full betting window
    pub fn open(period: u64, window_secs: u32) -> Self {
        Self {
            period,
            phase: RoundPhase::Open,
            seconds_remaining: window_secs,
            outcome: None,
            bets: Vec::new(),
        }
    }

    /// Whether a bet arriving now is inside the betting window
    pub fn accepts_bets(&self, cutoff_secs: u32) -> bool {
        self.phase == RoundPhase::Open && self.seconds_remaining > cutoff_secs
    }

    pub fn push_bet(&mut self, bet: Bet) {
        self.bets.push(bet);
    }

    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn bet_count(&self) -> usize {
        self.bets.len()
    }

    /// Total chips staked in this round so far
    pub fn total_staked(&self) -> Chips {
        self.bets
            .iter()
            .fold(Chips::ZERO, |acc, bet| acc.saturating_add(bet.amount))
    }

    /// Hand the bet set to settlement; the round keeps none of it
    pub fn take_bets(&mut self) -> Vec<Bet> {
        std::mem::take(&mut self.bets)
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            period: self.period,
            phase: self.phase,
            seconds_remaining: self.seconds_remaining,
            bet_count: self.bets.len(),
            total_staked: self.total_staked(),
        }
    }
}

/// Read-only view of the current round for presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub period: u64,
    pub phase: RoundPhase,
    pub seconds_remaining: u32,
    pub bet_count: usize,
    pub total_staked: Chips,
}
