//! Pure settlement of a resolved round's bet set.
//!
//! Settlement never touches the ledger or any I/O: it maps a frozen bet set
//! and the drawn outcome to per-player and per-round totals, and the state
//! machine applies the credits. Losing stakes were already debited at
//! acceptance and are simply not returned.

use std::collections::HashMap;

use crate::ledger::{Chips, PlayerId};
use crate::rules::{Outcome, PayoutTable};

use super::round::Bet;

/// One player's totals for a settled round
#[derive(Debug, Clone)]
pub struct PlayerSettlement {
    pub player: PlayerId,
    pub wagered: Chips,
    pub won: Chips,
    pub bet_count: u64,
}

/// Result of settling one round
#[derive(Debug, Clone)]
pub struct RoundSettlement {
    pub outcome: Outcome,
    pub total_wagered: Chips,
    pub total_paid_out: Chips,
    pub players: Vec<PlayerSettlement>,
}

/// Evaluate every bet against the drawn outcome.
/// Bets are independent; order never affects the result.
pub fn settle(table: &PayoutTable, bets: &[Bet], outcome: Outcome) -> RoundSettlement {
    let mut players: HashMap<PlayerId, PlayerSettlement> = HashMap::new();
    let mut total_wagered = Chips::ZERO;
    let mut total_paid_out = Chips::ZERO;

    for bet in bets {
        let payout = table
            .multiplier_for(bet.selection, outcome)
            .map(|multiplier| Chips::new(multiplier.calculate(bet.amount.amount())))
            .unwrap_or(Chips::ZERO);

        total_wagered = total_wagered.saturating_add(bet.amount);
        total_paid_out = total_paid_out.saturating_add(payout);

        let entry = players
            .entry(bet.player.clone())
            .or_insert_with(|| PlayerSettlement {
                player: bet.player.clone(),
                wagered: Chips::ZERO,
                won: Chips::ZERO,
                bet_count: 0,
            });
        entry.wagered = entry.wagered.saturating_add(bet.amount);
        entry.won = entry.won.saturating_add(payout);
        entry.bet_count += 1;
    }

    RoundSettlement {
        outcome,
        total_wagered,
        total_paid_out,
        players: players.into_values().collect(),
    }
}
