//! Command implementations for VyFun CLI
//!
//! This module contains the betting command implementations,
//! the live round display, and the deterministic simulation.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::sleep;

use vyfun::store::{spawn_store_writer, MemoryAccountStore};
use vyfun::{
    BalanceLedger, Chips, Color, EngineConfig, EngineEvent, Error, GameEngine, Outcome,
    PayoutTable, Result, SeededOutcomes, Selection, VyFunApp, QUICK_BET_AMOUNTS,
};

use crate::app_config::parse_selection;

/// High-level command processing functions
pub mod commands {
    use super::*;

    /// Execute the start command: run the round clock and print the
    /// lifecycle until interrupted
    pub async fn start_command(app: &mut VyFunApp) -> Result<()> {
        app.start().await?;

        let snapshot = app.round_snapshot().await;
        println!(
            "🟢 Period {} open ({}s to bet)",
            snapshot.period, snapshot.seconds_remaining
        );
        println!("💰 Balance: {} chips", app.balance());
        println!();

        follow_rounds(app.engine.clone(), None).await
    }

    /// Execute the bet command: place the wager, then follow the round
    /// clock until the wagered period resolves
    pub async fn bet_command(app: &mut VyFunApp, selection_str: &str, amount: u64) -> Result<()> {
        let selection = parse_selection(selection_str).map_err(Error::InvalidBet)?;
        validation::validate_bet_amount(
            amount,
            app.config.engine.min_bet,
            app.config.engine.max_bet,
        )?;

        info!("💵 Placing bet: {} chips on {}", amount, selection);
        let ack = app.place_bet(selection, Chips::new(amount)).await?;
        let potential = PayoutTable::new().potential(ack.selection);
        println!(
            "✅ Bet placed: {} chips on {} in period {}",
            ack.amount, ack.selection, ack.period
        );
        println!(
            "🎯 Pays {} chips at {} if it hits",
            potential.calculate(amount),
            potential
        );
        println!();

        app.start().await?;
        follow_rounds(app.engine.clone(), Some(ack.period)).await?;

        // Give the store writer a moment to flush the settlement
        sleep(Duration::from_millis(100)).await;
        println!();
        println!(
            "💰 Balance after period {}: {} chips",
            ack.period,
            app.balance()
        );
        app.stop().await
    }

    /// Execute the balance command
    pub async fn balance_command(app: &VyFunApp) -> Result<()> {
        let account = app
            .account()
            .ok_or_else(|| Error::InvalidState("no account for local player".to_string()))?;

        println!(
            "💰 Balance for {}: {} chips",
            app.profile.player_id, account.spendable
        );
        println!("  🎟️ Lifetime bets: {}", account.lifetime_bets);
        println!("  🏆 Lifetime winnings: {} chips", account.lifetime_winnings);
        Ok(())
    }

    /// Execute the stats command
    pub async fn stats_command(app: &VyFunApp) -> Result<()> {
        let stats = app.get_stats().await;

        println!("📊 VyFun Engine Statistics:");
        println!("  🆔 Player: {}", stats.player_id);
        println!(
            "  🎡 Current period: {} ({:?}, {}s left)",
            stats.engine.current_period, stats.engine.phase, stats.engine.seconds_remaining
        );
        println!("  🎟️ Bets accepted: {}", stats.engine.bets_accepted);
        println!("  🚫 Bets rejected: {}", stats.engine.bets_rejected);
        println!("  🎯 Rounds resolved: {}", stats.engine.rounds_resolved);
        println!("  💵 Chips wagered: {}", stats.engine.chips_wagered);
        println!("  💰 Chips paid out: {}", stats.engine.chips_paid_out);
        println!("  👥 Accounts: {}", stats.ledger.total_accounts);
        println!("  🏦 Chips in circulation: {}", stats.ledger.total_spendable);
        Ok(())
    }

    /// Execute the simulate command: scripted players, seeded draws,
    /// and a manual clock, so the same seed always produces the same
    /// table
    pub async fn simulate_command(rounds: u32, players: u32, seed: u64) -> Result<()> {
        println!(
            "🧪 Simulating {} rounds with {} players (seed {})",
            rounds, players, seed
        );
        println!();

        let config = EngineConfig {
            window_secs: 30,
            bet_cutoff_secs: 5,
            initial_period: Some(1),
            ..EngineConfig::default()
        };

        let (ledger, events) = BalanceLedger::new();
        let ledger = Arc::new(ledger);
        let writer = spawn_store_writer(Arc::new(MemoryAccountStore::new()), events);

        let mut names = Vec::new();
        for i in 0..players {
            let name = format!("sim-{}", i);
            ledger.open_account(&name, Chips::new(config.starting_balance))?;
            names.push(name);
        }

        let engine = GameEngine::new(config, ledger.clone(), Arc::new(SeededOutcomes::new(seed)))?;

        let selections = [
            Selection::Color(Color::Green),
            Selection::Color(Color::Violet),
            Selection::Color(Color::Red),
            Selection::Number(0),
            Selection::Number(3),
            Selection::Number(7),
        ];

        for round in 0..rounds as usize {
            for (i, name) in names.iter().enumerate() {
                let selection = selections[(round + i) % selections.len()];
                let amount = QUICK_BET_AMOUNTS[(round + i) % QUICK_BET_AMOUNTS.len()];
                if let Err(e) = engine.place_bet(name, selection, Chips::new(amount)).await {
                    warn!("Simulated bet rejected for {}: {}", name, e);
                }
            }

            let record = loop {
                if let Some(record) = engine.tick().await {
                    break record;
                }
            };
            println!(
                "  🎯 Period {}: drew {} ({}), {} staked, {} paid out",
                record.period,
                record.outcome.digit(),
                format_colors(record.outcome),
                record.total_wagered,
                record.total_paid_out
            );
        }

        println!();
        println!("🏁 Final balances:");
        for name in &names {
            let snapshot = ledger
                .snapshot(name)
                .ok_or_else(|| Error::InvalidState(format!("missing account for {}", name)))?;
            println!(
                "  👤 {}: {} chips ({} bets, {} chips won)",
                name, snapshot.spendable, snapshot.lifetime_bets, snapshot.lifetime_winnings
            );
        }

        let stats = engine.get_stats().await;
        println!();
        println!(
            "📊 {} rounds resolved, {} bets accepted, {} rejected, {} wagered, {} paid out",
            stats.rounds_resolved,
            stats.bets_accepted,
            stats.bets_rejected,
            stats.chips_wagered,
            stats.chips_paid_out
        );

        writer.abort();
        Ok(())
    }

    /// Print engine events as they happen. Runs until the channel
    /// closes, or until the given period resolves.
    async fn follow_rounds(engine: Arc<GameEngine>, until_period: Option<u64>) -> Result<()> {
        let mut events = engine.subscribe();
        loop {
            match events.recv().await {
                Ok(EngineEvent::RoundOpened {
                    period,
                    seconds_remaining,
                }) => {
                    println!("🟢 Period {} open ({}s to bet)", period, seconds_remaining);
                }
                Ok(EngineEvent::BettingLocked { period }) => {
                    println!("🔒 Period {} locked, drawing...", period);
                }
                Ok(EngineEvent::BetAccepted {
                    player,
                    selection,
                    amount,
                    ..
                }) => {
                    println!("💵 {} staked {} chips on {}", player, amount, selection);
                }
                Ok(EngineEvent::RoundResolved { record }) => {
                    println!(
                        "🎯 Period {} drew {} ({}), paid {} of {} wagered",
                        record.period,
                        record.outcome.digit(),
                        format_colors(record.outcome),
                        record.total_paid_out,
                        record.total_wagered
                    );
                    if until_period == Some(record.period) {
                        return Ok(());
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Display fell behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }

    fn format_colors(outcome: Outcome) -> String {
        outcome
            .colors()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// Validation utilities for commands
pub mod validation {
    use super::*;

    /// Validate bet amount against the configured table limits
    pub fn validate_bet_amount(amount: u64, min_bet: u64, max_bet: u64) -> Result<()> {
        if amount < min_bet {
            return Err(Error::InvalidBet(format!(
                "Minimum bet is {} chips",
                min_bet
            )));
        }

        if amount > max_bet {
            return Err(Error::InvalidBet(format!(
                "Maximum bet is {} chips",
                max_bet
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bet_amount_validation() {
        assert!(validation::validate_bet_amount(10, 1, 100).is_ok());
        assert!(validation::validate_bet_amount(0, 1, 100).is_err());
        assert!(validation::validate_bet_amount(200, 1, 100).is_err());
    }
}
