//! Round state machine and bet intake.
//!
//! A single `GameEngine` owns the current round behind a write lock, so
//! bet acceptance and the countdown clock are serialized: a bet is
//! either inside the round when it resolves or it was rejected, never
//! half admitted. Balance movement happens at the edges only, a debit
//! on intake and a credit on settlement, through the shared ledger.

pub mod history;
pub mod round;
pub mod scheduler;
pub mod settlement;

pub use history::{HistoryLog, HistoryRecord};
pub use round::{Bet, BetAck, Round, RoundPhase, RoundSnapshot};
pub use scheduler::Scheduler;
pub use settlement::{settle, PlayerSettlement, RoundSettlement};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::ledger::{BalanceLedger, Chips, PlayerId};
use crate::rng::OutcomeSource;
use crate::rules::{PayoutTable, Selection, OUTCOME_SPACE};

/// Engine lifecycle notifications, fanned out to every subscriber
#[derive(Debug, Clone)]
pub enum EngineEvent {
    RoundOpened {
        period: u64,
        seconds_remaining: u32,
    },
    BettingLocked {
        period: u64,
    },
    BetAccepted {
        period: u64,
        player: PlayerId,
        bet_id: Uuid,
        selection: Selection,
        amount: Chips,
    },
    RoundResolved {
        record: HistoryRecord,
    },
}

#[derive(Debug, Default)]
struct EngineCounters {
    bets_accepted: AtomicU64,
    bets_rejected: AtomicU64,
    rounds_resolved: AtomicU64,
    chips_wagered: AtomicU64,
    chips_paid_out: AtomicU64,
}

/// Point-in-time view of the engine for status displays
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub current_period: u64,
    pub phase: RoundPhase,
    pub seconds_remaining: u32,
    pub open_bets: usize,
    pub bets_accepted: u64,
    pub bets_rejected: u64,
    pub rounds_resolved: u64,
    pub chips_wagered: Chips,
    pub chips_paid_out: Chips,
}

/// The betting round engine. Cheap to share behind an `Arc`; all
/// methods take `&self`.
pub struct GameEngine {
    config: EngineConfig,
    ledger: Arc<BalanceLedger>,
    outcomes: Arc<dyn OutcomeSource>,
    table: PayoutTable,
    current: RwLock<Round>,
    history: RwLock<HistoryLog>,
    event_sender: broadcast::Sender<EngineEvent>,
    counters: EngineCounters,
}

impl GameEngine {
    /// Validate the configuration and open the first betting period.
    pub fn new(
        config: EngineConfig,
        ledger: Arc<BalanceLedger>,
        outcomes: Arc<dyn OutcomeSource>,
    ) -> Result<Self> {
        config.validate()?;

        let first_period = config.first_period();
        let round = Round::open(first_period, config.window_secs);
        let history = HistoryLog::new(config.history_depth);
        let (event_sender, _) = broadcast::channel(config.event_capacity);

        info!(
            "Engine ready at period {} ({}s window, betting locks at {}s)",
            first_period, config.window_secs, config.bet_cutoff_secs
        );

        Ok(Self {
            config,
            ledger,
            outcomes,
            table: PayoutTable::new(),
            current: RwLock::new(round),
            history: RwLock::new(history),
            event_sender,
            counters: EngineCounters::default(),
        })
    }

    /// Accept a wager into the current round, debiting the stake
    /// immediately. Rejected bets leave the balance untouched.
    pub async fn place_bet(
        &self,
        player: &PlayerId,
        selection: Selection,
        amount: Chips,
    ) -> Result<BetAck> {
        if let Selection::Number(digit) = selection {
            if digit >= OUTCOME_SPACE {
                return Err(self.track_rejection(Error::InvalidBet(format!(
                    "digit {} is outside the outcome space 0-{}",
                    digit,
                    OUTCOME_SPACE - 1
                ))));
            }
        }
        if amount.amount() < self.config.min_bet || amount.amount() > self.config.max_bet {
            return Err(self.track_rejection(Error::InvalidBet(format!(
                "stake {} outside allowed range {}-{}",
                amount, self.config.min_bet, self.config.max_bet
            ))));
        }

        let mut round = self.current.write().await;
        if !round.accepts_bets(self.config.bet_cutoff_secs) {
            return Err(self.track_rejection(Error::betting_closed_at(
                round.period,
                round.seconds_remaining,
            )));
        }

        // Debit while holding the round lock so a stake can never be
        // admitted into a round that has already resolved.
        self.ledger
            .debit(player, amount)
            .map_err(|e| self.track_rejection(e))?;

        let bet = Bet::new(player.clone(), selection, amount);
        let ack = BetAck {
            bet_id: bet.id,
            period: round.period,
            selection,
            amount,
        };
        round.push_bet(bet);

        self.counters.bets_accepted.fetch_add(1, Ordering::Relaxed);
        self.counters
            .chips_wagered
            .fetch_add(amount.amount(), Ordering::Relaxed);
        debug!(
            "Bet {} accepted: {} staked {} on {} in period {}",
            ack.bet_id, player, amount, selection, ack.period
        );
        let _ = self.event_sender.send(EngineEvent::BetAccepted {
            period: ack.period,
            player: player.clone(),
            bet_id: ack.bet_id,
            selection,
            amount,
        });

        Ok(ack)
    }

    /// Advance the countdown by one second. Locks the round at the
    /// cutoff, and at zero resolves it and opens the next period with a
    /// fresh window. Returns the resolution record when one happened.
    pub async fn tick(&self) -> Option<HistoryRecord> {
        let mut round = self.current.write().await;

        if round.seconds_remaining > 0 {
            round.seconds_remaining -= 1;
        }

        if round.phase == RoundPhase::Open
            && round.seconds_remaining <= self.config.bet_cutoff_secs
        {
            round.phase = RoundPhase::Locked;
            debug!(
                "Period {} locked with {}s remaining",
                round.period, round.seconds_remaining
            );
            let _ = self.event_sender.send(EngineEvent::BettingLocked {
                period: round.period,
            });
        }

        if round.seconds_remaining > 0 {
            return None;
        }

        let record = self.resolve_round(&mut round).await;

        let next_period = round.period + 1;
        *round = Round::open(next_period, self.config.window_secs);
        info!(
            "Period {} open for betting ({}s window)",
            next_period, self.config.window_secs
        );
        let _ = self.event_sender.send(EngineEvent::RoundOpened {
            period: next_period,
            seconds_remaining: round.seconds_remaining,
        });

        record
    }

    /// Draw the outcome, pay winners, and append the history record.
    /// A round that is already resolved is left alone.
    async fn resolve_round(&self, round: &mut Round) -> Option<HistoryRecord> {
        if round.phase == RoundPhase::Resolved {
            return None;
        }

        let outcome = self.outcomes.next_outcome();
        round.phase = RoundPhase::Resolved;
        round.outcome = Some(outcome);

        let bets = round.take_bets();
        let settlement = settle(&self.table, &bets, outcome);

        for player in &settlement.players {
            // Tally first so a winner's final balance event carries the
            // settled aggregates.
            self.ledger.record_bets(&player.player, player.bet_count);
            if !player.won.is_zero() {
                self.ledger.credit(&player.player, player.won);
            }
        }

        let record = HistoryRecord {
            period: round.period,
            outcome,
            resolved_at: Utc::now(),
            total_wagered: settlement.total_wagered,
            total_paid_out: settlement.total_paid_out,
            bets: bets.len(),
        };

        self.counters.rounds_resolved.fetch_add(1, Ordering::Relaxed);
        self.counters
            .chips_paid_out
            .fetch_add(settlement.total_paid_out.amount(), Ordering::Relaxed);

        let colors: Vec<String> = outcome.colors().iter().map(|c| c.to_string()).collect();
        info!(
            "Period {} resolved: outcome {} ({}), {} bets, {} wagered, {} paid out",
            round.period,
            outcome.digit(),
            colors.join("+"),
            bets.len(),
            settlement.total_wagered,
            settlement.total_paid_out
        );

        self.history.write().await.push(record.clone());
        let _ = self.event_sender.send(EngineEvent::RoundResolved {
            record: record.clone(),
        });

        Some(record)
    }

    fn track_rejection(&self, err: Error) -> Error {
        self.counters.bets_rejected.fetch_add(1, Ordering::Relaxed);
        err
    }

    /// Subscribe to engine lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_sender.subscribe()
    }

    pub async fn round_snapshot(&self) -> RoundSnapshot {
        self.current.read().await.snapshot()
    }

    /// Recently resolved rounds, newest first
    pub async fn history(&self) -> Vec<HistoryRecord> {
        self.history.read().await.recent()
    }

    pub async fn get_stats(&self) -> EngineStats {
        let round = self.current.read().await;
        EngineStats {
            current_period: round.period,
            phase: round.phase,
            seconds_remaining: round.seconds_remaining,
            open_bets: round.bet_count(),
            bets_accepted: self.counters.bets_accepted.load(Ordering::Relaxed),
            bets_rejected: self.counters.bets_rejected.load(Ordering::Relaxed),
            rounds_resolved: self.counters.rounds_resolved.load(Ordering::Relaxed),
            chips_wagered: Chips::new(self.counters.chips_wagered.load(Ordering::Relaxed)),
            chips_paid_out: Chips::new(self.counters.chips_paid_out.load(Ordering::Relaxed)),
        }
    }

    pub fn ledger(&self) -> &Arc<BalanceLedger> {
        &self.ledger
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::FixedOutcomes;
    use crate::rules::Color;

    fn test_config(window: u32, cutoff: u32) -> EngineConfig {
        EngineConfig {
            window_secs: window,
            bet_cutoff_secs: cutoff,
            initial_period: Some(100),
            ..EngineConfig::default()
        }
    }

    fn test_engine(outcomes: Vec<u8>) -> (GameEngine, Arc<BalanceLedger>) {
        let (ledger, _events) = BalanceLedger::new();
        let ledger = Arc::new(ledger);
        let engine = GameEngine::new(
            test_config(3, 1),
            ledger.clone(),
            Arc::new(FixedOutcomes::new(outcomes).unwrap()),
        )
        .unwrap();
        (engine, ledger)
    }

    fn fund(ledger: &BalanceLedger, player: &str, amount: u64) -> PlayerId {
        let player = player.to_string();
        ledger.open_account(&player, Chips::new(amount)).unwrap();
        player
    }

    #[tokio::test]
    async fn test_accepted_bet_debits_stake_into_round() {
        let (engine, ledger) = test_engine(vec![7]);
        let alice = fund(&ledger, "alice", 10_000);

        let ack = engine
            .place_bet(&alice, Selection::Number(7), Chips::new(100))
            .await
            .unwrap();

        assert_eq!(ack.period, 100);
        assert_eq!(ledger.balance(&alice), Chips::new(9_900));

        let snapshot = engine.round_snapshot().await;
        assert_eq!(snapshot.bet_count, 1);
        assert_eq!(snapshot.total_staked, Chips::new(100));
    }

    #[tokio::test]
    async fn test_exact_number_win_pays_nine_to_one() {
        let (engine, ledger) = test_engine(vec![7]);
        let alice = fund(&ledger, "alice", 10_000);

        engine
            .place_bet(&alice, Selection::Number(7), Chips::new(100))
            .await
            .unwrap();

        let record = loop {
            if let Some(record) = engine.tick().await {
                break record;
            }
        };

        assert_eq!(record.outcome.digit(), 7);
        assert_eq!(record.total_wagered, Chips::new(100));
        assert_eq!(record.total_paid_out, Chips::new(900));
        assert_eq!(ledger.balance(&alice), Chips::new(10_800));

        let snapshot = ledger.snapshot(&alice).unwrap();
        assert_eq!(snapshot.lifetime_winnings, Chips::new(900));
        assert_eq!(snapshot.lifetime_bets, 1);
    }

    #[tokio::test]
    async fn test_losing_stake_is_deducted_exactly_once() {
        let (engine, ledger) = test_engine(vec![8]);
        let alice = fund(&ledger, "alice", 10_000);

        engine
            .place_bet(&alice, Selection::Number(3), Chips::new(200))
            .await
            .unwrap();

        for _ in 0..3 {
            engine.tick().await;
        }

        assert_eq!(ledger.balance(&alice), Chips::new(9_800));
        let snapshot = ledger.snapshot(&alice).unwrap();
        assert_eq!(snapshot.lifetime_winnings, Chips::ZERO);
        assert_eq!(snapshot.lifetime_bets, 1);
    }

    #[tokio::test]
    async fn test_window_boundary_rejects_at_cutoff() {
        let (ledger, _events) = BalanceLedger::new();
        let ledger = Arc::new(ledger);
        let engine = GameEngine::new(
            test_config(5, 2),
            ledger.clone(),
            Arc::new(FixedOutcomes::new(vec![0]).unwrap()),
        )
        .unwrap();
        let alice = fund(&ledger, "alice", 1_000);

        // 5s -> 4s -> 3s, one second above the cutoff: still open
        engine.tick().await;
        engine.tick().await;
        engine
            .place_bet(&alice, Selection::Color(Color::Red), Chips::new(10))
            .await
            .unwrap();

        // 3s -> 2s, exactly at the cutoff: locked
        engine.tick().await;
        let err = engine
            .place_bet(&alice, Selection::Color(Color::Red), Chips::new(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BettingClosed(_)));
        assert_eq!(ledger.balance(&alice), Chips::new(990));

        let stats = engine.get_stats().await;
        assert_eq!(stats.bets_accepted, 1);
        assert_eq!(stats.bets_rejected, 1);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_balance_unchanged() {
        let (engine, ledger) = test_engine(vec![0]);
        let bob = fund(&ledger, "bob", 40);

        let err = engine
            .place_bet(&bob, Selection::Color(Color::Green), Chips::new(50))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InsufficientFunds(_)));
        assert_eq!(ledger.balance(&bob), Chips::new(40));
        assert_eq!(engine.round_snapshot().await.bet_count, 0);
    }

    #[tokio::test]
    async fn test_out_of_range_digit_rejected() {
        let (engine, ledger) = test_engine(vec![0]);
        let alice = fund(&ledger, "alice", 1_000);

        let err = engine
            .place_bet(&alice, Selection::Number(12), Chips::new(10))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidBet(_)));
        assert_eq!(ledger.balance(&alice), Chips::new(1_000));
    }

    #[tokio::test]
    async fn test_stake_bounds_enforced() {
        let (engine, ledger) = test_engine(vec![0]);
        let alice = fund(&ledger, "alice", 1_000);

        let too_small = engine
            .place_bet(&alice, Selection::Number(1), Chips::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(too_small, Error::InvalidBet(_)));

        let too_large = engine
            .place_bet(&alice, Selection::Number(1), Chips::new(2_000_000))
            .await
            .unwrap_err();
        assert!(matches!(too_large, Error::InvalidBet(_)));

        assert_eq!(ledger.balance(&alice), Chips::new(1_000));
    }

    #[tokio::test]
    async fn test_round_resolves_exactly_once() {
        let (engine, _ledger) = test_engine(vec![4, 9]);

        let mut round = engine.current.write().await;
        let first = engine.resolve_round(&mut round).await;
        let second = engine.resolve_round(&mut round).await;

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(engine.counters.rounds_resolved.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_next_period_opens_with_full_window() {
        let (engine, _ledger) = test_engine(vec![2]);

        for _ in 0..3 {
            engine.tick().await;
        }

        let snapshot = engine.round_snapshot().await;
        assert_eq!(snapshot.period, 101);
        assert_eq!(snapshot.phase, RoundPhase::Open);
        assert_eq!(snapshot.seconds_remaining, 3);
        assert_eq!(snapshot.bet_count, 0);
    }

    #[tokio::test]
    async fn test_dual_digit_pays_both_color_sides() {
        let (engine, ledger) = test_engine(vec![0]);
        let alice = fund(&ledger, "alice", 10_000);
        let bob = fund(&ledger, "bob", 10_000);

        engine
            .place_bet(&alice, Selection::Color(Color::Green), Chips::new(100))
            .await
            .unwrap();
        engine
            .place_bet(&bob, Selection::Color(Color::Violet), Chips::new(100))
            .await
            .unwrap();

        for _ in 0..3 {
            engine.tick().await;
        }

        // Outcome 0 is violet and green: x2 for green, x4.5 for violet
        assert_eq!(ledger.balance(&alice), Chips::new(10_100));
        assert_eq!(ledger.balance(&bob), Chips::new(10_350));
    }

    #[tokio::test]
    async fn test_history_retains_recent_rounds_newest_first() {
        let (engine, _ledger) = test_engine(vec![1, 2, 3]);

        for _ in 0..9 {
            engine.tick().await;
        }

        let history = engine.history().await;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].period, 102);
        assert_eq!(history[0].outcome.digit(), 3);
        assert_eq!(history[2].period, 100);
        assert_eq!(history[2].outcome.digit(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_events_broadcast() {
        let (engine, ledger) = test_engine(vec![5]);
        let alice = fund(&ledger, "alice", 1_000);
        let mut events = engine.subscribe();

        engine
            .place_bet(&alice, Selection::Number(5), Chips::new(10))
            .await
            .unwrap();
        for _ in 0..3 {
            engine.tick().await;
        }

        let mut saw_accept = false;
        let mut saw_lock = false;
        let mut saw_resolve = false;
        let mut saw_open = false;
        while let Ok(event) = events.try_recv() {
            match event {
                EngineEvent::BetAccepted { period, .. } => {
                    assert_eq!(period, 100);
                    saw_accept = true;
                }
                EngineEvent::BettingLocked { period } => {
                    assert_eq!(period, 100);
                    saw_lock = true;
                }
                EngineEvent::RoundResolved { record } => {
                    assert_eq!(record.outcome.digit(), 5);
                    saw_resolve = true;
                }
                EngineEvent::RoundOpened { period, .. } => {
                    assert_eq!(period, 101);
                    saw_open = true;
                }
            }
        }
        assert!(saw_accept && saw_lock && saw_resolve && saw_open);
    }
}
