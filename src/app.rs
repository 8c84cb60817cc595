//! Main VyFun application coordinator
//!
//! Assembles the subsystems for a local session: durable account store,
//! player identity, chip ledger, and the betting round engine with its
//! countdown scheduler.

use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::engine::{BetAck, EngineStats, GameEngine, HistoryRecord, RoundSnapshot, Scheduler};
use crate::error::Result;
use crate::identity::{self, PlayerProfile};
use crate::ledger::{AccountSnapshot, BalanceLedger, Chips, LedgerStats, PlayerId};
use crate::rng::{OutcomeSource, ThreadRngOutcomes};
use crate::rules::Selection;
use crate::store::{spawn_store_writer, AccountStore, JsonAccountStore};

/// Main VyFun application coordinator
pub struct VyFunApp {
    /// Local player profile
    pub profile: PlayerProfile,

    /// Application configuration
    pub config: AppConfig,

    /// Betting round engine
    pub engine: Arc<GameEngine>,

    /// Chip ledger shared with the engine
    pub ledger: Arc<BalanceLedger>,

    scheduler: Option<Scheduler>,
    store_writer: Option<JoinHandle<()>>,
}

/// Combined session statistics for status displays
#[derive(Debug, Clone)]
pub struct AppStats {
    pub player_id: PlayerId,
    pub engine: EngineStats,
    pub ledger: LedgerStats,
}

impl VyFunApp {
    /// Create a new VyFun application instance. Opens the account
    /// store, resolves the local profile, and hydrates the ledger
    /// before the first round opens.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn AccountStore> =
            Arc::new(JsonAccountStore::open(&config.data_dir).await?);

        let profile =
            identity::load_or_create(Path::new(&config.data_dir), config.nickname.as_deref())
                .await?;

        let (ledger, ledger_events) = BalanceLedger::new();
        let ledger = Arc::new(ledger);

        match store.load_balance(&profile.player_id).await {
            Ok(Some(snapshot)) => {
                ledger.restore_account(&profile.player_id, snapshot);
                info!(
                    "Restored {} at {} chips",
                    profile.player_id, snapshot.spendable
                );
            }
            Ok(None) => {
                let snapshot = ledger.open_account(
                    &profile.player_id,
                    Chips::new(config.engine.starting_balance),
                )?;
                info!(
                    "Granted {} an opening balance of {} chips",
                    profile.player_id, snapshot.spendable
                );
            }
            Err(e) => {
                warn!("Could not read stored balance ({}); starting fresh", e);
                ledger.open_account(
                    &profile.player_id,
                    Chips::new(config.engine.starting_balance),
                )?;
            }
        }

        let store_writer = spawn_store_writer(store, ledger_events);

        let outcomes: Arc<dyn OutcomeSource> = Arc::new(ThreadRngOutcomes);
        let engine = Arc::new(GameEngine::new(
            config.engine.clone(),
            ledger.clone(),
            outcomes,
        )?);

        Ok(Self {
            profile,
            config,
            engine,
            ledger,
            scheduler: None,
            store_writer: Some(store_writer),
        })
    }

    /// Start the round clock
    pub async fn start(&mut self) -> Result<()> {
        info!(
            "Starting VyFun application for player {}",
            self.profile.player_id
        );

        self.scheduler = Some(Scheduler::spawn(
            self.engine.clone(),
            self.config.engine.tick_interval,
        ));

        info!("VyFun application started");
        Ok(())
    }

    /// Stop the application. Pending persistence writes are dropped.
    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping VyFun application");

        if let Some(scheduler) = self.scheduler.take() {
            scheduler.shutdown();
        }
        if let Some(writer) = self.store_writer.take() {
            writer.abort();
        }

        info!("VyFun application stopped");
        Ok(())
    }

    /// Place a bet for the local player in the current round
    pub async fn place_bet(&self, selection: Selection, amount: Chips) -> Result<BetAck> {
        self.engine
            .place_bet(&self.profile.player_id, selection, amount)
            .await
    }

    /// Get the local player's spendable balance
    pub fn balance(&self) -> Chips {
        self.ledger.balance(&self.profile.player_id)
    }

    /// Get the local player's full account view
    pub fn account(&self) -> Option<AccountSnapshot> {
        self.ledger.snapshot(&self.profile.player_id)
    }

    pub async fn round_snapshot(&self) -> RoundSnapshot {
        self.engine.round_snapshot().await
    }

    pub async fn history(&self) -> Vec<HistoryRecord> {
        self.engine.history().await
    }

    pub async fn get_stats(&self) -> AppStats {
        AppStats {
            player_id: self.profile.player_id.clone(),
            engine: self.engine.get_stats().await,
            ledger: self.ledger.get_stats(),
        }
    }
}
