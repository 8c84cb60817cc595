//! Balance ledger for VyFun chips.
//!
//! This module implements the chip accounting system:
//! - Per-player spendable balances with overdraw rejection
//! - Lifetime aggregates (bets settled, chips won)
//! - Change events for the persistence side channel
//!
//! Accounts live in a sharded concurrent map, so mutations for the same
//! player are serialized by the entry lock while different players proceed
//! in parallel. Every mutation emits a [`LedgerEvent`] carrying the fresh
//! snapshot; the store writer persists those fire-and-forget.

use std::fmt;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Opaque player key supplied by the identity provider
pub type PlayerId = String;

/// Integer chip amount
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Chips(u64);

impl Chips {
    pub const ZERO: Chips = Chips(0);

    pub const fn new(amount: u64) -> Self {
        Chips(amount)
    }

    pub fn amount(&self) -> u64 {
        self.0
    }

    pub fn checked_sub(&self, other: Chips) -> Option<Chips> {
        self.0.checked_sub(other.0).map(Chips)
    }

    pub fn saturating_add(&self, other: Chips) -> Chips {
        Chips(self.0.saturating_add(other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Chips {
    fn from(amount: u64) -> Self {
        Chips(amount)
    }
}

impl fmt::Display for Chips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub player_id: PlayerId,
    pub spendable: Chips,
    pub lifetime_bets: u64,
    pub lifetime_winnings: Chips,
    pub last_activity: i64,
}

impl Account {
    fn new(player_id: PlayerId, opening: Chips) -> Self {
        Self {
            player_id,
            spendable: opening,
            lifetime_bets: 0,
            lifetime_winnings: Chips::ZERO,
            last_activity: Utc::now().timestamp(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now().timestamp();
    }

    fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            spendable: self.spendable,
            lifetime_bets: self.lifetime_bets,
            lifetime_winnings: self.lifetime_winnings,
        }
    }
}

/// Read-only account view; also the shape the account store persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub spendable: Chips,
    pub lifetime_bets: u64,
    pub lifetime_winnings: Chips,
}

/// Ledger events for the persistence side channel
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    AccountOpened { player: PlayerId, opening: Chips },
    BalanceUpdated {
        player: PlayerId,
        snapshot: AccountSnapshot,
    },
}

/// Ledger managing all player chip accounts
pub struct BalanceLedger {
    accounts: DashMap<PlayerId, Account>,
    event_sender: mpsc::UnboundedSender<LedgerEvent>,
}

impl BalanceLedger {
    /// Create a ledger and the event stream its mutations feed
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LedgerEvent>) {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        (
            Self {
                accounts: DashMap::new(),
                event_sender,
            },
            event_receiver,
        )
    }

    /// Create a new account with the opening grant
    pub fn open_account(&self, player: &PlayerId, opening: Chips) -> Result<AccountSnapshot> {
        match self.accounts.entry(player.clone()) {
            Entry::Occupied(_) => Err(Error::InvalidState(format!(
                "account {} already exists",
                player
            ))),
            Entry::Vacant(slot) => {
                let account = Account::new(player.clone(), opening);
                let snapshot = account.snapshot();
                slot.insert(account);
                debug!("opened account {} with {} chips", player, opening);
                let _ = self.event_sender.send(LedgerEvent::AccountOpened {
                    player: player.clone(),
                    opening,
                });
                let _ = self.event_sender.send(LedgerEvent::BalanceUpdated {
                    player: player.clone(),
                    snapshot,
                });
                Ok(snapshot)
            }
        }
    }

    /// Install a previously persisted snapshot at session start.
    /// Emits no event: the snapshot came from the store.
    pub fn restore_account(&self, player: &PlayerId, snapshot: AccountSnapshot) {
        let account = Account {
            player_id: player.clone(),
            spendable: snapshot.spendable,
            lifetime_bets: snapshot.lifetime_bets,
            lifetime_winnings: snapshot.lifetime_winnings,
            last_activity: Utc::now().timestamp(),
        };
        self.accounts.insert(player.clone(), account);
        debug!("restored account {} at {} chips", player, snapshot.spendable);
    }

    /// Deduct a wager from the player's spendable balance.
    /// The lifetime bet tally is batched per round; see [`record_bets`].
    ///
    /// [`record_bets`]: BalanceLedger::record_bets
    pub fn debit(&self, player: &PlayerId, amount: Chips) -> Result<AccountSnapshot> {
        let mut account = self
            .accounts
            .get_mut(player)
            .ok_or_else(|| Error::InvalidState(format!("no account for player {}", player)))?;

        let remaining = account.spendable.checked_sub(amount).ok_or_else(|| {
            Error::insufficient_funds_for("bet", amount.amount(), account.spendable.amount())
        })?;
        account.spendable = remaining;
        account.touch();
        let snapshot = account.snapshot();
        drop(account);

        let _ = self.event_sender.send(LedgerEvent::BalanceUpdated {
            player: player.clone(),
            snapshot,
        });
        Ok(snapshot)
    }

    /// Credit winnings to the player; counts toward lifetime winnings.
    /// Never fails: settlement computes the amount and it is always owed.
    pub fn credit(&self, player: &PlayerId, amount: Chips) -> AccountSnapshot {
        let mut account = self
            .accounts
            .entry(player.clone())
            .or_insert_with(|| Account::new(player.clone(), Chips::ZERO));
        account.spendable = account.spendable.saturating_add(amount);
        account.lifetime_winnings = account.lifetime_winnings.saturating_add(amount);
        account.touch();
        let snapshot = account.snapshot();
        drop(account);

        let _ = self.event_sender.send(LedgerEvent::BalanceUpdated {
            player: player.clone(),
            snapshot,
        });
        snapshot
    }

    /// Apply the round's batched bet tally to the lifetime counter
    pub fn record_bets(&self, player: &PlayerId, count: u64) -> AccountSnapshot {
        let mut account = self
            .accounts
            .entry(player.clone())
            .or_insert_with(|| Account::new(player.clone(), Chips::ZERO));
        account.lifetime_bets += count;
        account.touch();
        let snapshot = account.snapshot();
        drop(account);

        let _ = self.event_sender.send(LedgerEvent::BalanceUpdated {
            player: player.clone(),
            snapshot,
        });
        snapshot
    }

    /// Spendable balance, zero for unknown players
    pub fn balance(&self, player: &PlayerId) -> Chips {
        self.accounts
            .get(player)
            .map(|account| account.spendable)
            .unwrap_or(Chips::ZERO)
    }

    /// Full account view, if the account exists
    pub fn snapshot(&self, player: &PlayerId) -> Option<AccountSnapshot> {
        self.accounts.get(player).map(|account| account.snapshot())
    }

    pub fn has_account(&self, player: &PlayerId) -> bool {
        self.accounts.contains_key(player)
    }

    /// Ledger-wide totals for monitoring
    pub fn get_stats(&self) -> LedgerStats {
        let mut stats = LedgerStats {
            total_accounts: 0,
            total_spendable: Chips::ZERO,
            total_lifetime_winnings: Chips::ZERO,
            total_lifetime_bets: 0,
        };
        for account in self.accounts.iter() {
            stats.total_accounts += 1;
            stats.total_spendable = stats.total_spendable.saturating_add(account.spendable);
            stats.total_lifetime_winnings = stats
                .total_lifetime_winnings
                .saturating_add(account.lifetime_winnings);
            stats.total_lifetime_bets += account.lifetime_bets;
        }
        stats
    }
}

/// Ledger statistics
#[derive(Debug, Clone)]
pub struct LedgerStats {
    pub total_accounts: usize,
    pub total_spendable: Chips,
    pub total_lifetime_winnings: Chips,
    pub total_lifetime_bets: u64,
}
