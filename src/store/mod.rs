//! Account persistence.
//!
//! The ledger never blocks on disk: balance mutations stream onto an
//! unbounded channel and a background writer applies them through an
//! [`AccountStore`]. A write that fails is logged and dropped; the
//! in-memory ledger stays the source of truth for the session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, warn};
use tokio::fs;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::ledger::{AccountSnapshot, LedgerEvent, PlayerId};

/// Durable storage for account snapshots
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn load_balance(&self, player: &PlayerId) -> Result<Option<AccountSnapshot>>;
    async fn save_balance(&self, player: &PlayerId, snapshot: AccountSnapshot) -> Result<()>;
}

/// All account snapshots in one JSON map file under the data directory
pub struct JsonAccountStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    file_lock: Mutex<()>,
}

impl JsonAccountStore {
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).await.map_err(|e| {
                Error::Persistence(format!("failed to create data directory: {}", e))
            })?;
        }

        Ok(Self {
            path: data_dir.join("accounts.json"),
            file_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<HashMap<PlayerId, AccountSnapshot>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let data = fs::read_to_string(&self.path).await?;
        let accounts = serde_json::from_str(&data)
            .map_err(|e| Error::Persistence(format!("corrupt account file: {}", e)))?;
        Ok(accounts)
    }

    async fn write_map(&self, accounts: &HashMap<PlayerId, AccountSnapshot>) -> Result<()> {
        let data = serde_json::to_string_pretty(accounts)?;
        // Sidecar write plus rename so a crash never truncates the live
        // file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for JsonAccountStore {
    async fn load_balance(&self, player: &PlayerId) -> Result<Option<AccountSnapshot>> {
        let _guard = self.file_lock.lock().await;
        Ok(self.read_map().await?.get(player).copied())
    }

    async fn save_balance(&self, player: &PlayerId, snapshot: AccountSnapshot) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        let mut accounts = match self.read_map().await {
            Ok(accounts) => accounts,
            Err(Error::Persistence(e)) => {
                warn!("Replacing unreadable account file: {}", e);
                HashMap::new()
            }
            Err(e) => return Err(e),
        };
        accounts.insert(player.clone(), snapshot);
        self.write_map(&accounts).await
    }
}

/// In-memory store for tests and simulations
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: DashMap<PlayerId, AccountSnapshot>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn load_balance(&self, player: &PlayerId) -> Result<Option<AccountSnapshot>> {
        Ok(self.accounts.get(player).map(|entry| *entry.value()))
    }

    async fn save_balance(&self, player: &PlayerId, snapshot: AccountSnapshot) -> Result<()> {
        self.accounts.insert(player.clone(), snapshot);
        Ok(())
    }
}

/// Drain ledger events into the store in the background. Failed writes
/// are logged and dropped, never retried.
pub fn spawn_store_writer(
    store: Arc<dyn AccountStore>,
    mut events: mpsc::UnboundedReceiver<LedgerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                LedgerEvent::AccountOpened { player, opening } => {
                    debug!("Account opened for {} with {} chips", player, opening);
                }
                LedgerEvent::BalanceUpdated { player, snapshot } => {
                    if let Err(e) = store.save_balance(&player, snapshot).await {
                        warn!("Failed to persist balance for {}: {}", player, e);
                    }
                }
            }
        }
        debug!("Store writer stopped: ledger event stream closed");
    })
}
