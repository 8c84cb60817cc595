//! Account persistence integration tests
//!
//! Validates the JSON account store, session hydration through
//! VyFunApp, and that a broken store never disturbs live balances.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use vyfun::store::spawn_store_writer;
use vyfun::{
    AccountSnapshot, AccountStore, AppConfig, BalanceLedger, Chips, EngineConfig, Error,
    FixedOutcomes, GameEngine, JsonAccountStore, PlayerId, Result, Selection, VyFunApp,
};

fn app_config(dir: &std::path::Path) -> AppConfig {
    AppConfig {
        data_dir: dir.to_string_lossy().into_owned(),
        nickname: Some("tester".to_string()),
        engine: EngineConfig {
            initial_period: Some(1),
            ..EngineConfig::default()
        },
    }
}

async fn wait_for_balance(
    store: &JsonAccountStore,
    player: &PlayerId,
    expected: Chips,
) -> Option<AccountSnapshot> {
    for _ in 0..100 {
        if let Ok(Some(snapshot)) = store.load_balance(player).await {
            if snapshot.spendable == expected {
                return Some(snapshot);
            }
        }
        sleep(Duration::from_millis(10)).await;
    }
    None
}

#[tokio::test]
async fn test_opening_grant_reaches_disk() {
    let dir = tempfile::tempdir().unwrap();
    let app = VyFunApp::new(app_config(dir.path())).await.unwrap();
    assert_eq!(app.balance(), Chips::new(10_000));

    let store = JsonAccountStore::open(dir.path()).await.unwrap();
    let persisted = wait_for_balance(&store, &app.profile.player_id, Chips::new(10_000)).await;
    assert!(persisted.is_some(), "grant should be persisted");
}

#[tokio::test]
async fn test_session_hydrates_from_stored_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let tester = "tester".to_string();

    let store = JsonAccountStore::open(dir.path()).await.unwrap();
    store
        .save_balance(
            &tester,
            AccountSnapshot {
                spendable: Chips::new(7_777),
                lifetime_bets: 12,
                lifetime_winnings: Chips::new(3_400),
            },
        )
        .await
        .unwrap();

    let app = VyFunApp::new(app_config(dir.path())).await.unwrap();
    assert_eq!(app.balance(), Chips::new(7_777));

    let account = app.account().unwrap();
    assert_eq!(account.lifetime_bets, 12);
    assert_eq!(account.lifetime_winnings, Chips::new(3_400));
}

#[tokio::test]
async fn test_corrupt_store_falls_back_to_fresh_grant() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("accounts.json"), "not json at all").unwrap();

    let app = VyFunApp::new(app_config(dir.path())).await.unwrap();
    assert_eq!(app.balance(), Chips::new(10_000));

    // The writer replaces the unreadable file with the fresh grant
    let store = JsonAccountStore::open(dir.path()).await.unwrap();
    let persisted = wait_for_balance(&store, &app.profile.player_id, Chips::new(10_000)).await;
    assert!(persisted.is_some(), "grant should replace the corrupt file");
}

#[tokio::test]
async fn test_round_settlement_reaches_disk() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonAccountStore::open(dir.path()).await?);

    let (ledger, events) = BalanceLedger::new();
    let ledger = Arc::new(ledger);
    let writer = spawn_store_writer(store.clone(), events);

    let alice = "alice".to_string();
    ledger.open_account(&alice, Chips::new(10_000))?;

    let config = EngineConfig {
        window_secs: 3,
        bet_cutoff_secs: 1,
        initial_period: Some(1),
        ..EngineConfig::default()
    };
    let engine = GameEngine::new(
        config,
        ledger.clone(),
        Arc::new(FixedOutcomes::new(vec![7])?),
    )?;

    engine
        .place_bet(&alice, Selection::Number(7), Chips::new(100))
        .await?;
    while engine.tick().await.is_none() {}

    let persisted = wait_for_balance(&store, &alice, Chips::new(10_800)).await;
    let persisted = persisted.expect("settled balance should be persisted");
    assert_eq!(persisted.lifetime_winnings, Chips::new(900));
    assert_eq!(persisted.lifetime_bets, 1);

    writer.abort();
    Ok(())
}

struct FailingStore;

#[async_trait]
impl AccountStore for FailingStore {
    async fn load_balance(&self, _player: &PlayerId) -> Result<Option<AccountSnapshot>> {
        Err(Error::Persistence("store offline".to_string()))
    }

    async fn save_balance(&self, _player: &PlayerId, _snapshot: AccountSnapshot) -> Result<()> {
        Err(Error::Persistence("store offline".to_string()))
    }
}

#[tokio::test]
async fn test_failing_store_never_disturbs_balances() -> Result<()> {
    let (ledger, events) = BalanceLedger::new();
    let ledger = Arc::new(ledger);
    let writer = spawn_store_writer(Arc::new(FailingStore), events);

    let alice = "alice".to_string();
    ledger.open_account(&alice, Chips::new(1_000))?;
    ledger.debit(&alice, Chips::new(300))?;
    ledger.credit(&alice, Chips::new(50));

    // Let the writer chew through the failing saves
    sleep(Duration::from_millis(50)).await;

    assert_eq!(ledger.balance(&alice), Chips::new(750));
    assert!(!writer.is_finished(), "writer should survive store errors");

    writer.abort();
    Ok(())
}
