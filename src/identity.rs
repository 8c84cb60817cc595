//! Local player identity.
//!
//! A profile is either named explicitly or generated once and stored in
//! the data directory, so the same account is found again on restart.

use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ledger::PlayerId;

const IDENTITY_FILE: &str = "identity.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    pub display_name: String,
    /// Set by an external identity provider; the local provider has none
    #[serde(default)]
    pub email: Option<String>,
}

impl PlayerProfile {
    /// Named profiles are keyed by the name itself, so a nickname maps
    /// to the same account from any data directory.
    pub fn named(nickname: &str) -> Self {
        Self {
            player_id: nickname.to_string(),
            display_name: nickname.to_string(),
            email: None,
        }
    }

    fn generated() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self {
            player_id: format!("player-{}", hex),
            display_name: format!("guest-{}", &hex[..8]),
            email: None,
        }
    }
}

/// Resolve the local profile: an explicit nickname wins, otherwise the
/// profile stored in the data directory, otherwise a fresh one that is
/// written back for next time.
pub async fn load_or_create(data_dir: &Path, nickname: Option<&str>) -> Result<PlayerProfile> {
    if let Some(nickname) = nickname {
        let trimmed = nickname.trim();
        if trimmed.is_empty() {
            return Err(Error::Config("nickname must not be blank".to_string()));
        }
        debug!("Using named profile {}", trimmed);
        return Ok(PlayerProfile::named(trimmed));
    }

    let path = data_dir.join(IDENTITY_FILE);
    if path.exists() {
        let data = fs::read_to_string(&path).await?;
        let profile: PlayerProfile = serde_json::from_str(&data)
            .map_err(|e| Error::Persistence(format!("corrupt identity file: {}", e)))?;
        debug!("Loaded stored profile {}", profile.player_id);
        return Ok(profile);
    }

    if !data_dir.exists() {
        fs::create_dir_all(data_dir).await?;
    }
    let profile = PlayerProfile::generated();
    let data = serde_json::to_string_pretty(&profile)?;
    fs::write(&path, data).await?;
    info!("Created new player profile {}", profile.player_id);
    Ok(profile)
}
