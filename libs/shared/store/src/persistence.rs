use std::path::{Path, PathBuf};

use async_trait::async_trait;
use swarm_domain::{Campaign, OAuthToken};
use tracing::warn;

use crate::error::StoreError;

/// Durable mirror for campaign and OAuth token state.
///
/// Any key/value or JSON-file store satisfies this trait; [`JsonFileSink`]
/// is the reference implementation, writing one JSON document per campaign
/// and per linked user under a configured root directory.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn save_campaign(&self, campaign: &Campaign) -> Result<(), StoreError>;
    async fn load_all_campaigns(&self) -> Result<Vec<Campaign>, StoreError>;
    async fn save_oauth_token(&self, token: &OAuthToken) -> Result<(), StoreError>;
    async fn load_all_oauth_tokens(&self) -> Result<Vec<OAuthToken>, StoreError>;
    async fn delete_oauth_token(&self, user_id: &str) -> Result<(), StoreError>;
}

/// Flat-file JSON persistence sink. Good enough for a single-process
/// deployment; a production rollout could swap this for a real key/value
/// store behind the same trait without touching callers.
pub struct JsonFileSink {
    root: PathBuf,
}

impl JsonFileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn campaigns_dir(&self) -> PathBuf {
        self.root.join("campaigns")
    }

    fn oauth_dir(&self) -> PathBuf {
        self.root.join("oauth")
    }

    async fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StoreError::Persistence(e.to_string()))
    }

    async fn read_all_json<T: serde::de::DeserializeOwned>(
        dir: &Path,
    ) -> Result<Vec<T>, StoreError> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Persistence(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| StoreError::Persistence(e.to_string()))?;
            match serde_json::from_str(&raw) {
                Ok(value) => out.push(value),
                Err(e) => warn!("skipping malformed persisted document {:?}: {}", path, e),
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl PersistenceSink for JsonFileSink {
    async fn save_campaign(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let dir = self.campaigns_dir();
        Self::ensure_dir(&dir).await?;
        let path = dir.join(format!("{}.json", campaign.campaign_id));
        let raw = serde_json::to_string_pretty(campaign)
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        tokio::fs::write(path, raw)
            .await
            .map_err(|e| StoreError::Persistence(e.to_string()))
    }

    async fn load_all_campaigns(&self) -> Result<Vec<Campaign>, StoreError> {
        Self::read_all_json(&self.campaigns_dir()).await
    }

    async fn save_oauth_token(&self, token: &OAuthToken) -> Result<(), StoreError> {
        let dir = self.oauth_dir();
        Self::ensure_dir(&dir).await?;
        let path = dir.join(format!("{}.json", token.user_id));
        let raw = serde_json::to_string_pretty(token)
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        tokio::fs::write(path, raw)
            .await
            .map_err(|e| StoreError::Persistence(e.to_string()))
    }

    async fn load_all_oauth_tokens(&self) -> Result<Vec<OAuthToken>, StoreError> {
        Self::read_all_json(&self.oauth_dir()).await
    }

    async fn delete_oauth_token(&self, user_id: &str) -> Result<(), StoreError> {
        let path = self.oauth_dir().join(format!("{}.json", user_id));
        if path.exists() {
            tokio::fs::remove_file(path)
                .await
                .map_err(|e| StoreError::Persistence(e.to_string()))?;
        }
        Ok(())
    }
}
