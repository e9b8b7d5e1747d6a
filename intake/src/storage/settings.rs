//! Telegram notification settings persisted as a single JSON object.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info, warn};

use super::errors::{Result, StorageError};
use super::write_atomic;

/// Bot token and chat id used for notifications. Either value empty disables notifications.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(rename = "telegramBotToken", default)]
    pub bot_token: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(rename = "telegramChatId", default)]
    pub chat_id: String,
}

impl NotificationSettings {
    pub fn is_enabled(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    pub fn has_token(&self) -> bool {
        !self.bot_token.is_empty()
    }

    pub fn has_chat_id(&self) -> bool {
        !self.chat_id.is_empty()
    }

    /// Which values are configured, without revealing them.
    pub fn status(&self) -> SettingsStatus {
        SettingsStatus {
            has_token: self.has_token(),
            has_chat_id: self.has_chat_id(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsStatus {
    pub has_token: bool,
    pub has_chat_id: bool,
}

/// Partial update of [`NotificationSettings`].
///
/// A missing key leaves the value unchanged, `null` clears it, a string replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub bot_token: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub chat_id: Option<Option<String>>,
}

impl SettingsUpdate {
    fn apply(self, settings: &mut NotificationSettings) {
        if let Some(token) = self.bot_token {
            settings.bot_token = token.unwrap_or_default();
        }
        if let Some(chat_id) = self.chat_id {
            settings.chat_id = chat_id.unwrap_or_default();
        }
    }
}

/// File-backed store for [`NotificationSettings`].
pub struct SettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed the settings file with empty values if it does not exist yet.
    pub async fn ensure_exists(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|e| StorageError::io("inspect", &self.path, e))?;
        if !exists {
            debug!(path = %self.path.display(), "Creating empty notification settings file");
            self.write(&NotificationSettings::default()).await?;
        }
        Ok(())
    }

    /// Current settings. A missing or unparseable file yields empty (disabled) settings.
    pub async fn load(&self) -> NotificationSettings {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return NotificationSettings::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read notification settings, using defaults");
                return NotificationSettings::default();
            }
        };

        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Notification settings file is invalid, using defaults");
            NotificationSettings::default()
        })
    }

    /// Apply a partial update and persist the result.
    pub async fn update(&self, update: SettingsUpdate) -> Result<NotificationSettings> {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.load().await;
        update.apply(&mut settings);
        self.write(&settings).await?;

        info!(
            has_token = settings.has_token(),
            has_chat_id = settings.has_chat_id(),
            "Notification settings updated"
        );
        Ok(settings)
    }

    async fn write(&self, settings: &NotificationSettings) -> Result<()> {
        let contents = serde_json::to_vec_pretty(settings).map_err(|cause| StorageError::Serialize {
            path: self.path.clone(),
            cause,
        })?;
        write_atomic(&self.path, &contents).await
    }
}
