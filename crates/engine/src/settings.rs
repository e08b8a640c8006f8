//! Operator settings
//!
//! Settings are owned by an external store and re-read for every check,
//! so a mode switch takes effect on the next admission.

use std::fmt;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::EngineResult;

/// Prefix of generated fingerprint secrets
pub const API_KEY_PREFIX: &str = "gs_live_";

/// Which probe set a check fans out to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningMode {
    /// One randomized source, lower cost
    #[strum(to_string = "single_source", serialize = "single")]
    SingleSource,
    /// Every configured pillar source
    #[default]
    #[strum(to_string = "multi_source", serialize = "multi")]
    MultiSource,
}

/// Operator-tunable settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// HMAC secret used for fingerprints; generated when empty
    #[serde(default)]
    pub api_key_secret: String,

    /// Credit balance. Seeds the ledger at build time, then mirrors it.
    #[serde(default = "default_credit_balance")]
    pub credit_balance: i64,

    /// Remaining balance at or below which admissions log a warning
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: i64,

    /// Days a completed check is kept before purge
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default)]
    pub mode: ScreeningMode,
}

fn default_credit_balance() -> i64 {
    100
}

fn default_alert_threshold() -> i64 {
    10
}

fn default_retention_days() -> u32 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key_secret: String::new(),
            credit_balance: default_credit_balance(),
            alert_threshold: default_alert_threshold(),
            retention_days: default_retention_days(),
            mode: ScreeningMode::default(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key_secret", &"<redacted>")
            .field("credit_balance", &self.credit_balance)
            .field("alert_threshold", &self.alert_threshold)
            .field("retention_days", &self.retention_days)
            .field("mode", &self.mode)
            .finish()
    }
}

impl Settings {
    /// Fresh random secret, `gs_live_` followed by 32 hex characters
    pub fn generate_api_key() -> String {
        format!("{}{}", API_KEY_PREFIX, uuid::Uuid::new_v4().simple())
    }

    /// Fill in a missing secret. Returns true if one was generated.
    pub fn ensure_api_key(&mut self) -> bool {
        if !self.api_key_secret.is_empty() {
            return false;
        }
        self.api_key_secret = Self::generate_api_key();
        true
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }

    /// Names of the fields that differ from `other`
    pub fn changed_fields(&self, other: &Settings) -> Vec<String> {
        let mut changed = Vec::new();
        if self.api_key_secret != other.api_key_secret {
            changed.push("api_key_secret");
        }
        if self.credit_balance != other.credit_balance {
            changed.push("credit_balance");
        }
        if self.alert_threshold != other.alert_threshold {
            changed.push("alert_threshold");
        }
        if self.retention_days != other.retention_days {
            changed.push("retention_days");
        }
        if self.mode != other.mode {
            changed.push("mode");
        }
        changed.into_iter().map(String::from).collect()
    }
}

/// Source of operator settings
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn load(&self) -> EngineResult<Settings>;

    async fn save(&self, settings: &Settings) -> EngineResult<()>;

    /// Read-modify-write. Returns the stored settings.
    ///
    /// The default is a plain load then save; providers with a
    /// transactional backend should override it.
    async fn update(
        &self,
        apply: &(dyn for<'s> Fn(&'s mut Settings) + Send + Sync),
    ) -> EngineResult<Settings> {
        let mut settings = self.load().await?;
        apply(&mut settings);
        self.save(&settings).await?;
        Ok(settings)
    }
}

/// Settings held in process memory
#[derive(Default)]
pub struct InMemorySettings {
    settings: RwLock<Settings>,
}

impl InMemorySettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    /// Switch mode without a full save
    pub fn set_mode(&self, mode: ScreeningMode) {
        self.settings.write().unwrap_or_else(|e| e.into_inner()).mode = mode;
    }
}

#[async_trait]
impl SettingsProvider for InMemorySettings {
    async fn load(&self) -> EngineResult<Settings> {
        Ok(self.settings.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save(&self, settings: &Settings) -> EngineResult<()> {
        *self.settings.write().unwrap_or_else(|e| e.into_inner()) = settings.clone();
        Ok(())
    }

    async fn update(
        &self,
        apply: &(dyn for<'s> Fn(&'s mut Settings) + Send + Sync),
    ) -> EngineResult<Settings> {
        let mut settings = self.settings.write().unwrap_or_else(|e| e.into_inner());
        apply(&mut settings);
        Ok(settings.clone())
    }
}
