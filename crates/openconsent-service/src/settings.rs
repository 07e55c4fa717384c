//! Service configuration
//!
//! Declarative TOML settings for the consent store: which API versions the
//! deployment serves, the optional version floor, and how long creation
//! idempotency keys stay live.

use openconsent_core::{ApiVersion, ApiVersionValidator};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use time::Duration;
use tracing::debug;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid settings: {message}")]
    Invalid { message: String },
}

impl SettingsError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

fn default_idempotency_key_ttl_secs() -> u64 {
    24 * 60 * 60
}

/// Deployment settings for the consent store.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsentStoreSettings {
    /// API versions the deployment exposes services for.
    pub supported_api_versions: Vec<ApiVersion>,

    /// Consents created under versions below this floor are unreachable,
    /// even by newer callers. Absent means no floor.
    #[serde(default)]
    pub minimum_api_version: Option<ApiVersion>,

    /// Lifetime of a creation idempotency key, in seconds.
    #[serde(default = "default_idempotency_key_ttl_secs")]
    pub idempotency_key_ttl_secs: u64,
}

impl ConsentStoreSettings {
    /// Parses settings from a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and parses a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading consent store settings");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.supported_api_versions.is_empty() {
            return Err(SettingsError::invalid(
                "supported_api_versions must name at least one version",
            ));
        }
        if let Some(floor) = self.minimum_api_version {
            if self.supported_api_versions.iter().all(|v| *v < floor) {
                return Err(SettingsError::invalid(format!(
                    "minimum_api_version {floor} is above every supported version"
                )));
            }
        }
        if self.idempotency_key_ttl_secs == 0 {
            return Err(SettingsError::invalid(
                "idempotency_key_ttl_secs must be positive",
            ));
        }
        Ok(())
    }

    /// Builds the version validator these settings describe.
    pub fn validator(&self) -> ApiVersionValidator {
        match self.minimum_api_version {
            Some(floor) => ApiVersionValidator::with_floor(floor),
            None => ApiVersionValidator::new(),
        }
    }

    pub fn idempotency_key_ttl(&self) -> Duration {
        Duration::seconds(self.idempotency_key_ttl_secs as i64)
    }
}
