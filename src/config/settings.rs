//! User settings for halfsies
//!
//! Household-wide preferences: display formatting, receipt limits, recurring
//! generation and the outbound email configuration.

use serde::{Deserialize, Serialize};

use super::paths::HalfsiesPaths;
use crate::error::HalfsiesError;

/// Outbound email settings
///
/// The API key itself is never written to disk; `api_key_env` names the
/// environment variable that holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    #[serde(default)]
    pub enabled: bool,

    /// HTTP endpoint of the transactional email API
    #[serde(default = "default_email_endpoint")]
    pub endpoint: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sender address, e.g. "Halfsies <bills@example.com>"
    #[serde(default)]
    pub from: String,
}

fn default_email_endpoint() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_api_key_env() -> String {
    "HALFSIES_EMAIL_API_KEY".to_string()
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_email_endpoint(),
            api_key_env: default_api_key_env(),
            from: String::new(),
        }
    }
}

impl EmailSettings {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// User settings for halfsies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Largest receipt file accepted, in bytes
    #[serde(default = "default_max_receipt_bytes")]
    pub max_receipt_bytes: u64,

    /// Generate due recurring expenses before every command
    #[serde(default = "default_auto_generate")]
    pub auto_generate_recurring: bool,

    #[serde(default)]
    pub email: EmailSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_max_receipt_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_auto_generate() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
            max_receipt_bytes: default_max_receipt_bytes(),
            auto_generate_recurring: default_auto_generate(),
            email: EmailSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist yet
    pub fn load_or_create(paths: &HalfsiesPaths) -> Result<Self, HalfsiesError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Caller decides when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| HalfsiesError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| HalfsiesError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &HalfsiesPaths) -> Result<(), HalfsiesError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| HalfsiesError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| HalfsiesError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.currency_symbol, "$");
        assert_eq!(settings.max_receipt_bytes, 10 * 1024 * 1024);
        assert!(settings.auto_generate_recurring);
        assert!(!settings.email.enabled);
        assert_eq!(settings.email.api_key_env, "HALFSIES_EMAIL_API_KEY");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = HalfsiesPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.currency_symbol = "€".to_string();
        settings.email.enabled = true;
        settings.email.from = "bills@example.com".to_string();
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.currency_symbol, "€");
        assert!(loaded.email.enabled);
        assert_eq!(loaded.email.from, "bills@example.com");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded: Settings = serde_json::from_str(r#"{"currency_symbol": "£"}"#).unwrap();
        assert_eq!(loaded.currency_symbol, "£");
        assert_eq!(loaded.schema_version, 1);
        assert_eq!(loaded.email.endpoint, "https://api.resend.com/emails");
    }
}
