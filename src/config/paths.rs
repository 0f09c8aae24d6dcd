//! Path management for halfsies
//!
//! ## Path Resolution Order
//!
//! 1. `HALFSIES_DATA_DIR` environment variable (if set)
//! 2. The platform config directory from `directories`
//!    (`~/.config/halfsies` on Linux, `~/Library/Application Support/halfsies`
//!    on macOS, `%APPDATA%\halfsies\config` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::HalfsiesError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "HALFSIES_DATA_DIR";

/// Manages all paths used by halfsies
#[derive(Debug, Clone)]
pub struct HalfsiesPaths {
    base_dir: PathBuf,
}

impl HalfsiesPaths {
    /// Resolve paths from the environment or the platform defaults
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, HalfsiesError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => ProjectDirs::from("", "", "halfsies")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    HalfsiesError::Config("Could not determine a home directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Directory holding uploaded receipt files
    pub fn receipts_dir(&self) -> PathBuf {
        self.data_dir().join("receipts")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// The logged-in user for this data directory
    pub fn session_file(&self) -> PathBuf {
        self.base_dir.join("session.json")
    }

    /// Append-only change log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn users_file(&self) -> PathBuf {
        self.data_dir().join("users.json")
    }

    pub fn categories_file(&self) -> PathBuf {
        self.data_dir().join("categories.json")
    }

    pub fn locations_file(&self) -> PathBuf {
        self.data_dir().join("locations.json")
    }

    pub fn expenses_file(&self) -> PathBuf {
        self.data_dir().join("expenses.json")
    }

    pub fn recurring_file(&self) -> PathBuf {
        self.data_dir().join("recurring.json")
    }

    pub fn settlements_file(&self) -> PathBuf {
        self.data_dir().join("settlements.json")
    }

    pub fn goals_file(&self) -> PathBuf {
        self.data_dir().join("goals.json")
    }

    /// Receipt metadata (the files themselves live in `receipts_dir`)
    pub fn receipts_file(&self) -> PathBuf {
        self.data_dir().join("receipts.json")
    }

    /// Ensure the base, data and receipts directories exist
    pub fn ensure_directories(&self) -> Result<(), HalfsiesError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| HalfsiesError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| HalfsiesError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.receipts_dir()).map_err(|e| {
            HalfsiesError::Io(format!("Failed to create receipts directory: {}", e))
        })?;

        Ok(())
    }

    /// Check if `init` has been run (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
