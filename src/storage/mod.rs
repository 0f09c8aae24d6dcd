//! Storage layer for halfsies
//!
//! One JSON file per collection under `data/`, receipt files under
//! `data/receipts/`, and the append-only change log next to the settings.

pub mod blobs;
pub mod collection;
pub mod file_io;
pub mod init;

pub use blobs::ReceiptStore;
pub use collection::{Collection, Record};
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;

use serde::Serialize;

use crate::audit::{summarize_changes, AuditEntry, AuditLogger, EntityType};
use crate::config::{HalfsiesPaths, Settings};
use crate::error::HalfsiesResult;
use crate::models::{
    Category, Expense, Location, Receipt, RecurringExpense, SavingsGoal, Settlement, User,
};

/// Owns every collection plus the settings and change log
pub struct Storage {
    paths: HalfsiesPaths,
    settings: Settings,
    audit: AuditLogger,
    pub users: Collection<User>,
    pub categories: Collection<Category>,
    pub locations: Collection<Location>,
    pub expenses: Collection<Expense>,
    pub recurring: Collection<RecurringExpense>,
    pub settlements: Collection<Settlement>,
    pub goals: Collection<SavingsGoal>,
    pub receipts: Collection<Receipt>,
    pub blobs: ReceiptStore,
}

impl Storage {
    /// Create storage rooted at `paths` without reading collections
    pub fn new(paths: HalfsiesPaths) -> HalfsiesResult<Self> {
        paths.ensure_directories()?;
        let settings = Settings::load_or_create(&paths)?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            users: Collection::new(paths.users_file()),
            categories: Collection::new(paths.categories_file()),
            locations: Collection::new(paths.locations_file()),
            expenses: Collection::new(paths.expenses_file()),
            recurring: Collection::new(paths.recurring_file()),
            settlements: Collection::new(paths.settlements_file()),
            goals: Collection::new(paths.goals_file()),
            receipts: Collection::new(paths.receipts_file()),
            blobs: ReceiptStore::new(paths.receipts_dir()),
            settings,
            paths,
        })
    }

    /// Create storage and load every collection from disk
    pub fn open(paths: HalfsiesPaths) -> HalfsiesResult<Self> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &HalfsiesPaths {
        &self.paths
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace and persist settings
    pub fn update_settings(&mut self, settings: Settings) -> HalfsiesResult<()> {
        settings.save(&self.paths)?;
        self.settings = settings;
        Ok(())
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn load_all(&self) -> HalfsiesResult<()> {
        self.users.load()?;
        self.categories.load()?;
        self.locations.load()?;
        self.expenses.load()?;
        self.recurring.load()?;
        self.settlements.load()?;
        self.goals.load()?;
        self.receipts.load()?;
        Ok(())
    }

    pub fn save_all(&self) -> HalfsiesResult<()> {
        self.users.save()?;
        self.categories.save()?;
        self.locations.save()?;
        self.expenses.save()?;
        self.recurring.save()?;
        self.settlements.save()?;
        self.goals.save()?;
        self.receipts.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> HalfsiesResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Log an update; the change summary is computed from the two snapshots
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> HalfsiesResult<()> {
        let diff = match (serde_json::to_value(before), serde_json::to_value(after)) {
            (Ok(b), Ok(a)) => summarize_changes(&b, &a),
            _ => None,
        };
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff,
        ))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> HalfsiesResult<()> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::models::Location;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let paths = HalfsiesPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();

        assert!(temp_dir.path().join("data").join("receipts").is_dir());
        assert!(!storage.is_initialized());
        assert!(storage.users.is_empty().unwrap());
    }

    #[test]
    fn test_log_update_records_summary() {
        let temp_dir = TempDir::new().unwrap();
        let storage =
            Storage::open(HalfsiesPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();

        let before = Location::new("Market");
        let mut after = before.clone();
        after.name = "Night Market".into();
        storage
            .log_update(
                EntityType::Location,
                before.id.to_string(),
                Some(after.name.clone()),
                &before,
                &after,
            )
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Update);
        assert_eq!(
            entries[0].diff_summary.as_deref(),
            Some("name: \"Market\" -> \"Night Market\"")
        );
    }
}
