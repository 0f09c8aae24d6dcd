//! Full database export to JSON
//!
//! Users are exported without password hashes.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{
    Category, Expense, Location, Receipt, RecurringExpense, SavingsGoal, Settlement, User,
};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    /// Application version that created the export
    pub app_version: String,
    pub users: Vec<User>,
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
    pub expenses: Vec<Expense>,
    pub recurring: Vec<RecurringExpense>,
    pub settlements: Vec<Settlement>,
    pub goals: Vec<SavingsGoal>,
    pub receipts: Vec<Receipt>,
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub user_count: usize,
    pub category_count: usize,
    pub location_count: usize,
    pub expense_count: usize,
    pub recurring_count: usize,
    pub settlement_count: usize,
    pub goal_count: usize,
    pub receipt_count: usize,
    pub earliest_expense: Option<String>,
    pub latest_expense: Option<String>,
}

impl FullExport {
    pub fn from_storage(storage: &Storage) -> HalfsiesResult<Self> {
        let users: Vec<User> = storage.users.all()?.iter().map(User::redacted).collect();
        let categories = storage.categories.all()?;
        let locations = storage.locations.all()?;
        let expenses = storage.expenses.all()?;
        let recurring = storage.recurring.all()?;
        let settlements = storage.settlements.all()?;
        let goals = storage.goals.all()?;
        let receipts = storage.receipts.all()?;

        let metadata = ExportMetadata {
            user_count: users.len(),
            category_count: categories.len(),
            location_count: locations.len(),
            expense_count: expenses.len(),
            recurring_count: recurring.len(),
            settlement_count: settlements.len(),
            goal_count: goals.len(),
            receipt_count: receipts.len(),
            earliest_expense: expenses.iter().map(|e| e.date).min().map(|d| d.to_string()),
            latest_expense: expenses.iter().map(|e| e.date).max().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            users,
            categories,
            locations,
            expenses,
            recurring,
            settlements,
            goals,
            receipts,
            metadata,
        })
    }

    /// Check the schema version and that expenses point at known records
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let users: HashSet<_> = self.users.iter().map(|u| u.id).collect();
        let categories: HashSet<_> = self.categories.iter().map(|c| c.id).collect();
        for expense in &self.expenses {
            if !categories.contains(&expense.category_id) {
                return Err(format!(
                    "Expense {} references unknown category {}",
                    expense.id, expense.category_id
                ));
            }
            if !users.contains(&expense.paid_by) {
                return Err(format!(
                    "Expense {} references unknown payer {}",
                    expense.id, expense.paid_by
                ));
            }
        }
        Ok(())
    }
}

pub fn export_full_json<W: Write>(
    storage: &Storage,
    writer: &mut W,
    pretty: bool,
) -> HalfsiesResult<()> {
    let export = FullExport::from_storage(storage)?;
    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| HalfsiesError::Export(e.to_string()))
}

/// Parse and validate a JSON export
pub fn read_json_export(json: &str) -> HalfsiesResult<FullExport> {
    let export: FullExport =
        serde_json::from_str(json).map_err(|e| HalfsiesError::Export(e.to_string()))?;
    export.validate().map_err(HalfsiesError::Export)?;
    Ok(export)
}
