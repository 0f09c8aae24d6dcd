//! Service layer for halfsies
//!
//! Services validate input, apply cross-record rules, persist through
//! `Storage` and write the change log. They hold a borrowed `Storage` and are
//! cheap to construct per command.

pub mod analytics;
pub mod category;
pub mod expense;
pub mod integrity;
pub mod location;
pub mod notification;
pub mod receipt;
pub mod recurring;
pub mod savings;
pub mod settlement;
pub mod user;

pub use analytics::{Analytics, AnalyticsService, CategoryBreakdown, LocationBreakdown, MonthTotal};
pub use category::CategoryService;
pub use expense::{CreateExpenseInput, ExpenseFilter, ExpenseService, UpdateExpenseInput};
pub use integrity::{IntegrityReport, IntegrityService, Issue, RepairSummary};
pub use location::LocationService;
pub use notification::{render_statement, NotificationService};
pub use receipt::ReceiptService;
pub use recurring::{CreateRecurringInput, RecurringService, UpdateRecurringInput};
pub use savings::SavingsService;
pub use settlement::{Balance, MemberSummary, MonthData, RecordSettlementInput, SettlementService};
pub use user::UserService;

use crate::error::{HalfsiesError, HalfsiesResult};

/// Narrow lookup candidates to at most one, rejecting ambiguous short ids
pub(crate) fn pick_unique<T>(
    mut candidates: Vec<T>,
    entity_type: &str,
    identifier: &str,
) -> HalfsiesResult<Option<T>> {
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        n => Err(HalfsiesError::Validation(format!(
            "{} identifier '{}' is ambiguous ({} matches); use more characters",
            entity_type, identifier, n
        ))),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use crate::config::HalfsiesPaths;
    use crate::models::{CategoryId, User};
    use crate::storage::{initialize_storage, Storage};

    use super::{CategoryService, UserService};

    /// Initialized storage in a temp dir
    pub fn storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage =
            Storage::open(HalfsiesPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        initialize_storage(&storage).unwrap();
        (storage, temp_dir)
    }

    /// Initialized storage with Alex (registered first) and Sam
    pub fn household() -> (Storage, User, User, TempDir) {
        let (storage, temp_dir) = storage();
        let users = UserService::new(&storage);
        let alex = users
            .register("Alex", "alex@example.com", "password123")
            .unwrap();
        let sam = users
            .register("Sam", "sam@example.com", "password456")
            .unwrap();
        (storage, alex, sam, temp_dir)
    }

    pub fn category_id(storage: &Storage, name: &str) -> CategoryId {
        CategoryService::new(storage)
            .find(name)
            .unwrap()
            .unwrap()
            .id
    }

    pub fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }
}
