//! Core data models for halfsies
//!
//! Plain records for the shared-expense domain: household members, expenses
//! and their categories and locations, recurring templates, settlements,
//! savings goals and receipts.

pub mod category;
pub mod expense;
pub mod ids;
pub mod money;
pub mod month;
pub mod receipt;
pub mod recurring;
pub mod savings;
pub mod settlement;
pub mod user;

pub use category::{Category, Location, DEFAULT_CATEGORIES, FALLBACK_CATEGORY};
pub use expense::{Expense, SplitType};
pub use ids::{
    CategoryId, ContributionId, ExpenseId, GoalId, LocationId, ReceiptId, RecurringId,
    SettlementId, UserId,
};
pub use money::{Money, MoneyParseError};
pub use month::{Month, MonthParseError};
pub use receipt::Receipt;
pub use recurring::{Frequency, RecurringExpense};
pub use savings::{Contribution, GoalProgress, SavingsGoal};
pub use settlement::Settlement;
pub use user::User;
