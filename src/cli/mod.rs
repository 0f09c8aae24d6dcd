//! CLI command handlers
//!
//! Each submodule pairs a clap subcommand enum with the handler that maps it
//! onto the service layer.

pub mod category;
pub mod expense;
pub mod export;
pub mod goal;
pub mod receipt;
pub mod recurring;
pub mod report;
pub mod settle;
pub mod user;

pub use category::{handle_category_command, handle_location_command, CategoryCommands, LocationCommands};
pub use expense::{handle_expense_command, ExpenseCommands};
pub use export::{handle_export_command, ExportCommands};
pub use goal::{handle_goal_command, GoalCommands};
pub use receipt::{handle_receipt_command, ReceiptCommands};
pub use recurring::{handle_recurring_command, RecurringCommands};
pub use report::{
    handle_analytics_command, handle_check_command, handle_email_command,
    handle_history_command, handle_month_command, EmailCommands,
};
pub use settle::{handle_settle_command, SettleCommands};
pub use user::{handle_user_command, UserCommands};

use chrono::NaiveDate;
use zeroize::Zeroizing;

use crate::auth::prompt_password;
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{Category, Location, Month, SplitType, User};
use crate::services::{CategoryService, LocationService, UserService};
use crate::storage::Storage;
use crate::validation::{assert_valid_date, assert_valid_month};

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn resolve_user(storage: &Storage, identifier: &str) -> HalfsiesResult<User> {
    UserService::new(storage)
        .find(identifier)?
        .ok_or_else(|| HalfsiesError::user_not_found(identifier))
}

pub(crate) fn resolve_category(storage: &Storage, identifier: &str) -> HalfsiesResult<Category> {
    CategoryService::new(storage)
        .find(identifier)?
        .ok_or_else(|| HalfsiesError::category_not_found(identifier))
}

pub(crate) fn resolve_location(storage: &Storage, identifier: &str) -> HalfsiesResult<Location> {
    LocationService::new(storage)
        .find(identifier)?
        .ok_or_else(|| HalfsiesError::location_not_found(identifier))
}

pub(crate) fn parse_split(input: &str) -> HalfsiesResult<SplitType> {
    input.parse().map_err(HalfsiesError::Validation)
}

pub(crate) fn parse_date_opt(input: Option<&str>) -> HalfsiesResult<Option<NaiveDate>> {
    input.map(assert_valid_date).transpose()
}

/// The given month, or the current one
pub(crate) fn month_or_current(input: Option<&str>) -> HalfsiesResult<Month> {
    match input {
        Some(s) => assert_valid_month(s),
        None => Ok(Month::current()),
    }
}

/// Use a password passed on the command line or environment, else prompt
pub(crate) fn password_or_prompt(
    given: Option<String>,
    prompt: &str,
) -> HalfsiesResult<Zeroizing<String>> {
    match given {
        Some(password) => Ok(Zeroizing::new(password)),
        None => prompt_password(prompt),
    }
}
