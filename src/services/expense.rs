//! Expense entry, search and editing

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{
    CategoryId, Expense, ExpenseId, LocationId, Money, Month, SplitType, UserId,
};
use crate::storage::Storage;
use crate::validation::{assert_name, assert_note, assert_positive_amount, MAX_NAME_LEN};

use super::pick_unique;

/// Input for creating an expense
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub category_id: CategoryId,
    pub location_id: Option<LocationId>,
    pub paid_by: UserId,
    pub split_type: SplitType,
    pub notes: String,
}

impl CreateExpenseInput {
    /// An equal-split expense with no location or notes
    pub fn new(
        description: impl Into<String>,
        amount: Money,
        date: NaiveDate,
        category_id: CategoryId,
        paid_by: UserId,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
            category_id,
            location_id: None,
            paid_by,
            split_type: SplitType::default(),
            notes: String::new(),
        }
    }
}

/// Changes to an expense; `None` leaves a field alone
///
/// `location_id: Some(None)` removes the location tag.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<CategoryId>,
    pub location_id: Option<Option<LocationId>>,
    pub paid_by: Option<UserId>,
    pub split_type: Option<SplitType>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub month: Option<Month>,
    pub category_id: Option<CategoryId>,
    pub location_id: Option<LocationId>,
    pub paid_by: Option<UserId>,
    pub split_type: Option<SplitType>,
    /// Case-insensitive match against description and notes
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl ExpenseFilter {
    pub fn month(month: Month) -> Self {
        Self {
            month: Some(month),
            ..Self::default()
        }
    }

    fn matches(&self, expense: &Expense, needle: Option<&str>) -> bool {
        self.month.map_or(true, |m| m.contains(expense.date))
            && self.category_id.map_or(true, |c| expense.category_id == c)
            && self.location_id.map_or(true, |l| expense.location_id == Some(l))
            && self.paid_by.map_or(true, |u| expense.paid_by == u)
            && self.split_type.map_or(true, |s| expense.split_type == s)
            && needle.map_or(true, |n| {
                expense.description.to_lowercase().contains(n)
                    || expense.notes.to_lowercase().contains(n)
            })
    }
}

pub struct ExpenseService<'a> {
    storage: &'a Storage,
}

impl<'a> ExpenseService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn check_references(
        &self,
        category_id: CategoryId,
        location_id: Option<LocationId>,
        paid_by: UserId,
    ) -> HalfsiesResult<()> {
        if !self.storage.categories.contains(category_id)? {
            return Err(HalfsiesError::category_not_found(category_id.to_string()));
        }
        if let Some(location_id) = location_id {
            if !self.storage.locations.contains(location_id)? {
                return Err(HalfsiesError::location_not_found(location_id.to_string()));
            }
        }
        if !self.storage.users.contains(paid_by)? {
            return Err(HalfsiesError::user_not_found(paid_by.to_string()));
        }
        Ok(())
    }

    pub fn create(&self, input: CreateExpenseInput, created_by: UserId) -> HalfsiesResult<Expense> {
        let description = assert_name("Description", &input.description, MAX_NAME_LEN)?;
        let amount = assert_positive_amount(input.amount)?;
        let notes = assert_note(&input.notes)?;
        self.check_references(input.category_id, input.location_id, input.paid_by)?;

        let mut expense = Expense::new(
            description,
            amount,
            input.date,
            input.category_id,
            input.paid_by,
            created_by,
        );
        expense.location_id = input.location_id;
        expense.split_type = input.split_type;
        expense.notes = notes;

        self.insert(expense)
    }

    /// Persist an already-built expense
    fn insert(&self, expense: Expense) -> HalfsiesResult<Expense> {
        self.storage.expenses.upsert(expense.clone())?;
        self.storage.expenses.save()?;
        self.storage.log_create(
            EntityType::Expense,
            expense.id.to_string(),
            Some(expense.description.clone()),
            &expense,
        )?;
        info!(expense = %expense.id, amount = %expense.amount, "recorded expense");
        Ok(expense)
    }

    pub fn get(&self, id: ExpenseId) -> HalfsiesResult<Option<Expense>> {
        self.storage.expenses.get(id)
    }

    /// Find an expense by full id or short id prefix
    pub fn find(&self, identifier: &str) -> HalfsiesResult<Option<Expense>> {
        pick_unique(
            self.storage.expenses.find_by_identifier(identifier)?,
            "Expense",
            identifier,
        )
    }

    /// Expenses matching `filter`, newest first
    pub fn list(&self, filter: &ExpenseFilter) -> HalfsiesResult<Vec<Expense>> {
        let needle = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let mut expenses = self
            .storage
            .expenses
            .filter(|e| filter.matches(e, needle.as_deref()))?;

        expenses.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        if let Some(limit) = filter.limit {
            expenses.truncate(limit);
        }
        debug!(count = expenses.len(), "listed expenses");
        Ok(expenses)
    }

    pub fn update(&self, id: ExpenseId, input: UpdateExpenseInput) -> HalfsiesResult<Expense> {
        let mut expense = self
            .get(id)?
            .ok_or_else(|| HalfsiesError::expense_not_found(id.to_string()))?;
        let before = expense.clone();

        if let Some(description) = input.description {
            expense.description = assert_name("Description", &description, MAX_NAME_LEN)?;
        }
        if let Some(amount) = input.amount {
            expense.amount = assert_positive_amount(amount)?;
        }
        if let Some(date) = input.date {
            expense.date = date;
        }
        if let Some(category_id) = input.category_id {
            expense.category_id = category_id;
        }
        if let Some(location_id) = input.location_id {
            expense.location_id = location_id;
        }
        if let Some(paid_by) = input.paid_by {
            expense.paid_by = paid_by;
        }
        if let Some(split_type) = input.split_type {
            expense.split_type = split_type;
        }
        if let Some(notes) = input.notes {
            expense.notes = assert_note(&notes)?;
        }
        self.check_references(expense.category_id, expense.location_id, expense.paid_by)?;
        expense.updated_at = Utc::now();

        self.storage.expenses.upsert(expense.clone())?;
        self.storage.expenses.save()?;
        self.storage.log_update(
            EntityType::Expense,
            expense.id.to_string(),
            Some(expense.description.clone()),
            &before,
            &expense,
        )?;
        Ok(expense)
    }

    /// Delete an expense together with any receipts attached to it
    pub fn delete(&self, id: ExpenseId) -> HalfsiesResult<Expense> {
        let expense = self
            .get(id)?
            .ok_or_else(|| HalfsiesError::expense_not_found(id.to_string()))?;

        let receipts = self
            .storage
            .receipts
            .filter(|r| r.expense_id == Some(id) || expense.receipt_id == Some(r.id))?;
        for receipt in &receipts {
            self.storage.blobs.remove(&receipt.stored_name)?;
            self.storage.receipts.delete(receipt.id)?;
            self.storage.log_delete(
                EntityType::Receipt,
                receipt.id.to_string(),
                Some(receipt.original_name.clone()),
                receipt,
            )?;
        }
        if !receipts.is_empty() {
            self.storage.receipts.save()?;
        }

        self.storage.expenses.delete(id)?;
        self.storage.expenses.save()?;
        self.storage.log_delete(
            EntityType::Expense,
            expense.id.to_string(),
            Some(expense.description.clone()),
            &expense,
        )?;
        info!(expense = %id, receipts = receipts.len(), "deleted expense");
        Ok(expense)
    }
}
