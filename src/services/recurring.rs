//! Recurring expense templates and catch-up generation

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::recurring::MAX_CATCH_UP;
use crate::models::{
    CategoryId, Expense, Frequency, LocationId, Money, RecurringExpense, RecurringId, SplitType,
    UserId,
};
use crate::storage::Storage;
use crate::validation::{assert_name, assert_positive_amount, MAX_NAME_LEN};

use super::pick_unique;

#[derive(Debug, Clone)]
pub struct CreateRecurringInput {
    pub description: String,
    pub amount: Money,
    pub category_id: CategoryId,
    pub location_id: Option<LocationId>,
    pub paid_by: UserId,
    pub split_type: SplitType,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl CreateRecurringInput {
    pub fn new(
        description: impl Into<String>,
        amount: Money,
        category_id: CategoryId,
        paid_by: UserId,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category_id,
            location_id: None,
            paid_by,
            split_type: SplitType::default(),
            frequency,
            start_date,
            end_date: None,
        }
    }
}

/// Changes to a template; schedule anchor and frequency are fixed
#[derive(Debug, Clone, Default)]
pub struct UpdateRecurringInput {
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub category_id: Option<CategoryId>,
    pub location_id: Option<Option<LocationId>>,
    pub paid_by: Option<UserId>,
    pub split_type: Option<SplitType>,
    pub end_date: Option<Option<NaiveDate>>,
}

pub struct RecurringService<'a> {
    storage: &'a Storage,
}

impl<'a> RecurringService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn check_references(&self, template: &RecurringExpense) -> HalfsiesResult<()> {
        if !self.storage.categories.contains(template.category_id)? {
            return Err(HalfsiesError::category_not_found(
                template.category_id.to_string(),
            ));
        }
        if let Some(location_id) = template.location_id {
            if !self.storage.locations.contains(location_id)? {
                return Err(HalfsiesError::location_not_found(location_id.to_string()));
            }
        }
        if !self.storage.users.contains(template.paid_by)? {
            return Err(HalfsiesError::user_not_found(template.paid_by.to_string()));
        }
        if let Some(end) = template.end_date {
            if end < template.start_date {
                return Err(HalfsiesError::Validation(format!(
                    "End date {} is before start date {}",
                    end, template.start_date
                )));
            }
        }
        Ok(())
    }

    fn persist_update(&self, before: &RecurringExpense, after: &RecurringExpense) -> HalfsiesResult<()> {
        self.storage.recurring.upsert(after.clone())?;
        self.storage.recurring.save()?;
        self.storage.log_update(
            EntityType::Recurring,
            after.id.to_string(),
            Some(after.description.clone()),
            before,
            after,
        )
    }

    pub fn create(
        &self,
        input: CreateRecurringInput,
        created_by: UserId,
    ) -> HalfsiesResult<RecurringExpense> {
        let description = assert_name("Description", &input.description, MAX_NAME_LEN)?;
        let amount = assert_positive_amount(input.amount)?;

        let mut template = RecurringExpense::new(
            description,
            amount,
            input.category_id,
            input.paid_by,
            input.frequency,
            input.start_date,
            created_by,
        );
        template.location_id = input.location_id;
        template.split_type = input.split_type;
        template.end_date = input.end_date;
        self.check_references(&template)?;

        self.storage.recurring.upsert(template.clone())?;
        self.storage.recurring.save()?;
        self.storage.log_create(
            EntityType::Recurring,
            template.id.to_string(),
            Some(template.description.clone()),
            &template,
        )?;
        info!(template = %template.id, frequency = %template.frequency, "created recurring expense");
        Ok(template)
    }

    /// Templates ordered by next due date
    pub fn list(&self, include_inactive: bool) -> HalfsiesResult<Vec<RecurringExpense>> {
        let mut templates = self
            .storage
            .recurring
            .filter(|r| include_inactive || r.active)?;
        templates.sort_by(|a, b| {
            a.next_due
                .cmp(&b.next_due)
                .then_with(|| a.description.cmp(&b.description))
        });
        Ok(templates)
    }

    pub fn get(&self, id: RecurringId) -> HalfsiesResult<Option<RecurringExpense>> {
        self.storage.recurring.get(id)
    }

    /// Find a template by id prefix or exact description
    pub fn find(&self, identifier: &str) -> HalfsiesResult<Option<RecurringExpense>> {
        let by_id = self.storage.recurring.find_by_identifier(identifier)?;
        if !by_id.is_empty() {
            return pick_unique(by_id, "Recurring expense", identifier);
        }
        pick_unique(
            self.storage
                .recurring
                .filter(|r| r.description.eq_ignore_ascii_case(identifier.trim()))?,
            "Recurring expense",
            identifier,
        )
    }

    fn require(&self, id: RecurringId) -> HalfsiesResult<RecurringExpense> {
        self.get(id)?
            .ok_or_else(|| HalfsiesError::recurring_not_found(id.to_string()))
    }

    pub fn update(
        &self,
        id: RecurringId,
        input: UpdateRecurringInput,
    ) -> HalfsiesResult<RecurringExpense> {
        let mut template = self.require(id)?;
        let before = template.clone();

        if let Some(description) = input.description {
            template.description = assert_name("Description", &description, MAX_NAME_LEN)?;
        }
        if let Some(amount) = input.amount {
            template.amount = assert_positive_amount(amount)?;
        }
        if let Some(category_id) = input.category_id {
            template.category_id = category_id;
        }
        if let Some(location_id) = input.location_id {
            template.location_id = location_id;
        }
        if let Some(paid_by) = input.paid_by {
            template.paid_by = paid_by;
        }
        if let Some(split_type) = input.split_type {
            template.split_type = split_type;
        }
        if let Some(end_date) = input.end_date {
            template.end_date = end_date;
        }
        self.check_references(&template)?;
        template.updated_at = Utc::now();

        self.persist_update(&before, &template)?;
        Ok(template)
    }

    pub fn pause(&self, id: RecurringId) -> HalfsiesResult<RecurringExpense> {
        let mut template = self.require(id)?;
        if !template.active {
            return Ok(template);
        }
        let before = template.clone();
        template.active = false;
        template.updated_at = Utc::now();
        self.persist_update(&before, &template)?;
        Ok(template)
    }

    /// Reactivate a template, skipping occurrences missed while paused
    pub fn resume(&self, id: RecurringId, today: NaiveDate) -> HalfsiesResult<RecurringExpense> {
        let mut template = self.require(id)?;
        if template.active {
            return Ok(template);
        }
        let before = template.clone();
        while template.next_due < today {
            template.next_due = template.occurrence_after(template.next_due);
        }
        if template.is_finished() {
            return Err(HalfsiesError::Validation(format!(
                "'{}' ended on {}",
                template.description,
                template
                    .end_date
                    .map(|d| d.to_string())
                    .unwrap_or_default()
            )));
        }
        template.active = true;
        template.updated_at = Utc::now();
        self.persist_update(&before, &template)?;
        Ok(template)
    }

    /// Delete a template; generated expenses stay but lose the link
    ///
    /// Returns the number of expenses unlinked.
    pub fn delete(&self, id: RecurringId) -> HalfsiesResult<usize> {
        let template = self.require(id)?;

        let now = Utc::now();
        let unlinked = self.storage.expenses.update_where(
            |e| e.recurring_id == Some(id),
            |e| {
                e.recurring_id = None;
                e.updated_at = now;
            },
        )?;
        self.storage.recurring.delete(id)?;
        self.storage.expenses.save()?;
        self.storage.recurring.save()?;
        self.storage.log_delete(
            EntityType::Recurring,
            template.id.to_string(),
            Some(template.description.clone()),
            &template,
        )?;
        Ok(unlinked.len())
    }

    /// Create an expense for every occurrence due on or before `today`
    ///
    /// Each template's `next_due` advances past what was generated, so a
    /// second run on the same day creates nothing. A template's expenses
    /// and its advanced schedule are both on disk before any change log
    /// entry is written.
    pub fn generate_due(&self, today: NaiveDate) -> HalfsiesResult<Vec<Expense>> {
        let mut generated = Vec::new();

        for template in self.storage.recurring.filter(|r| r.active)? {
            let due = template.due_dates(today);
            let before = template.clone();
            let mut updated = template.clone();

            let batch: Vec<Expense> = due
                .iter()
                .map(|date| {
                    let mut expense = Expense::new(
                        template.description.clone(),
                        template.amount,
                        *date,
                        template.category_id,
                        template.paid_by,
                        template.created_by,
                    );
                    expense.location_id = template.location_id;
                    expense.split_type = template.split_type;
                    expense.recurring_id = Some(template.id);
                    expense
                })
                .collect();

            if let Some(last) = due.last() {
                updated.next_due = updated.occurrence_after(*last);
                updated.last_generated = Some(*last);
            }
            if due.len() == MAX_CATCH_UP {
                warn!(template = %template.id, "catch-up limit reached; remaining occurrences wait for the next run");
            }
            if updated.is_finished() {
                updated.active = false;
            }
            let changed = updated.next_due != before.next_due || updated.active != before.active;

            if !batch.is_empty() {
                for expense in &batch {
                    self.storage.expenses.upsert(expense.clone())?;
                }
                self.storage.expenses.save()?;
            }
            if changed {
                updated.updated_at = Utc::now();
                self.storage.recurring.upsert(updated.clone())?;
                self.storage.recurring.save()?;
            }

            for expense in &batch {
                self.storage.log_create(
                    EntityType::Expense,
                    expense.id.to_string(),
                    Some(expense.description.clone()),
                    expense,
                )?;
            }
            if changed {
                self.storage.log_update(
                    EntityType::Recurring,
                    updated.id.to_string(),
                    Some(updated.description.clone()),
                    &before,
                    &updated,
                )?;
            }
            if !batch.is_empty() {
                info!(template = %template.id, count = batch.len(), "generated recurring expenses");
            }
            generated.extend(batch);
        }

        debug!(count = generated.len(), %today, "generated recurring expenses");
        Ok(generated)
    }
}
