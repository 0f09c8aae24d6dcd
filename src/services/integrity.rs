//! Referential integrity scan and repair
//!
//! Deleting users or editing the JSON files by hand can leave records
//! pointing at nothing. `scan` finds those references plus receipt files that
//! are missing or unaccounted for; `repair` fixes whatever can be fixed
//! without guessing. References to missing users are only reported.

use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use tracing::{info, warn};

use crate::audit::EntityType;
use crate::error::HalfsiesResult;
use crate::models::{ExpenseId, GoalId, ReceiptId, RecurringId, SettlementId, UserId};
use crate::storage::Storage;

use super::category::CategoryService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    ExpenseMissingCategory(ExpenseId),
    ExpenseMissingLocation(ExpenseId),
    ExpenseMissingPayer { expense: ExpenseId, user: UserId },
    ExpenseMissingCreator { expense: ExpenseId, user: UserId },
    ExpenseMissingRecurring(ExpenseId),
    ExpenseMissingReceipt(ExpenseId),
    RecurringMissingCategory(RecurringId),
    RecurringMissingLocation(RecurringId),
    RecurringMissingPayer { template: RecurringId, user: UserId },
    SettlementMissingUser { settlement: SettlementId, user: UserId },
    ContributionMissingUser { goal: GoalId, user: UserId },
    ReceiptMissingExpense(ReceiptId),
    ReceiptMissingFile(ReceiptId),
    /// A file in the receipts directory no receipt refers to
    StrayFile(String),
}

impl Issue {
    /// Whether `repair` will fix this issue
    pub fn is_repairable(&self) -> bool {
        !matches!(
            self,
            Issue::ExpenseMissingPayer { .. }
                | Issue::ExpenseMissingCreator { .. }
                | Issue::RecurringMissingPayer { .. }
                | Issue::SettlementMissingUser { .. }
                | Issue::ContributionMissingUser { .. }
        )
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::ExpenseMissingCategory(id) => write!(f, "Expense {} has a missing category", id),
            Issue::ExpenseMissingLocation(id) => write!(f, "Expense {} has a missing location", id),
            Issue::ExpenseMissingPayer { expense, user } => {
                write!(f, "Expense {} was paid by missing user {}", expense, user)
            }
            Issue::ExpenseMissingCreator { expense, user } => {
                write!(f, "Expense {} was created by missing user {}", expense, user)
            }
            Issue::ExpenseMissingRecurring(id) => {
                write!(f, "Expense {} links to a missing recurring expense", id)
            }
            Issue::ExpenseMissingReceipt(id) => write!(f, "Expense {} links to a missing receipt", id),
            Issue::RecurringMissingCategory(id) => {
                write!(f, "Recurring expense {} has a missing category", id)
            }
            Issue::RecurringMissingLocation(id) => {
                write!(f, "Recurring expense {} has a missing location", id)
            }
            Issue::RecurringMissingPayer { template, user } => {
                write!(f, "Recurring expense {} is paid by missing user {}", template, user)
            }
            Issue::SettlementMissingUser { settlement, user } => {
                write!(f, "Settlement {} involves missing user {}", settlement, user)
            }
            Issue::ContributionMissingUser { goal, user } => {
                write!(f, "Goal {} has a contribution from missing user {}", goal, user)
            }
            Issue::ReceiptMissingExpense(id) => write!(f, "Receipt {} links to a missing expense", id),
            Issue::ReceiptMissingFile(id) => write!(f, "Receipt {} has no stored file", id),
            Issue::StrayFile(name) => write!(f, "Receipts directory has unknown file {}", name),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub issues: Vec<Issue>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn repairable_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_repairable()).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairSummary {
    pub repaired: usize,
    /// Issues left for a person to resolve
    pub skipped: usize,
}

pub struct IntegrityService<'a> {
    storage: &'a Storage,
}

impl<'a> IntegrityService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn scan(&self) -> HalfsiesResult<IntegrityReport> {
        let s = self.storage;
        let users: HashSet<UserId> = s.users.all()?.into_iter().map(|u| u.id).collect();
        let categories: HashSet<_> = s.categories.all()?.into_iter().map(|c| c.id).collect();
        let locations: HashSet<_> = s.locations.all()?.into_iter().map(|l| l.id).collect();
        let templates: HashSet<_> = s.recurring.all()?.into_iter().map(|r| r.id).collect();
        let receipts = s.receipts.all()?;
        let receipt_ids: HashSet<_> = receipts.iter().map(|r| r.id).collect();
        let expenses = s.expenses.all()?;
        let expense_ids: HashSet<_> = expenses.iter().map(|e| e.id).collect();

        let mut issues = Vec::new();

        for e in &expenses {
            if !categories.contains(&e.category_id) {
                issues.push(Issue::ExpenseMissingCategory(e.id));
            }
            if e.location_id.is_some_and(|l| !locations.contains(&l)) {
                issues.push(Issue::ExpenseMissingLocation(e.id));
            }
            if !users.contains(&e.paid_by) {
                issues.push(Issue::ExpenseMissingPayer { expense: e.id, user: e.paid_by });
            }
            if !users.contains(&e.created_by) {
                issues.push(Issue::ExpenseMissingCreator { expense: e.id, user: e.created_by });
            }
            if e.recurring_id.is_some_and(|r| !templates.contains(&r)) {
                issues.push(Issue::ExpenseMissingRecurring(e.id));
            }
            if e.receipt_id.is_some_and(|r| !receipt_ids.contains(&r)) {
                issues.push(Issue::ExpenseMissingReceipt(e.id));
            }
        }

        for r in s.recurring.all()? {
            if !categories.contains(&r.category_id) {
                issues.push(Issue::RecurringMissingCategory(r.id));
            }
            if r.location_id.is_some_and(|l| !locations.contains(&l)) {
                issues.push(Issue::RecurringMissingLocation(r.id));
            }
            if !users.contains(&r.paid_by) {
                issues.push(Issue::RecurringMissingPayer { template: r.id, user: r.paid_by });
            }
        }

        for settlement in s.settlements.all()? {
            for user in [settlement.from_user, settlement.to_user] {
                if !users.contains(&user) {
                    issues.push(Issue::SettlementMissingUser { settlement: settlement.id, user });
                }
            }
        }

        for goal in s.goals.all()? {
            let missing: HashSet<UserId> = goal
                .contributions
                .iter()
                .map(|c| c.user_id)
                .filter(|u| !users.contains(u))
                .collect();
            let mut missing: Vec<_> = missing.into_iter().collect();
            missing.sort();
            for user in missing {
                issues.push(Issue::ContributionMissingUser { goal: goal.id, user });
            }
        }

        let mut known_files = HashSet::new();
        for receipt in &receipts {
            known_files.insert(receipt.stored_name.clone());
            if receipt.expense_id.is_some_and(|e| !expense_ids.contains(&e)) {
                issues.push(Issue::ReceiptMissingExpense(receipt.id));
            }
            if !s.blobs.exists(&receipt.stored_name) {
                issues.push(Issue::ReceiptMissingFile(receipt.id));
            }
        }
        for name in s.blobs.list_files()? {
            if !known_files.contains(&name) {
                issues.push(Issue::StrayFile(name));
            }
        }

        if !issues.is_empty() {
            warn!(count = issues.len(), "integrity scan found issues");
        }
        Ok(IntegrityReport { issues })
    }

    /// Fix every repairable issue in `report`
    pub fn repair(&self, report: &IntegrityReport) -> HalfsiesResult<RepairSummary> {
        let s = self.storage;
        let mut summary = RepairSummary::default();
        let now = Utc::now();

        let needs_fallback = report.issues.iter().any(|i| {
            matches!(
                i,
                Issue::ExpenseMissingCategory(_) | Issue::RecurringMissingCategory(_)
            )
        });
        let fallback = if needs_fallback {
            Some(CategoryService::new(s).fallback()?.id)
        } else {
            None
        };

        for issue in &report.issues {
            let fixed = match issue {
                Issue::ExpenseMissingCategory(id) => {
                    let Some(fallback) = fallback else { continue };
                    s.expenses.update_where(|e| e.id == *id, |e| {
                        e.category_id = fallback;
                        e.updated_at = now;
                    })?
                    .len()
                }
                Issue::ExpenseMissingLocation(id) => s
                    .expenses
                    .update_where(|e| e.id == *id, |e| {
                        e.location_id = None;
                        e.updated_at = now;
                    })?
                    .len(),
                Issue::ExpenseMissingRecurring(id) => s
                    .expenses
                    .update_where(|e| e.id == *id, |e| {
                        e.recurring_id = None;
                        e.updated_at = now;
                    })?
                    .len(),
                Issue::ExpenseMissingReceipt(id) => s
                    .expenses
                    .update_where(|e| e.id == *id, |e| {
                        e.receipt_id = None;
                        e.updated_at = now;
                    })?
                    .len(),
                Issue::RecurringMissingCategory(id) => {
                    let Some(fallback) = fallback else { continue };
                    s.recurring.update_where(|r| r.id == *id, |r| {
                        r.category_id = fallback;
                        r.updated_at = now;
                    })?
                    .len()
                }
                Issue::RecurringMissingLocation(id) => s
                    .recurring
                    .update_where(|r| r.id == *id, |r| {
                        r.location_id = None;
                        r.updated_at = now;
                    })?
                    .len(),
                Issue::ReceiptMissingExpense(id) => s
                    .receipts
                    .update_where(|r| r.id == *id, |r| r.expense_id = None)?
                    .len(),
                Issue::ReceiptMissingFile(id) => match s.receipts.delete(*id)? {
                    Some(receipt) => {
                        s.expenses.update_where(|e| e.receipt_id == Some(*id), |e| {
                            e.receipt_id = None;
                            e.updated_at = now;
                        })?;
                        s.log_delete(
                            EntityType::Receipt,
                            receipt.id.to_string(),
                            Some(receipt.original_name.clone()),
                            &receipt,
                        )?;
                        1
                    }
                    None => 0,
                },
                Issue::StrayFile(name) => {
                    s.blobs.remove(name)?;
                    1
                }
                Issue::ExpenseMissingPayer { .. }
                | Issue::ExpenseMissingCreator { .. }
                | Issue::RecurringMissingPayer { .. }
                | Issue::SettlementMissingUser { .. }
                | Issue::ContributionMissingUser { .. } => {
                    summary.skipped += 1;
                    continue;
                }
            };
            summary.repaired += fixed.min(1);
        }

        s.save_all()?;
        info!(repaired = summary.repaired, skipped = summary.skipped, "integrity repair finished");
        Ok(summary)
    }
}
