//! Spending analytics over a range of months

use std::collections::HashMap;
use tracing::debug;

use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{CategoryId, Expense, LocationId, Money, Month, UserId};
use crate::storage::Storage;

use super::settlement::{Balance, SettlementService};

/// Longest range `analytics` accepts
pub const MAX_ANALYTICS_MONTHS: usize = 36;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBreakdown {
    pub category_id: CategoryId,
    pub name: String,
    pub amount: Money,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationBreakdown {
    /// `None` groups untagged expenses
    pub location_id: Option<LocationId>,
    pub name: String,
    pub amount: Money,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotal {
    pub month: Month,
    pub total: Money,
    pub expense_count: usize,
    /// Net balance after settlements; absent unless the household has two members
    pub balance: Option<Balance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPaid {
    pub user_id: UserId,
    pub name: String,
    pub paid: Money,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct Analytics {
    pub from: Month,
    pub to: Month,
    pub months: Vec<MonthTotal>,
    pub categories: Vec<CategoryBreakdown>,
    pub locations: Vec<LocationBreakdown>,
    pub paid_by: Vec<UserPaid>,
    pub total_spent: Money,
    /// Total divided by the number of months in the range, rounded to the cent
    pub average_monthly: Money,
    pub largest_expense: Option<Expense>,
}

/// Group expenses by category, largest first
pub(crate) fn category_breakdown(
    storage: &Storage,
    expenses: &[Expense],
) -> HalfsiesResult<Vec<CategoryBreakdown>> {
    let total: Money = expenses.iter().map(|e| e.amount).sum();
    let mut groups: HashMap<CategoryId, (Money, usize)> = HashMap::new();
    for expense in expenses {
        let entry = groups.entry(expense.category_id).or_default();
        entry.0 += expense.amount;
        entry.1 += 1;
    }

    let mut breakdown = Vec::with_capacity(groups.len());
    for (category_id, (amount, count)) in groups {
        let name = storage
            .categories
            .get(category_id)?
            .map(|c| c.name)
            .unwrap_or_else(|| "Unknown category".to_string());
        breakdown.push(CategoryBreakdown {
            category_id,
            name,
            amount,
            count,
            percentage: amount.percentage_of(total),
        });
    }
    breakdown.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    Ok(breakdown)
}

fn location_breakdown(
    storage: &Storage,
    expenses: &[Expense],
) -> HalfsiesResult<Vec<LocationBreakdown>> {
    let total: Money = expenses.iter().map(|e| e.amount).sum();
    let mut groups: HashMap<Option<LocationId>, (Money, usize)> = HashMap::new();
    for expense in expenses {
        let entry = groups.entry(expense.location_id).or_default();
        entry.0 += expense.amount;
        entry.1 += 1;
    }

    let mut breakdown = Vec::with_capacity(groups.len());
    for (location_id, (amount, count)) in groups {
        let name = match location_id {
            Some(id) => storage
                .locations
                .get(id)?
                .map(|l| l.name)
                .unwrap_or_else(|| "Unknown location".to_string()),
            None => "No location".to_string(),
        };
        breakdown.push(LocationBreakdown {
            location_id,
            name,
            amount,
            count,
            percentage: amount.percentage_of(total),
        });
    }
    breakdown.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    Ok(breakdown)
}

pub struct AnalyticsService<'a> {
    storage: &'a Storage,
}

impl<'a> AnalyticsService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Analytics for the inclusive range `from..=to`
    pub fn analytics(&self, from: Month, to: Month) -> HalfsiesResult<Analytics> {
        if from > to {
            return Err(HalfsiesError::Validation(format!(
                "Start month {} is after end month {}",
                from, to
            )));
        }
        let months = Month::range(from, to);
        if months.len() > MAX_ANALYTICS_MONTHS {
            return Err(HalfsiesError::Validation(format!(
                "Range covers {} months; at most {} are allowed",
                months.len(),
                MAX_ANALYTICS_MONTHS
            )));
        }

        let (start, end) = (from.first_day(), to.last_day());
        let expenses = self
            .storage
            .expenses
            .filter(|e| e.date >= start && e.date <= end)?;

        // Trend balances need both members; without them the totals still stand
        let balances = match SettlementService::new(self.storage).nets_for(&months) {
            Ok(balances) => balances,
            Err(e) if e.is_validation() => HashMap::new(),
            Err(e) => return Err(e),
        };

        let month_totals = months
            .iter()
            .map(|month| {
                let in_month: Vec<&Expense> =
                    expenses.iter().filter(|e| month.contains(e.date)).collect();
                MonthTotal {
                    month: *month,
                    total: in_month.iter().map(|e| e.amount).sum(),
                    expense_count: in_month.len(),
                    balance: balances.get(month).copied(),
                }
            })
            .collect();

        let mut paid_by = Vec::new();
        for user in self.storage.users.all()? {
            let mine: Vec<&Expense> = expenses.iter().filter(|e| e.paid_by == user.id).collect();
            paid_by.push(UserPaid {
                user_id: user.id,
                name: user.name,
                paid: mine.iter().map(|e| e.amount).sum(),
                count: mine.len(),
            });
        }

        let total_spent: Money = expenses.iter().map(|e| e.amount).sum();
        let month_count = months.len() as i64;
        let average_monthly =
            Money::from_cents(total_spent.cents().saturating_add(month_count / 2) / month_count);
        let largest_expense = expenses
            .iter()
            .max_by(|a, b| a.amount.cmp(&b.amount).then(b.date.cmp(&a.date)))
            .cloned();

        debug!(%from, %to, expenses = expenses.len(), "computed analytics");
        Ok(Analytics {
            from,
            to,
            months: month_totals,
            categories: category_breakdown(self.storage, &expenses)?,
            locations: location_breakdown(self.storage, &expenses)?,
            paid_by,
            total_spent,
            average_monthly,
            largest_expense,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{category_id, date, household, storage};
    use crate::services::{CreateExpenseInput, ExpenseService, LocationService};

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    #[test]
    fn test_range_validation() {
        let (storage, _temp) = storage();
        let service = AnalyticsService::new(&storage);

        assert!(service
            .analytics(month("2025-03"), month("2025-01"))
            .unwrap_err()
            .is_validation());
        assert!(service
            .analytics(month("2022-01"), month("2025-01"))
            .unwrap_err()
            .is_validation());
        assert!(service.analytics(month("2023-02"), month("2026-01")).is_ok());
    }

    #[test]
    fn test_totals_breakdowns_and_trend() {
        let (storage, alex, sam, _temp) = household();
        let expenses = ExpenseService::new(&storage);
        let groceries = category_id(&storage, "Groceries");
        let rent = category_id(&storage, "Rent");
        let market = LocationService::new(&storage).create("Market", None).unwrap();

        let mut veg = CreateExpenseInput::new("Veg", Money::from_cents(3000), date(2025, 1, 10), groceries, alex.id);
        veg.location_id = Some(market.id);
        expenses.create(veg, alex.id).unwrap();
        expenses
            .create(CreateExpenseInput::new("Rent", Money::from_cents(120000), date(2025, 2, 1), rent, sam.id), sam.id)
            .unwrap();
        // Outside the range
        expenses
            .create(CreateExpenseInput::new("Old", Money::from_cents(999), date(2024, 12, 31), rent, sam.id), sam.id)
            .unwrap();

        let report = AnalyticsService::new(&storage)
            .analytics(month("2025-01"), month("2025-03"))
            .unwrap();

        assert_eq!(report.months.len(), 3);
        assert_eq!(report.months[0].total.cents(), 3000);
        assert_eq!(report.months[2].expense_count, 0);
        assert_eq!(report.months[2].balance, Some(Balance::Settled));
        assert_eq!(
            report.months[1].balance,
            Some(Balance::Owing {
                debtor: alex.id,
                creditor: sam.id,
                amount: Money::from_cents(60000)
            })
        );

        assert_eq!(report.total_spent.cents(), 123000);
        assert_eq!(report.average_monthly.cents(), 41000);
        assert_eq!(report.largest_expense.unwrap().description, "Rent");

        assert_eq!(report.categories[0].name, "Rent");
        let names: Vec<_> = report.locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["No location", "Market"]);

        let alex_paid = report.paid_by.iter().find(|p| p.user_id == alex.id).unwrap();
        assert_eq!(alex_paid.paid.cents(), 3000);
    }

    #[test]
    fn test_trend_balances_include_settlements() {
        let (storage, alex, sam, _temp) = household();
        let rent = category_id(&storage, "Rent");
        let expenses = ExpenseService::new(&storage);
        for (day, payer) in [(date(2025, 1, 1), sam.id), (date(2025, 2, 1), alex.id)] {
            expenses
                .create(CreateExpenseInput::new("Rent", Money::from_cents(100000), day, rent, payer), payer)
                .unwrap();
        }
        let settlements = SettlementService::new(&storage);
        settlements
            .record(
                crate::services::RecordSettlementInput {
                    from_user: alex.id,
                    to_user: sam.id,
                    amount: Money::from_cents(50000),
                    month: month("2025-01"),
                    date: Some(date(2025, 1, 31)),
                    note: String::new(),
                },
                alex.id,
            )
            .unwrap();
        settlements
            .record(
                crate::services::RecordSettlementInput {
                    from_user: sam.id,
                    to_user: alex.id,
                    amount: Money::from_cents(20000),
                    month: month("2025-02"),
                    date: Some(date(2025, 2, 28)),
                    note: String::new(),
                },
                sam.id,
            )
            .unwrap();

        let report = AnalyticsService::new(&storage)
            .analytics(month("2025-01"), month("2025-02"))
            .unwrap();
        assert_eq!(report.months[0].balance, Some(Balance::Settled));
        assert_eq!(
            report.months[1].balance,
            Some(Balance::Owing {
                debtor: sam.id,
                creditor: alex.id,
                amount: Money::from_cents(30000)
            })
        );
    }

    #[test]
    fn test_single_member_has_no_balance_trend() {
        let (storage, _temp) = storage();
        crate::services::UserService::new(&storage)
            .register("Alex", "alex@example.com", "password123")
            .unwrap();
        let report = AnalyticsService::new(&storage)
            .analytics(month("2025-01"), month("2025-01"))
            .unwrap();
        assert_eq!(report.months[0].balance, None);
        assert!(report.largest_expense.is_none());
    }
}
