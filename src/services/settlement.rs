//! Settlements and the monthly balance between the two members
//!
//! For each expense the non-payer owes the payer their share: half of an
//! equal split (rounded down, so the payer absorbs an odd cent) or the whole
//! amount for custom and 100% splits. Taking A as the member who registered
//! first, the month's gross balance is what B owes A minus what A owes B.
//! Settlement payments recorded for the month then move it toward zero.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{Expense, Money, Month, Settlement, SettlementId, User, UserId};
use crate::storage::Storage;
use crate::validation::{assert_note, assert_positive_amount};

use super::analytics::{category_breakdown, CategoryBreakdown};
use super::user::UserService;
use super::pick_unique;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    Settled,
    Owing {
        debtor: UserId,
        creditor: UserId,
        amount: Money,
    },
}

impl Balance {
    /// Balance for a signed net amount where positive means B owes A
    pub fn from_net(a: UserId, b: UserId, net: Money) -> Self {
        if net.is_positive() {
            Balance::Owing {
                debtor: b,
                creditor: a,
                amount: net,
            }
        } else if net.is_negative() {
            Balance::Owing {
                debtor: a,
                creditor: b,
                amount: net.abs(),
            }
        } else {
            Balance::Settled
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Balance::Settled)
    }
}

/// Gross and net balance for one month's expenses and settlements
///
/// Both figures are signed: positive means B owes A. Expenses paid by anyone
/// other than A or B are ignored.
pub(crate) fn month_balance(
    a: UserId,
    b: UserId,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> (Money, Money) {
    let mut owed_to_a = Money::zero();
    let mut owed_to_b = Money::zero();
    for expense in expenses {
        let (_, other_share) = expense.shares();
        if expense.paid_by == a {
            owed_to_a += other_share;
        } else if expense.paid_by == b {
            owed_to_b += other_share;
        } else {
            warn!(expense = %expense.id, "expense paid by someone outside the household");
        }
    }
    let gross = owed_to_a - owed_to_b;

    let mut net = gross;
    for settlement in settlements {
        if settlement.from_user == b && settlement.to_user == a {
            net -= settlement.amount;
        } else if settlement.from_user == a && settlement.to_user == b {
            net += settlement.amount;
        }
    }
    (gross, net)
}

/// One member's side of a month
#[derive(Debug, Clone)]
pub struct MemberSummary {
    pub user_id: UserId,
    pub name: String,
    /// Total of expenses this member paid for
    pub paid: Money,
    /// This member's share of all the month's expenses
    pub share: Money,
    pub expense_count: usize,
    /// Settlement payments this member sent during the month
    pub settled: Money,
}

#[derive(Debug, Clone)]
pub struct MonthData {
    pub month: Month,
    /// First registered member, then the second
    pub members: Vec<MemberSummary>,
    pub total_spent: Money,
    pub expense_count: usize,
    pub categories: Vec<CategoryBreakdown>,
    /// The month's expenses, oldest first
    pub expenses: Vec<Expense>,
    pub settlements: Vec<Settlement>,
    /// Balance before settlements; positive means the second member owes the first
    pub gross: Money,
    /// Balance after settlements, same sign convention
    pub net: Money,
    pub balance: Balance,
}

impl MonthData {
    pub fn member_name(&self, id: UserId) -> &str {
        self.members
            .iter()
            .find(|m| m.user_id == id)
            .map(|m| m.name.as_str())
            .unwrap_or("Unknown")
    }

    /// "Sam owes Alex $12.50" or "All settled up"
    pub fn describe_balance(&self, currency: &str) -> String {
        match self.balance {
            Balance::Settled => "All settled up".to_string(),
            Balance::Owing {
                debtor,
                creditor,
                amount,
            } => format!(
                "{} owes {} {}",
                self.member_name(debtor),
                self.member_name(creditor),
                amount.format_with_symbol(currency)
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordSettlementInput {
    pub from_user: UserId,
    pub to_user: UserId,
    pub amount: Money,
    pub month: Month,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    pub note: String,
}

pub struct SettlementService<'a> {
    storage: &'a Storage,
}

impl<'a> SettlementService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn record(
        &self,
        input: RecordSettlementInput,
        recorded_by: UserId,
    ) -> HalfsiesResult<Settlement> {
        if input.from_user == input.to_user {
            return Err(HalfsiesError::Validation(
                "A settlement must be between two different members".into(),
            ));
        }
        for user in [input.from_user, input.to_user] {
            if !self.storage.users.contains(user)? {
                return Err(HalfsiesError::user_not_found(user.to_string()));
            }
        }
        let amount = assert_positive_amount(input.amount)?;
        let note = assert_note(&input.note)?;
        let date = input
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let mut settlement = Settlement::new(
            input.from_user,
            input.to_user,
            amount,
            input.month,
            date,
            recorded_by,
        );
        settlement.note = note;

        self.storage.settlements.upsert(settlement.clone())?;
        self.storage.settlements.save()?;
        self.storage.log_create(
            EntityType::Settlement,
            settlement.id.to_string(),
            Some(format!("{} for {}", settlement.amount, settlement.month)),
            &settlement,
        )?;
        info!(settlement = %settlement.id, month = %settlement.month, "recorded settlement");
        Ok(settlement)
    }

    /// Settlements, optionally for one month, newest first
    pub fn list(&self, month: Option<Month>) -> HalfsiesResult<Vec<Settlement>> {
        let mut settlements = self
            .storage
            .settlements
            .filter(|s| month.map_or(true, |m| s.month == m))?;
        settlements.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(settlements)
    }

    pub fn get(&self, id: SettlementId) -> HalfsiesResult<Option<Settlement>> {
        self.storage.settlements.get(id)
    }

    pub fn find(&self, identifier: &str) -> HalfsiesResult<Option<Settlement>> {
        pick_unique(
            self.storage.settlements.find_by_identifier(identifier)?,
            "Settlement",
            identifier,
        )
    }

    pub fn delete(&self, id: SettlementId) -> HalfsiesResult<Settlement> {
        let settlement = self
            .get(id)?
            .ok_or_else(|| HalfsiesError::settlement_not_found(id.to_string()))?;
        self.storage.settlements.delete(id)?;
        self.storage.settlements.save()?;
        self.storage.log_delete(
            EntityType::Settlement,
            settlement.id.to_string(),
            Some(format!("{} for {}", settlement.amount, settlement.month)),
            &settlement,
        )?;
        Ok(settlement)
    }

    /// Everything needed to show or send a month's statement
    pub fn month_data(&self, month: Month) -> HalfsiesResult<MonthData> {
        let (a, b) = UserService::new(self.storage).household()?;

        let mut expenses = self.storage.expenses.filter(|e| month.contains(e.date))?;
        expenses.sort_by(|x, y| x.date.cmp(&y.date).then(x.created_at.cmp(&y.created_at)));
        let settlements = self.storage.settlements.filter(|s| s.month == month)?;

        let (gross, net) = month_balance(a.id, b.id, &expenses, &settlements);
        let members = vec![
            member_summary(&a, b.id, &expenses, &settlements),
            member_summary(&b, a.id, &expenses, &settlements),
        ];

        let total_spent: Money = expenses.iter().map(|e| e.amount).sum();
        let categories = category_breakdown(self.storage, &expenses)?;
        debug!(%month, expenses = expenses.len(), %net, "computed month data");

        Ok(MonthData {
            month,
            members,
            total_spent,
            expense_count: expenses.len(),
            categories,
            expenses,
            settlements,
            gross,
            net,
            balance: Balance::from_net(a.id, b.id, net),
        })
    }

    /// Per-month net balances for a list of months, keyed by month
    pub(crate) fn nets_for(&self, months: &[Month]) -> HalfsiesResult<HashMap<Month, Balance>> {
        let (a, b) = UserService::new(self.storage).household()?;
        let mut balances = HashMap::new();
        for month in months {
            let expenses = self.storage.expenses.filter(|e| month.contains(e.date))?;
            let settlements = self.storage.settlements.filter(|s| s.month == *month)?;
            let (_, net) = month_balance(a.id, b.id, &expenses, &settlements);
            balances.insert(*month, Balance::from_net(a.id, b.id, net));
        }
        Ok(balances)
    }
}

/// `partner` is the other member; expenses paid by anyone else are skipped
fn member_summary(
    user: &User,
    partner: UserId,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> MemberSummary {
    let mut summary = MemberSummary {
        user_id: user.id,
        name: user.name.clone(),
        paid: Money::zero(),
        share: Money::zero(),
        expense_count: 0,
        settled: Money::zero(),
    };
    for expense in expenses {
        let (payer_share, other_share) = expense.shares();
        if expense.paid_by == user.id {
            summary.paid += expense.amount;
            summary.share += payer_share;
            summary.expense_count += 1;
        } else if expense.paid_by == partner {
            summary.share += other_share;
        }
    }
    summary.settled = settlements
        .iter()
        .filter(|s| s.from_user == user.id)
        .map(|s| s.amount)
        .sum();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, SplitType};
    use crate::services::test_support::{category_id, date, household, storage};
    use crate::services::{CreateExpenseInput, ExpenseService, UserService};

    fn add(storage: &Storage, cents: i64, day: u32, paid_by: UserId, split: SplitType, category: CategoryId) {
        let mut input = CreateExpenseInput::new(
            "Shared",
            Money::from_cents(cents),
            date(2025, 1, day),
            category,
            paid_by,
        );
        input.split_type = split;
        ExpenseService::new(storage).create(input, paid_by).unwrap();
    }

    fn settle(storage: &Storage, from: UserId, to: UserId, cents: i64) {
        SettlementService::new(storage)
            .record(
                RecordSettlementInput {
                    from_user: from,
                    to_user: to,
                    amount: Money::from_cents(cents),
                    month: "2025-01".parse().unwrap(),
                    date: Some(date(2025, 2, 1)),
                    note: String::new(),
                },
                from,
            )
            .unwrap();
    }

    fn january() -> Month {
        "2025-01".parse().unwrap()
    }

    #[test]
    fn test_equal_split_odd_cent_absorbed_by_payer() {
        let (storage, alex, sam, _temp) = household();
        let groceries = category_id(&storage, "Groceries");
        add(&storage, 1001, 5, alex.id, SplitType::Equal, groceries);

        let data = SettlementService::new(&storage).month_data(january()).unwrap();
        assert_eq!(data.gross.cents(), 500);
        assert_eq!(
            data.balance,
            Balance::Owing {
                debtor: sam.id,
                creditor: alex.id,
                amount: Money::from_cents(500)
            }
        );
        assert_eq!(data.members[0].share.cents(), 501);
        assert_eq!(data.members[1].share.cents(), 500);
    }

    #[test]
    fn test_mixed_splits_and_settlements() {
        let (storage, alex, sam, _temp) = household();
        let groceries = category_id(&storage, "Groceries");
        let rent = category_id(&storage, "Rent");

        // Sam owes Alex 50.00 + 30.00
        add(&storage, 10000, 3, alex.id, SplitType::Equal, groceries);
        add(&storage, 3000, 4, alex.id, SplitType::Full, groceries);
        // Alex owes Sam 20.00 for a custom split
        add(&storage, 2000, 6, sam.id, SplitType::Custom, rent);

        let service = SettlementService::new(&storage);
        let data = service.month_data(january()).unwrap();
        assert_eq!(data.gross.cents(), 6000);
        assert_eq!(data.total_spent.cents(), 15000);
        assert_eq!(data.expense_count, 3);
        assert_eq!(data.members[0].paid.cents(), 13000);
        assert_eq!(data.members[1].paid.cents(), 2000);
        assert_eq!(data.describe_balance("$"), "Sam owes Alex $60.00");

        settle(&storage, sam.id, alex.id, 4000);
        let data = service.month_data(january()).unwrap();
        assert_eq!(data.net.cents(), 2000);
        assert_eq!(data.members[1].settled.cents(), 4000);

        settle(&storage, sam.id, alex.id, 2000);
        let data = service.month_data(january()).unwrap();
        assert!(data.balance.is_settled());
        assert_eq!(data.describe_balance("$"), "All settled up");

        // Overpaying flips the direction
        settle(&storage, sam.id, alex.id, 500);
        let data = service.month_data(january()).unwrap();
        assert_eq!(
            data.balance,
            Balance::Owing {
                debtor: alex.id,
                creditor: sam.id,
                amount: Money::from_cents(500)
            }
        );
    }

    #[test]
    fn test_payment_from_first_member_reduces_what_they_owe() {
        let (storage, alex, sam, _temp) = household();
        let rent = category_id(&storage, "Rent");
        // Alex owes Sam 60.00
        add(&storage, 12000, 1, sam.id, SplitType::Equal, rent);

        let service = SettlementService::new(&storage);
        let data = service.month_data(january()).unwrap();
        assert_eq!(data.gross.cents(), -6000);
        assert_eq!(data.describe_balance("$"), "Alex owes Sam $60.00");

        settle(&storage, alex.id, sam.id, 2500);
        let data = service.month_data(january()).unwrap();
        assert_eq!(data.gross.cents(), -6000);
        assert_eq!(data.net.cents(), -3500);
        assert_eq!(data.members[0].settled.cents(), 2500);
        assert_eq!(data.describe_balance("$"), "Alex owes Sam $35.00");

        settle(&storage, alex.id, sam.id, 3500);
        assert!(service.month_data(january()).unwrap().balance.is_settled());
    }

    #[test]
    fn test_expense_paid_by_non_member_is_ignored() {
        let (storage, alex, sam, _temp) = household();
        let groceries = category_id(&storage, "Groceries");
        add(&storage, 1000, 2, alex.id, SplitType::Equal, groceries);
        add(&storage, 8000, 3, sam.id, SplitType::Full, groceries);

        let stranger = UserId::new();
        storage
            .expenses
            .update_where(|e| e.paid_by == sam.id, |e| e.paid_by = stranger)
            .unwrap();

        let data = SettlementService::new(&storage).month_data(january()).unwrap();
        assert_eq!(data.gross.cents(), 500);
        assert_eq!(data.describe_balance("$"), "Sam owes Alex $5.00");
        assert_eq!(data.members[0].share.cents(), 500);
        assert_eq!(data.members[1].share.cents(), 500);
        assert_eq!(data.members[1].paid.cents(), 0);
        assert_eq!(data.members[1].expense_count, 0);
    }

    #[test]
    fn test_large_stored_amounts_do_not_overflow() {
        let (storage, alex, sam, _temp) = household();
        let groceries = category_id(&storage, "Groceries");
        add(&storage, 100, 2, alex.id, SplitType::Full, groceries);
        add(&storage, 100, 3, alex.id, SplitType::Full, groceries);
        storage
            .expenses
            .update_where(|_| true, |e| e.amount = Money::from_cents(i64::MAX / 2 + 1))
            .unwrap();

        let data = SettlementService::new(&storage).month_data(january()).unwrap();
        assert_eq!(data.total_spent.cents(), i64::MAX);
        assert_eq!(
            data.balance,
            Balance::Owing {
                debtor: sam.id,
                creditor: alex.id,
                amount: Money::from_cents(i64::MAX)
            }
        );
    }

    #[test]
    fn test_huge_expense_is_rejected() {
        let (storage, alex, _sam, _temp) = household();
        let input = CreateExpenseInput::new(
            "Castle",
            crate::validation::MAX_AMOUNT + Money::from_cents(1),
            date(2025, 1, 1),
            category_id(&storage, "Other"),
            alex.id,
        );
        let err = ExpenseService::new(&storage).create(input, alex.id).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_categories_sorted_by_amount() {
        let (storage, alex, _sam, _temp) = household();
        let groceries = category_id(&storage, "Groceries");
        let rent = category_id(&storage, "Rent");
        add(&storage, 2000, 2, alex.id, SplitType::Equal, groceries);
        add(&storage, 6000, 1, alex.id, SplitType::Equal, rent);
        add(&storage, 2000, 9, alex.id, SplitType::Equal, groceries);

        let data = SettlementService::new(&storage).month_data(january()).unwrap();
        assert_eq!(data.categories[0].name, "Rent");
        assert_eq!(data.categories[0].percentage, 60.0);
        assert_eq!(data.categories[1].count, 2);
        assert_eq!(data.expenses[0].date, date(2025, 1, 1));
    }

    #[test]
    fn test_month_data_requires_two_members() {
        let (storage, _temp) = storage();
        UserService::new(&storage)
            .register("Alex", "alex@example.com", "password123")
            .unwrap();
        let err = SettlementService::new(&storage)
            .month_data(january())
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("two household members"));
    }

    #[test]
    fn test_record_validation() {
        let (storage, alex, sam, _temp) = household();
        let service = SettlementService::new(&storage);
        let input = RecordSettlementInput {
            from_user: alex.id,
            to_user: alex.id,
            amount: Money::from_cents(100),
            month: january(),
            date: None,
            note: String::new(),
        };
        assert!(service.record(input.clone(), alex.id).unwrap_err().is_validation());

        let zero = RecordSettlementInput {
            to_user: sam.id,
            amount: Money::zero(),
            ..input
        };
        assert!(service.record(zero, alex.id).unwrap_err().is_validation());
    }

    #[test]
    fn test_list_and_delete() {
        let (storage, alex, sam, _temp) = household();
        settle(&storage, sam.id, alex.id, 1000);
        let service = SettlementService::new(&storage);

        let listed = service.list(Some(january())).unwrap();
        assert_eq!(listed.len(), 1);
        assert!(service.list(Some("2025-02".parse().unwrap())).unwrap().is_empty());

        service.delete(listed[0].id).unwrap();
        assert!(service.list(None).unwrap().is_empty());
    }
}
