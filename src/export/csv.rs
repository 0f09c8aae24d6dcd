//! CSV export of expenses and settlements
//!
//! Ids are resolved to names so the files open cleanly in a spreadsheet.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use crate::error::HalfsiesResult;
use crate::models::{Month, UserId};
use crate::storage::Storage;

#[derive(Debug, Serialize)]
struct ExpenseRow<'a> {
    id: String,
    date: String,
    description: &'a str,
    amount: String,
    category: String,
    location: String,
    paid_by: String,
    split: &'static str,
    recurring: bool,
    has_receipt: bool,
    notes: &'a str,
}

#[derive(Debug, Serialize)]
struct SettlementRow<'a> {
    id: String,
    month: String,
    date: String,
    from: String,
    to: String,
    amount: String,
    note: &'a str,
}

fn user_names(storage: &Storage) -> HalfsiesResult<HashMap<UserId, String>> {
    Ok(storage
        .users
        .all()?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect())
}

fn name_or_unknown<K: std::hash::Hash + Eq>(names: &HashMap<K, String>, key: &K) -> String {
    names
        .get(key)
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Write expenses, oldest first, optionally limited to one month
///
/// Returns the number of rows written.
pub fn export_expenses_csv<W: Write>(
    storage: &Storage,
    writer: W,
    month: Option<Month>,
) -> HalfsiesResult<usize> {
    let users = user_names(storage)?;
    let categories: HashMap<_, _> = storage
        .categories
        .all()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let locations: HashMap<_, _> = storage
        .locations
        .all()?
        .into_iter()
        .map(|l| (l.id, l.name))
        .collect();

    let mut expenses = storage
        .expenses
        .filter(|e| month.map_or(true, |m| m.contains(e.date)))?;
    expenses.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));

    let mut csv = csv::Writer::from_writer(writer);
    for expense in &expenses {
        csv.serialize(ExpenseRow {
            id: expense.id.to_string(),
            date: expense.date.to_string(),
            description: &expense.description,
            amount: expense.amount.to_decimal_string(),
            category: name_or_unknown(&categories, &expense.category_id),
            location: expense
                .location_id
                .map(|id| name_or_unknown(&locations, &id))
                .unwrap_or_default(),
            paid_by: name_or_unknown(&users, &expense.paid_by),
            split: expense.split_type.as_str(),
            recurring: expense.is_recurring(),
            has_receipt: expense.receipt_id.is_some(),
            notes: &expense.notes,
        })?;
    }
    csv.flush()?;
    Ok(expenses.len())
}

/// Write settlements ordered by month then payment date
pub fn export_settlements_csv<W: Write>(storage: &Storage, writer: W) -> HalfsiesResult<usize> {
    let users = user_names(storage)?;
    let mut settlements = storage.settlements.all()?;
    settlements.sort_by(|a, b| a.month.cmp(&b.month).then(a.date.cmp(&b.date)));

    let mut csv = csv::Writer::from_writer(writer);
    for settlement in &settlements {
        csv.serialize(SettlementRow {
            id: settlement.id.to_string(),
            month: settlement.month.to_string(),
            date: settlement.date.to_string(),
            from: name_or_unknown(&users, &settlement.from_user),
            to: name_or_unknown(&users, &settlement.to_user),
            amount: settlement.amount.to_decimal_string(),
            note: &settlement.note,
        })?;
    }
    csv.flush()?;
    Ok(settlements.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, SplitType};
    use crate::services::test_support::{category_id, date, household};
    use crate::services::{
        CreateExpenseInput, ExpenseService, LocationService, RecordSettlementInput,
        SettlementService,
    };

    #[test]
    fn test_expenses_csv_resolves_names() {
        let (storage, alex, sam, _temp) = household();
        let corner = LocationService::new(&storage)
            .create("Corner shop", None)
            .unwrap();
        let expenses = ExpenseService::new(&storage);

        let mut milk = CreateExpenseInput::new(
            "Milk, eggs",
            Money::from_cents(450),
            date(2025, 2, 3),
            category_id(&storage, "Groceries"),
            alex.id,
        );
        milk.location_id = Some(corner.id);
        expenses.create(milk, alex.id).unwrap();

        let mut rent = CreateExpenseInput::new(
            "Rent",
            Money::from_cents(100000),
            date(2025, 3, 1),
            category_id(&storage, "Rent"),
            sam.id,
        );
        rent.split_type = SplitType::Full;
        expenses.create(rent, sam.id).unwrap();

        let mut out = Vec::new();
        let rows = export_expenses_csv(&storage, &mut out, None).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "id,date,description,amount,category,location,paid_by,split,recurring,has_receipt,notes"
        );
        assert!(lines[1].contains("\"Milk, eggs\",4.50,Groceries,Corner shop,Alex,50/50"));
        assert!(lines[2].contains("Rent,1000.00,Rent,,Sam,100%"));

        let mut march = Vec::new();
        let rows = export_expenses_csv(&storage, &mut march, Some("2025-03".parse().unwrap())).unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_settlements_csv() {
        let (storage, alex, sam, _temp) = household();
        SettlementService::new(&storage)
            .record(
                RecordSettlementInput {
                    from_user: sam.id,
                    to_user: alex.id,
                    amount: Money::from_cents(2500),
                    month: "2025-01".parse().unwrap(),
                    date: Some(date(2025, 2, 2)),
                    note: "bank transfer".into(),
                },
                sam.id,
            )
            .unwrap();

        let mut out = Vec::new();
        assert_eq!(export_settlements_csv(&storage, &mut out).unwrap(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("id,month,date,from,to,amount,note\n"));
        assert!(text.contains(",2025-01,2025-02-02,Sam,Alex,25.00,bank transfer"));
    }
}
