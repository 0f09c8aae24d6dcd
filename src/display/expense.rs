//! Expense list and detail views

use tabled::Tabled;

use super::{table, truncate, Names};
use crate::models::{Expense, Money};

#[derive(Tabled)]
struct ExpenseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Paid by")]
    paid_by: String,
    #[tabled(rename = "Split")]
    split: &'static str,
    #[tabled(rename = "")]
    flags: String,
}

fn flags(expense: &Expense) -> String {
    let mut flags = String::new();
    if expense.is_recurring() {
        flags.push('↻');
    }
    if expense.receipt_id.is_some() {
        flags.push('📎');
    }
    flags
}

pub fn format_expense_list(expenses: &[Expense], names: &Names, currency: &str) -> String {
    let rows = expenses
        .iter()
        .map(|e| ExpenseRow {
            id: e.id.to_string(),
            date: e.date.to_string(),
            description: truncate(&e.description, 30),
            amount: e.amount.format_with_symbol(currency),
            category: names.category(e.category_id).to_string(),
            paid_by: names.user(e.paid_by).to_string(),
            split: e.split_type.as_str(),
            flags: flags(e),
        })
        .collect();

    let mut output = table(rows, "No expenses found.");
    if !expenses.is_empty() {
        let total: Money = expenses.iter().map(|e| e.amount).sum();
        output.push_str(&format!(
            "{} expense(s), total {}\n",
            expenses.len(),
            total.format_with_symbol(currency)
        ));
    }
    output
}

pub fn format_expense_details(expense: &Expense, names: &Names, currency: &str) -> String {
    let (payer_share, other_share) = expense.shares();
    let mut output = String::new();

    output.push_str(&format!("Expense:     {}\n", expense.id));
    output.push_str(&format!("Description: {}\n", expense.description));
    output.push_str(&format!("Date:        {}\n", expense.date));
    output.push_str(&format!(
        "Amount:      {}\n",
        expense.amount.format_with_symbol(currency)
    ));
    output.push_str(&format!("Category:    {}\n", names.category(expense.category_id)));
    if expense.location_id.is_some() {
        output.push_str(&format!("Location:    {}\n", names.location(expense.location_id)));
    }
    output.push_str(&format!("Paid by:     {}\n", names.user(expense.paid_by)));
    output.push_str(&format!(
        "Split:       {} (payer {}, other {})\n",
        expense.split_type,
        payer_share.format_with_symbol(currency),
        other_share.format_with_symbol(currency)
    ));
    if !expense.notes.is_empty() {
        output.push_str(&format!("Notes:       {}\n", expense.notes));
    }
    if let Some(recurring) = expense.recurring_id {
        output.push_str(&format!("Recurring:   {}\n", recurring));
    }
    if let Some(receipt) = expense.receipt_id {
        output.push_str(&format!("Receipt:     {}\n", receipt));
    }
    output.push_str(&format!(
        "Added by:    {} on {}\n",
        names.user(expense.created_by),
        expense.created_at.format("%Y-%m-%d %H:%M")
    ));
    output
}
