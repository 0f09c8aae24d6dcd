//! Tables for members, categories, locations, recurring bills, settlements
//! and receipts

use tabled::Tabled;

use super::{table, truncate, Names};
use crate::models::{Category, Location, Receipt, RecurringExpense, Settlement, User, UserId};

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "")]
    marker: &'static str,
}

/// Members, marking the logged-in one
pub fn format_user_list(users: &[User], current: Option<UserId>) -> String {
    let rows = users
        .iter()
        .map(|u| UserRow {
            id: u.id.to_string(),
            name: u.name.clone(),
            email: u.email.clone(),
            marker: if Some(u.id) == current { "(you)" } else { "" },
        })
        .collect();
    table(rows, "No members yet. Run 'halfsies user register'.")
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Category")]
    label: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Expenses")]
    usage: usize,
}

/// Categories paired with the number of expenses using them
pub fn format_category_list(categories: &[(Category, usize)]) -> String {
    let rows = categories
        .iter()
        .map(|(c, usage)| CategoryRow {
            id: c.id.to_string(),
            label: c.label(),
            color: c.color.clone().unwrap_or_default(),
            usage: *usage,
        })
        .collect();
    table(rows, "No categories.")
}

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Location")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
}

pub fn format_location_list(locations: &[Location]) -> String {
    let rows = locations
        .iter()
        .map(|l| LocationRow {
            id: l.id.to_string(),
            name: l.name.clone(),
            address: l.address.clone().unwrap_or_default(),
        })
        .collect();
    table(rows, "No locations.")
}

#[derive(Tabled)]
struct RecurringRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Every")]
    frequency: String,
    #[tabled(rename = "Next due")]
    next_due: String,
    #[tabled(rename = "Paid by")]
    paid_by: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn format_recurring_list(
    templates: &[RecurringExpense],
    names: &Names,
    currency: &str,
) -> String {
    let rows = templates
        .iter()
        .map(|r| RecurringRow {
            id: r.id.to_string(),
            description: truncate(&r.description, 30),
            amount: r.amount.format_with_symbol(currency),
            frequency: r.frequency.to_string(),
            next_due: r.next_due.to_string(),
            paid_by: names.user(r.paid_by).to_string(),
            status: match (r.active, r.end_date) {
                (false, _) => "paused".to_string(),
                (true, Some(end)) => format!("until {}", end),
                (true, None) => "active".to_string(),
            },
        })
        .collect();
    table(rows, "No recurring expenses.")
}

#[derive(Tabled)]
struct SettlementRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Paid on")]
    date: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Note")]
    note: String,
}

pub fn format_settlement_list(settlements: &[Settlement], names: &Names, currency: &str) -> String {
    let rows = settlements
        .iter()
        .map(|s| SettlementRow {
            id: s.id.to_string(),
            month: s.month.to_string(),
            date: s.date.to_string(),
            from: names.user(s.from_user).to_string(),
            to: names.user(s.to_user).to_string(),
            amount: s.amount.format_with_symbol(currency),
            note: truncate(&s.note, 30),
        })
        .collect();
    table(rows, "No settlements recorded.")
}

#[derive(Tabled)]
struct ReceiptRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "File")]
    name: String,
    #[tabled(rename = "Type")]
    content_type: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Expense")]
    expense: String,
    #[tabled(rename = "Uploaded")]
    uploaded: String,
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < KB * KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / (KB * KB) as f64)
    }
}

pub fn format_receipt_list(receipts: &[Receipt], names: &Names) -> String {
    let rows = receipts
        .iter()
        .map(|r| ReceiptRow {
            id: r.id.to_string(),
            name: truncate(&r.original_name, 30),
            content_type: r.content_type.clone(),
            size: human_size(r.size_bytes),
            expense: r
                .expense_id
                .map(|e| e.to_string())
                .unwrap_or_else(|| "-".to_string()),
            uploaded: format!(
                "{} by {}",
                r.uploaded_at.format("%Y-%m-%d"),
                names.user(r.uploaded_by)
            ),
        })
        .collect();
    table(rows, "No receipts.")
}
