//! Monthly statement emails

use std::fmt::Write;

use tracing::info;

use crate::email::{Mailer, OutgoingEmail};
use crate::error::HalfsiesResult;
use crate::models::Month;
use crate::storage::Storage;

use super::settlement::{MonthData, SettlementService};
use super::user::UserService;

/// Plain-text statement for a month
pub fn render_statement(data: &MonthData, currency: &str) -> String {
    let money = |m: crate::models::Money| m.format_with_symbol(currency);
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "Halfsies statement for {}", data.month.long_name());
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Total spent: {} across {} expense(s)",
        money(data.total_spent),
        data.expense_count
    );
    for member in &data.members {
        let _ = writeln!(
            out,
            "  {} paid {} (share {}, settled {})",
            member.name,
            money(member.paid),
            money(member.share),
            money(member.settled)
        );
    }

    if !data.categories.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "By category:");
        for category in &data.categories {
            let _ = writeln!(
                out,
                "  {:<20} {:>12} {:>5.1}%",
                category.name,
                money(category.amount),
                category.percentage
            );
        }
    }

    if !data.expenses.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Expenses:");
        for expense in &data.expenses {
            let _ = writeln!(
                out,
                "  {}  {:<30} {:>12}  paid by {} ({})",
                expense.date,
                expense.description,
                money(expense.amount),
                data.member_name(expense.paid_by),
                expense.split_type.as_str()
            );
        }
    }

    if !data.settlements.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Settlements:");
        for settlement in &data.settlements {
            let _ = writeln!(
                out,
                "  {}  {} paid {} {}",
                settlement.date,
                data.member_name(settlement.from_user),
                data.member_name(settlement.to_user),
                money(settlement.amount)
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Before settlements: {}", describe_gross(data, currency));
    let _ = writeln!(out, "Balance: {}", data.describe_balance(currency));
    out
}

fn describe_gross(data: &MonthData, currency: &str) -> String {
    let (first, second) = match data.members.as_slice() {
        [a, b, ..] => (a.name.as_str(), b.name.as_str()),
        _ => return data.gross.format_with_symbol(currency),
    };
    if data.gross.is_positive() {
        format!("{} owes {} {}", second, first, data.gross.format_with_symbol(currency))
    } else if data.gross.is_negative() {
        format!("{} owes {} {}", first, second, data.gross.abs().format_with_symbol(currency))
    } else {
        "even".to_string()
    }
}

pub struct NotificationService<'a, M: Mailer> {
    storage: &'a Storage,
    mailer: M,
}

impl<'a, M: Mailer> NotificationService<'a, M> {
    pub fn new(storage: &'a Storage, mailer: M) -> Self {
        Self { storage, mailer }
    }

    /// Build the statement email for `month` without sending it
    pub fn month_statement(&self, month: Month) -> HalfsiesResult<OutgoingEmail> {
        let data = SettlementService::new(self.storage).month_data(month)?;
        let (a, b) = UserService::new(self.storage).household()?;
        Ok(OutgoingEmail {
            from: self.mailer.sender().to_string(),
            to: vec![a.email, b.email],
            subject: format!("Halfsies: {} statement", month.long_name()),
            text: render_statement(&data, &self.storage.settings().currency_symbol),
        })
    }

    /// Email the month's statement to both members
    pub fn send_month_statement(&self, month: Month) -> HalfsiesResult<OutgoingEmail> {
        let email = self.month_statement(month)?;
        self.mailer.send(&email)?;
        info!(%month, "sent month statement");
        Ok(email)
    }
}
