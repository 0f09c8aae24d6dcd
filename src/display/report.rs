//! Month statements, analytics and integrity reports

use tabled::Tabled;

use super::{table, truncate};
use crate::models::Money;
use crate::services::{Analytics, Balance, IntegrityReport, MonthData};

/// Format a percentage with appropriate precision
pub fn format_percentage(pct: f64) -> String {
    if pct < 0.1 && pct > 0.0 {
        format!("{:.2}%", pct)
    } else if pct < 10.0 {
        format!("{:.1}%", pct)
    } else {
        format!("{:.0}%", pct)
    }
}

/// Simple horizontal bar
pub fn format_bar(value: f64, max_value: f64, width: usize) -> String {
    if max_value <= 0.0 || value <= 0.0 {
        return "░".repeat(width);
    }
    let filled = ((value / max_value) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn separator(width: usize) -> String {
    "─".repeat(width)
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "Member")]
    name: String,
    #[tabled(rename = "Paid")]
    paid: String,
    #[tabled(rename = "Share")]
    share: String,
    #[tabled(rename = "Expenses")]
    count: usize,
    #[tabled(rename = "Settled")]
    settled: String,
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    name: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Share")]
    share: String,
}

pub fn format_month_data(data: &MonthData, currency: &str) -> String {
    let money = |m: Money| m.format_with_symbol(currency);
    let mut output = String::new();

    output.push_str(&format!("{}\n", data.month.long_name()));
    output.push_str(&separator(40));
    output.push('\n');
    output.push_str(&format!(
        "Spent {} across {} expense(s)\n\n",
        money(data.total_spent),
        data.expense_count
    ));

    let members = data
        .members
        .iter()
        .map(|m| MemberRow {
            name: m.name.clone(),
            paid: money(m.paid),
            share: money(m.share),
            count: m.expense_count,
            settled: money(m.settled),
        })
        .collect();
    output.push_str(&table(members, ""));

    if !data.categories.is_empty() {
        output.push('\n');
        let rows = data
            .categories
            .iter()
            .map(|c| CategoryRow {
                name: c.name.clone(),
                amount: money(c.amount),
                count: c.count,
                share: format!(
                    "{} {}",
                    format_bar(c.percentage, 100.0, 10),
                    format_percentage(c.percentage)
                ),
            })
            .collect();
        output.push_str(&table(rows, ""));
    }

    output.push('\n');
    if data.gross != data.net {
        let settled: Money = data.settlements.iter().map(|s| s.amount).sum();
        output.push_str(&format!(
            "{} in settlement payment(s) recorded\n",
            money(settled)
        ));
    }
    output.push_str(&format!("Balance: {}\n", data.describe_balance(currency)));
    output
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Spent")]
    total: String,
    #[tabled(rename = "Expenses")]
    count: usize,
    #[tabled(rename = "Outstanding")]
    balance: String,
}

pub fn format_analytics(analytics: &Analytics, names: &super::Names, currency: &str) -> String {
    let money = |m: Money| m.format_with_symbol(currency);
    let mut output = String::new();

    output.push_str(&format!(
        "Spending from {} to {}\n",
        analytics.from.long_name(),
        analytics.to.long_name()
    ));
    output.push_str(&separator(40));
    output.push('\n');
    output.push_str(&format!("Total:           {}\n", money(analytics.total_spent)));
    output.push_str(&format!("Monthly average: {}\n", money(analytics.average_monthly)));
    if let Some(largest) = &analytics.largest_expense {
        output.push_str(&format!(
            "Largest:         {} on {} ({})\n",
            money(largest.amount),
            largest.date,
            truncate(&largest.description, 30)
        ));
    }
    output.push('\n');

    let months = analytics
        .months
        .iter()
        .map(|m| MonthRow {
            month: m.month.to_string(),
            total: money(m.total),
            count: m.expense_count,
            balance: match m.balance {
                None => "-".to_string(),
                Some(Balance::Settled) => "settled".to_string(),
                Some(Balance::Owing { debtor, creditor, amount }) => format!(
                    "{} → {} {}",
                    names.user(debtor),
                    names.user(creditor),
                    money(amount)
                ),
            },
        })
        .collect();
    output.push_str(&table(months, ""));

    if !analytics.categories.is_empty() {
        output.push_str("\nBy category:\n");
        let max = analytics.categories[0].amount.cents() as f64;
        for c in &analytics.categories {
            output.push_str(&format!(
                "  {:<20} {:>12} {} {}\n",
                truncate(&c.name, 20),
                money(c.amount),
                format_bar(c.amount.cents() as f64, max, 20),
                format_percentage(c.percentage)
            ));
        }
    }

    if !analytics.locations.is_empty() {
        output.push_str("\nBy location:\n");
        for l in &analytics.locations {
            output.push_str(&format!(
                "  {:<20} {:>12} {:>6}\n",
                truncate(&l.name, 20),
                money(l.amount),
                format_percentage(l.percentage)
            ));
        }
    }

    if !analytics.paid_by.is_empty() {
        output.push_str("\nPaid by:\n");
        for p in &analytics.paid_by {
            output.push_str(&format!(
                "  {:<20} {:>12} ({} expense(s))\n",
                p.name,
                money(p.paid),
                p.count
            ));
        }
    }
    output
}

pub fn format_integrity_report(report: &IntegrityReport) -> String {
    if report.is_clean() {
        return "No integrity issues found.\n".to_string();
    }
    let mut output = format!("Found {} issue(s):\n", report.issues.len());
    for issue in &report.issues {
        let marker = if issue.is_repairable() { "fixable" } else { "manual" };
        output.push_str(&format!("  [{}] {}\n", marker, issue));
    }
    let repairable = report.repairable_count();
    if repairable > 0 {
        output.push_str(&format!(
            "\n{} issue(s) can be repaired with 'halfsies check --fix'.\n",
            repairable
        ));
    }
    output
}
