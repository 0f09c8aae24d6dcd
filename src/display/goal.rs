//! Savings goal views

use chrono::NaiveDate;
use tabled::Tabled;

use super::report::{format_bar, format_percentage};
use super::{table, Names};
use crate::models::{GoalProgress, SavingsGoal};

#[derive(Tabled)]
struct GoalRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Goal")]
    name: String,
    #[tabled(rename = "Saved")]
    saved: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "By")]
    target_date: String,
}

pub fn format_goal_list(goals: &[SavingsGoal], today: NaiveDate, currency: &str) -> String {
    let rows = goals
        .iter()
        .map(|g| {
            let progress = g.progress(today);
            let mut name = g.name.clone();
            if g.archived {
                name.push_str(" (archived)");
            }
            GoalRow {
                id: g.id.to_string(),
                name,
                saved: progress.saved.format_with_symbol(currency),
                target: g.target_amount.format_with_symbol(currency),
                progress: format!(
                    "{} {}",
                    format_bar(progress.display_percent(), 100.0, 10),
                    format_percentage(progress.percent)
                ),
                target_date: g.target_date.map(|d| d.to_string()).unwrap_or_default(),
            }
        })
        .collect();
    table(rows, "No savings goals.")
}

pub fn format_goal_details(
    goal: &SavingsGoal,
    progress: &GoalProgress,
    names: &Names,
    currency: &str,
) -> String {
    let money = |m: crate::models::Money| m.format_with_symbol(currency);
    let mut output = String::new();

    output.push_str(&format!("Goal:      {} ({})\n", goal.name, goal.id));
    output.push_str(&format!(
        "Progress:  {} of {}  {} {}\n",
        money(progress.saved),
        money(goal.target_amount),
        format_bar(progress.display_percent(), 100.0, 20),
        format_percentage(progress.percent)
    ));
    if progress.completed {
        output.push_str("Status:    Reached!\n");
    } else {
        output.push_str(&format!("Remaining: {}\n", money(progress.remaining)));
    }

    if let Some(target_date) = goal.target_date {
        output.push_str(&format!("Target:    {}", target_date));
        if progress.overdue {
            output.push_str(" (overdue)");
        } else if let Some(months) = progress.months_left {
            output.push_str(&format!(" ({} month(s) left)", months));
        }
        output.push('\n');
        if let Some(required) = progress.required_monthly.filter(|_| !progress.completed) {
            output.push_str(&format!("Needed:    {} per month\n", money(required)));
        }
    }

    if !progress.by_user.is_empty() {
        output.push_str("\nBy member:\n");
        for (user, amount) in &progress.by_user {
            output.push_str(&format!("  {:<20} {:>12}\n", names.user(*user), money(*amount)));
        }
    }

    if !goal.contributions.is_empty() {
        output.push_str("\nContributions:\n");
        for c in &goal.contributions {
            output.push_str(&format!(
                "  {}  {}  {:<12} {:>12}  {}\n",
                c.id,
                c.date,
                names.user(c.user_id),
                money(c.amount),
                c.note
            ));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use crate::services::test_support::{date, household};
    use crate::services::SavingsService;

    #[test]
    fn test_goal_details() {
        let (storage, alex, _sam, _temp) = household();
        let service = SavingsService::new(&storage);
        let goal = service
            .create("Laptop", Money::from_cents(120000), Some(date(2025, 6, 30)), alex.id)
            .unwrap();
        service
            .contribute(goal.id, alex.id, Money::from_cents(30000), Some(date(2025, 1, 5)), "")
            .unwrap();
        let goal = service.get(goal.id).unwrap().unwrap();
        let progress = goal.progress(date(2025, 1, 20));
        let names = Names::load(&storage).unwrap();

        let details = format_goal_details(&goal, &progress, &names, "$");
        assert!(details.contains("$300.00 of $1200.00"));
        assert!(details.contains("Remaining: $900.00"));
        assert!(details.contains("(6 month(s) left)"));
        assert!(details.contains("Needed:    $150.00 per month"));
        assert!(details.contains("Alex"));

        let list = format_goal_list(&[goal], date(2025, 1, 20), "$");
        assert!(list.contains("Laptop"));
        assert!(list.contains("25%"));
    }
}
