//! Month statements, analytics, integrity checks, change history and email

use clap::{Subcommand, ValueEnum};

use super::month_or_current;
use crate::audit::EntityType;
use crate::auth::Session;
use crate::display::{format_analytics, format_integrity_report, format_month_data, Names};
use crate::email::HttpMailer;
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::Month;
use crate::services::{
    render_statement, AnalyticsService, IntegrityService, NotificationService, SettlementService,
};
use crate::storage::Storage;
use crate::validation::assert_valid_month;

/// Record kinds accepted by `history --entity`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HistoryEntity {
    User,
    Expense,
    Category,
    Location,
    Recurring,
    Settlement,
    Goal,
    Receipt,
}

impl From<HistoryEntity> for EntityType {
    fn from(kind: HistoryEntity) -> Self {
        match kind {
            HistoryEntity::User => EntityType::User,
            HistoryEntity::Expense => EntityType::Expense,
            HistoryEntity::Category => EntityType::Category,
            HistoryEntity::Location => EntityType::Location,
            HistoryEntity::Recurring => EntityType::Recurring,
            HistoryEntity::Settlement => EntityType::Settlement,
            HistoryEntity::Goal => EntityType::SavingsGoal,
            HistoryEntity::Receipt => EntityType::Receipt,
        }
    }
}

#[derive(Subcommand)]
pub enum EmailCommands {
    /// Email a month's statement to both members
    Month {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
        /// Print the message instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
}

/// Show who paid what in a month and who owes whom
pub fn handle_month_command(storage: &Storage, month: Option<String>) -> HalfsiesResult<()> {
    let month = month_or_current(month.as_deref())?;
    let data = SettlementService::new(storage).month_data(month)?;
    print!(
        "{}",
        format_month_data(&data, &storage.settings().currency_symbol)
    );
    Ok(())
}

/// Spending trends between two months, inclusive
///
/// Defaults to the six months ending with the current one.
pub fn handle_analytics_command(
    storage: &Storage,
    from: Option<String>,
    to: Option<String>,
) -> HalfsiesResult<()> {
    let to = month_or_current(to.as_deref())?;
    let from = match from {
        Some(from) => assert_valid_month(&from)?,
        None => (0..5).fold(to, |m, _| m.prev()),
    };
    if from > to {
        return Err(HalfsiesError::Validation(format!(
            "Start month {} is after end month {}",
            from, to
        )));
    }

    let analytics = AnalyticsService::new(storage).analytics(from, to)?;
    let names = Names::load(storage)?;
    print!(
        "{}",
        format_analytics(&analytics, &names, &storage.settings().currency_symbol)
    );
    Ok(())
}

/// Scan for broken references and optionally repair them
pub fn handle_check_command(storage: &Storage, fix: bool) -> HalfsiesResult<()> {
    if fix {
        Session::require_user(storage)?;
    }
    let service = IntegrityService::new(storage);
    let report = service.scan()?;
    print!("{}", format_integrity_report(&report));

    if fix && !report.is_clean() {
        let summary = service.repair(&report)?;
        println!();
        println!("Repaired {} issue(s).", summary.repaired);
        if summary.skipped > 0 {
            println!(
                "{} issue(s) reference missing members and need manual attention.",
                summary.skipped
            );
        }
    }

    Ok(())
}

/// Print recent entries of the change log
pub fn handle_history_command(
    storage: &Storage,
    count: usize,
    entity: Option<HistoryEntity>,
) -> HalfsiesResult<()> {
    let entries = storage
        .audit()
        .read_recent(count, entity.map(EntityType::from))?;

    if entries.is_empty() {
        println!("No changes recorded.");
        return Ok(());
    }
    for entry in entries.iter().rev() {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}

pub fn handle_email_command(storage: &Storage, cmd: EmailCommands) -> HalfsiesResult<()> {
    match cmd {
        EmailCommands::Month { month, dry_run } => {
            let month: Month = month_or_current(month.as_deref())?;

            if dry_run {
                let data = SettlementService::new(storage).month_data(month)?;
                print!(
                    "{}",
                    render_statement(&data, &storage.settings().currency_symbol)
                );
                return Ok(());
            }

            Session::require_user(storage)?;
            let mailer = HttpMailer::from_settings(&storage.settings().email)?;
            let sent = NotificationService::new(storage, mailer).send_month_statement(month)?;
            println!(
                "Sent '{}' to {}",
                sent.subject,
                sent.to.join(", ")
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_entity_maps_goal() {
        assert_eq!(EntityType::from(HistoryEntity::Goal), EntityType::SavingsGoal);
        assert_eq!(EntityType::from(HistoryEntity::Expense), EntityType::Expense);
    }
}
