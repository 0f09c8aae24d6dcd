//! Savings goal commands

use clap::Subcommand;

use super::{parse_date_opt, resolve_user, today};
use crate::auth::Session;
use crate::display::{format_goal_details, format_goal_list, Names};
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::SavingsGoal;
use crate::services::SavingsService;
use crate::storage::Storage;
use crate::validation::parse_amount;

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a savings goal
    Add {
        name: String,
        /// Target amount
        target: String,
        /// Date to reach the target by (YYYY-MM-DD)
        #[arg(short, long)]
        by: Option<String>,
    },

    /// List goals
    List {
        /// Include archived goals
        #[arg(short, long)]
        all: bool,
    },

    /// Show progress and contributions
    Show { goal: String },

    /// Edit a goal
    Edit {
        goal: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        target: Option<String>,
        #[arg(short, long)]
        by: Option<String>,
        #[arg(long, conflicts_with = "by")]
        clear_by: bool,
    },

    /// Archive a goal, or restore it with --restore
    Archive {
        goal: String,
        #[arg(long)]
        restore: bool,
    },

    /// Delete a goal and its contributions
    Delete { goal: String },

    /// Put money toward a goal
    Contribute {
        goal: String,
        amount: String,
        /// Contributing member; defaults to you
        #[arg(short, long)]
        user: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Remove a contribution
    Uncontribute {
        goal: String,
        /// Contribution ID
        contribution: String,
    },
}

fn resolve_goal(storage: &Storage, identifier: &str) -> HalfsiesResult<SavingsGoal> {
    SavingsService::new(storage)
        .find(identifier)?
        .ok_or_else(|| HalfsiesError::goal_not_found(identifier))
}

pub fn handle_goal_command(storage: &Storage, cmd: GoalCommands) -> HalfsiesResult<()> {
    let service = SavingsService::new(storage);
    let currency = storage.settings().currency_symbol.as_str();

    match cmd {
        GoalCommands::Add { name, target, by } => {
            let me = Session::require_user(storage)?;
            let goal = service.create(
                &name,
                parse_amount(&target)?,
                parse_date_opt(by.as_deref())?,
                me.id,
            )?;
            println!(
                "Created goal: {} ({})",
                goal.name,
                goal.target_amount.format_with_symbol(currency)
            );
            println!("  ID: {}", goal.id);
        }

        GoalCommands::List { all } => {
            print!("{}", format_goal_list(&service.list(all)?, today(), currency));
        }

        GoalCommands::Show { goal } => {
            let goal = resolve_goal(storage, &goal)?;
            let progress = goal.progress(today());
            let names = Names::load(storage)?;
            print!("{}", format_goal_details(&goal, &progress, &names, currency));
        }

        GoalCommands::Edit {
            goal,
            name,
            target,
            by,
            clear_by,
        } => {
            Session::require_user(storage)?;
            let existing = resolve_goal(storage, &goal)?;
            let target_date = if clear_by {
                Some(None)
            } else {
                parse_date_opt(by.as_deref())?.map(Some)
            };
            let updated = service.update(
                existing.id,
                name.as_deref(),
                target.as_deref().map(parse_amount).transpose()?,
                target_date,
            )?;
            println!("Updated goal: {}", updated.name);
        }

        GoalCommands::Archive { goal, restore } => {
            Session::require_user(storage)?;
            let existing = resolve_goal(storage, &goal)?;
            let updated = service.set_archived(existing.id, !restore)?;
            if updated.archived {
                println!("Archived goal: {}", updated.name);
            } else {
                println!("Restored goal: {}", updated.name);
            }
        }

        GoalCommands::Delete { goal } => {
            Session::require_user(storage)?;
            let existing = resolve_goal(storage, &goal)?;
            let deleted = service.delete(existing.id)?;
            println!("Deleted goal: {}", deleted.name);
        }

        GoalCommands::Contribute {
            goal,
            amount,
            user,
            date,
            note,
        } => {
            let me = Session::require_user(storage)?;
            let contributor = match user {
                Some(u) => resolve_user(storage, &u)?,
                None => me,
            };
            let existing = resolve_goal(storage, &goal)?;
            let contribution = service.contribute(
                existing.id,
                contributor.id,
                parse_amount(&amount)?,
                parse_date_opt(date.as_deref())?,
                note.as_deref().unwrap_or(""),
            )?;
            let progress = service.progress(existing.id, today())?;
            println!(
                "{} put {} toward {}",
                contributor.name,
                contribution.amount.format_with_symbol(currency),
                existing.name
            );
            println!(
                "  {} of {} saved",
                progress.saved.format_with_symbol(currency),
                existing.target_amount.format_with_symbol(currency)
            );
        }

        GoalCommands::Uncontribute { goal, contribution } => {
            Session::require_user(storage)?;
            let existing = resolve_goal(storage, &goal)?;
            let removed = service.remove_contribution(existing.id, &contribution)?;
            println!(
                "Removed contribution of {} from {}",
                removed.amount.format_with_symbol(currency),
                existing.name
            );
        }
    }

    Ok(())
}
