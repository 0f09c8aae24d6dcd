//! Recurring expense commands

use clap::Subcommand;

use super::{parse_date_opt, parse_split, resolve_category, resolve_location, resolve_user, today};
use crate::auth::Session;
use crate::display::{format_recurring_list, Names};
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{Frequency, RecurringExpense};
use crate::services::{CreateRecurringInput, RecurringService, UpdateRecurringInput};
use crate::storage::Storage;
use crate::validation::parse_amount;

#[derive(Subcommand)]
pub enum RecurringCommands {
    /// Create a recurring bill
    Add {
        description: String,
        amount: String,
        #[arg(short, long)]
        category: String,
        /// weekly, monthly or yearly
        #[arg(short, long, default_value = "monthly")]
        frequency: String,
        /// First occurrence (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<String>,
        /// Last allowed occurrence date
        #[arg(long)]
        end: Option<String>,
        #[arg(short, long)]
        paid_by: Option<String>,
        #[arg(short, long, default_value = "50/50")]
        split: String,
        #[arg(short, long)]
        location: Option<String>,
    },

    /// List recurring bills
    List {
        /// Include paused and finished bills
        #[arg(short, long)]
        all: bool,
    },

    /// Edit a recurring bill
    Edit {
        /// Recurring bill ID or description
        recurring: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(long, conflicts_with = "location")]
        clear_location: bool,
        #[arg(short, long)]
        paid_by: Option<String>,
        #[arg(short, long)]
        split: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long, conflicts_with = "end")]
        clear_end: bool,
    },

    /// Stop generating expenses until resumed
    Pause { recurring: String },

    /// Resume a paused bill from its next future occurrence
    Resume { recurring: String },

    /// Delete a recurring bill; generated expenses are kept
    Delete { recurring: String },

    /// Generate every expense that is due
    Run,
}

fn resolve_recurring(storage: &Storage, identifier: &str) -> HalfsiesResult<RecurringExpense> {
    RecurringService::new(storage)
        .find(identifier)?
        .ok_or_else(|| HalfsiesError::recurring_not_found(identifier))
}

fn parse_frequency(input: &str) -> HalfsiesResult<Frequency> {
    input.parse().map_err(HalfsiesError::Validation)
}

pub fn handle_recurring_command(storage: &Storage, cmd: RecurringCommands) -> HalfsiesResult<()> {
    let service = RecurringService::new(storage);
    let currency = storage.settings().currency_symbol.as_str();

    match cmd {
        RecurringCommands::Add {
            description,
            amount,
            category,
            frequency,
            start,
            end,
            paid_by,
            split,
            location,
        } => {
            let me = Session::require_user(storage)?;
            let payer = match paid_by {
                Some(p) => resolve_user(storage, &p)?,
                None => me.clone(),
            };
            let mut input = CreateRecurringInput::new(
                description,
                parse_amount(&amount)?,
                resolve_category(storage, &category)?.id,
                payer.id,
                parse_frequency(&frequency)?,
                parse_date_opt(start.as_deref())?.unwrap_or_else(today),
            );
            input.end_date = parse_date_opt(end.as_deref())?;
            input.split_type = parse_split(&split)?;
            input.location_id = location
                .as_deref()
                .map(|l| resolve_location(storage, l).map(|l| l.id))
                .transpose()?;

            let template = service.create(input, me.id)?;
            println!(
                "Created recurring bill: {} {} {}",
                template.description,
                template.amount.format_with_symbol(currency),
                template.frequency
            );
            println!("  Next due: {}", template.next_due);
            println!("  ID: {}", template.id);
        }

        RecurringCommands::List { all } => {
            let names = Names::load(storage)?;
            print!("{}", format_recurring_list(&service.list(all)?, &names, currency));
        }

        RecurringCommands::Edit {
            recurring,
            description,
            amount,
            category,
            location,
            clear_location,
            paid_by,
            split,
            end,
            clear_end,
        } => {
            Session::require_user(storage)?;
            let template = resolve_recurring(storage, &recurring)?;
            let input = UpdateRecurringInput {
                description,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                category_id: category
                    .as_deref()
                    .map(|c| resolve_category(storage, c).map(|c| c.id))
                    .transpose()?,
                location_id: if clear_location {
                    Some(None)
                } else {
                    location
                        .as_deref()
                        .map(|l| resolve_location(storage, l).map(|l| Some(l.id)))
                        .transpose()?
                },
                paid_by: paid_by
                    .as_deref()
                    .map(|u| resolve_user(storage, u).map(|u| u.id))
                    .transpose()?,
                split_type: split.as_deref().map(parse_split).transpose()?,
                end_date: if clear_end {
                    Some(None)
                } else {
                    parse_date_opt(end.as_deref())?.map(Some)
                },
            };
            let updated = service.update(template.id, input)?;
            println!("Updated recurring bill: {}", updated.description);
        }

        RecurringCommands::Pause { recurring } => {
            Session::require_user(storage)?;
            let template = resolve_recurring(storage, &recurring)?;
            service.pause(template.id)?;
            println!("Paused: {}", template.description);
        }

        RecurringCommands::Resume { recurring } => {
            Session::require_user(storage)?;
            let template = resolve_recurring(storage, &recurring)?;
            let resumed = service.resume(template.id, today())?;
            println!("Resumed: {} (next due {})", resumed.description, resumed.next_due);
        }

        RecurringCommands::Delete { recurring } => {
            Session::require_user(storage)?;
            let template = resolve_recurring(storage, &recurring)?;
            let unlinked = service.delete(template.id)?;
            println!("Deleted recurring bill: {}", template.description);
            if unlinked > 0 {
                println!("  {} generated expense(s) kept", unlinked);
            }
        }

        RecurringCommands::Run => {
            let generated = service.generate_due(today())?;
            if generated.is_empty() {
                println!("Nothing due.");
            } else {
                for expense in &generated {
                    println!(
                        "  {} {} {}",
                        expense.date,
                        expense.description,
                        expense.amount.format_with_symbol(currency)
                    );
                }
                println!("Generated {} expense(s).", generated.len());
            }
        }
    }

    Ok(())
}
