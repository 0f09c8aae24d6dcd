//! Expense commands

use clap::Subcommand;

use super::{
    month_or_current, parse_date_opt, parse_split, resolve_category, resolve_location,
    resolve_user, today,
};
use crate::auth::Session;
use crate::display::{format_expense_details, format_expense_list, Names};
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::Expense;
use crate::services::{CreateExpenseInput, ExpenseFilter, ExpenseService, UpdateExpenseInput};
use crate::storage::Storage;
use crate::validation::parse_amount;

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record a shared expense
    Add {
        description: String,
        /// Amount, e.g. 42.50
        amount: String,
        /// Category name or ID
        #[arg(short, long)]
        category: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Who paid; defaults to you
        #[arg(short, long)]
        paid_by: Option<String>,
        /// 50/50, custom or 100%
        #[arg(short, long, default_value = "50/50")]
        split: String,
        /// Location name or ID
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List expenses
    List {
        /// Month (YYYY-MM), defaults to the current month
        #[arg(short, long, conflicts_with = "all")]
        month: Option<String>,
        /// Every month
        #[arg(long)]
        all: bool,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long)]
        paid_by: Option<String>,
        #[arg(long)]
        split: Option<String>,
        /// Text to look for in descriptions and notes
        #[arg(short = 'q', long)]
        search: Option<String>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show one expense
    Show {
        /// Expense ID
        expense: String,
    },

    /// Edit an expense
    Edit {
        /// Expense ID
        expense: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
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
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete an expense and its receipt
    Delete {
        /// Expense ID
        expense: String,
    },
}

fn resolve_expense(storage: &Storage, identifier: &str) -> HalfsiesResult<Expense> {
    ExpenseService::new(storage)
        .find(identifier)?
        .ok_or_else(|| HalfsiesError::expense_not_found(identifier))
}

pub fn handle_expense_command(storage: &Storage, cmd: ExpenseCommands) -> HalfsiesResult<()> {
    let service = ExpenseService::new(storage);
    let currency = storage.settings().currency_symbol.as_str();

    match cmd {
        ExpenseCommands::Add {
            description,
            amount,
            category,
            date,
            paid_by,
            split,
            location,
            notes,
        } => {
            let me = Session::require_user(storage)?;
            let payer = match paid_by {
                Some(p) => resolve_user(storage, &p)?,
                None => me.clone(),
            };
            let mut input = CreateExpenseInput::new(
                description,
                parse_amount(&amount)?,
                parse_date_opt(date.as_deref())?.unwrap_or_else(today),
                resolve_category(storage, &category)?.id,
                payer.id,
            );
            input.split_type = parse_split(&split)?;
            input.location_id = location
                .as_deref()
                .map(|l| resolve_location(storage, l).map(|l| l.id))
                .transpose()?;
            input.notes = notes.unwrap_or_default();

            let expense = service.create(input, me.id)?;
            println!(
                "Added expense: {} {} on {}",
                expense.description,
                expense.amount.format_with_symbol(currency),
                expense.date
            );
            println!("  Paid by {} ({})", payer.name, expense.split_type);
            println!("  ID: {}", expense.id);
        }

        ExpenseCommands::List {
            month,
            all,
            category,
            location,
            paid_by,
            split,
            search,
            limit,
        } => {
            let filter = ExpenseFilter {
                month: if all {
                    None
                } else {
                    Some(month_or_current(month.as_deref())?)
                },
                category_id: category
                    .as_deref()
                    .map(|c| resolve_category(storage, c).map(|c| c.id))
                    .transpose()?,
                location_id: location
                    .as_deref()
                    .map(|l| resolve_location(storage, l).map(|l| l.id))
                    .transpose()?,
                paid_by: paid_by
                    .as_deref()
                    .map(|u| resolve_user(storage, u).map(|u| u.id))
                    .transpose()?,
                split_type: split.as_deref().map(parse_split).transpose()?,
                search,
                limit,
            };
            let expenses = service.list(&filter)?;
            let names = Names::load(storage)?;
            print!("{}", format_expense_list(&expenses, &names, currency));
        }

        ExpenseCommands::Show { expense } => {
            let expense = resolve_expense(storage, &expense)?;
            let names = Names::load(storage)?;
            print!("{}", format_expense_details(&expense, &names, currency));
        }

        ExpenseCommands::Edit {
            expense,
            description,
            amount,
            date,
            category,
            location,
            clear_location,
            paid_by,
            split,
            notes,
        } => {
            Session::require_user(storage)?;
            let existing = resolve_expense(storage, &expense)?;
            let input = UpdateExpenseInput {
                description,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                date: parse_date_opt(date.as_deref())?,
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
                notes,
            };
            let updated = service.update(existing.id, input)?;
            println!("Updated expense: {}", updated.description);
        }

        ExpenseCommands::Delete { expense } => {
            Session::require_user(storage)?;
            let existing = resolve_expense(storage, &expense)?;
            let deleted = service.delete(existing.id)?;
            println!(
                "Deleted expense: {} {}",
                deleted.description,
                deleted.amount.format_with_symbol(currency)
            );
        }
    }

    Ok(())
}
