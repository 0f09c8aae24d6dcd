//! Settlement payment commands

use clap::Subcommand;

use super::{month_or_current, parse_date_opt, resolve_user};
use crate::auth::Session;
use crate::display::{format_settlement_list, Names};
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::services::{RecordSettlementInput, SettlementService, UserService};
use crate::storage::Storage;
use crate::validation::{assert_valid_month, parse_amount};

#[derive(Subcommand)]
pub enum SettleCommands {
    /// Record a payment between members
    Record {
        amount: String,
        /// Month being settled (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
        /// Payer; defaults to you
        #[arg(long)]
        from: Option<String>,
        /// Recipient; defaults to the other member
        #[arg(long)]
        to: Option<String>,
        /// Payment date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
    },

    /// List recorded payments
    List {
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Delete a recorded payment
    Delete {
        /// Settlement ID
        settlement: String,
    },
}

pub fn handle_settle_command(storage: &Storage, cmd: SettleCommands) -> HalfsiesResult<()> {
    let service = SettlementService::new(storage);
    let currency = storage.settings().currency_symbol.as_str();

    match cmd {
        SettleCommands::Record {
            amount,
            month,
            from,
            to,
            date,
            note,
        } => {
            let me = Session::require_user(storage)?;
            let from = match from {
                Some(f) => resolve_user(storage, &f)?,
                None => me.clone(),
            };
            let to = match to {
                Some(t) => resolve_user(storage, &t)?,
                None => UserService::new(storage).partner_of(from.id)?.ok_or_else(|| {
                    HalfsiesError::Validation(
                        "No other member to pay; register your partner first".into(),
                    )
                })?,
            };

            let settlement = service.record(
                RecordSettlementInput {
                    from_user: from.id,
                    to_user: to.id,
                    amount: parse_amount(&amount)?,
                    month: month_or_current(month.as_deref())?,
                    date: parse_date_opt(date.as_deref())?,
                    note: note.unwrap_or_default(),
                },
                me.id,
            )?;
            println!(
                "Recorded: {} paid {} {} for {}",
                from.name,
                to.name,
                settlement.amount.format_with_symbol(currency),
                settlement.month
            );

            if let Ok(data) = service.month_data(settlement.month) {
                println!("  {}", data.describe_balance(currency));
            }
        }

        SettleCommands::List { month } => {
            let month = month.as_deref().map(assert_valid_month).transpose()?;
            let names = Names::load(storage)?;
            print!(
                "{}",
                format_settlement_list(&service.list(month)?, &names, currency)
            );
        }

        SettleCommands::Delete { settlement } => {
            Session::require_user(storage)?;
            let existing = service
                .find(&settlement)?
                .ok_or_else(|| HalfsiesError::settlement_not_found(&settlement))?;
            let deleted = service.delete(existing.id)?;
            println!(
                "Deleted settlement of {} for {}",
                deleted.amount.format_with_symbol(currency),
                deleted.month
            );
        }
    }

    Ok(())
}
