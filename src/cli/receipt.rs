//! Receipt commands

use std::path::PathBuf;

use clap::Subcommand;

use crate::auth::Session;
use crate::display::{format_receipt_list, Names};
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{Expense, Receipt};
use crate::services::{ExpenseService, ReceiptService};
use crate::storage::Storage;

#[derive(Subcommand)]
pub enum ReceiptCommands {
    /// Store a receipt image or PDF
    Upload {
        file: PathBuf,
        /// Attach to this expense
        #[arg(short, long)]
        expense: Option<String>,
    },

    /// List stored receipts
    List {
        /// Only receipts not linked to an expense
        #[arg(short, long)]
        unattached: bool,
    },

    /// Copy a receipt out of the store
    Download {
        receipt: String,
        /// Target file or directory
        #[arg(default_value = ".")]
        dest: PathBuf,
    },

    /// Link a receipt to an expense
    Attach { receipt: String, expense: String },

    /// Unlink a receipt from its expense
    Detach { receipt: String },

    /// Delete a receipt and its file
    Delete { receipt: String },
}

fn resolve_receipt(storage: &Storage, identifier: &str) -> HalfsiesResult<Receipt> {
    ReceiptService::new(storage)
        .find(identifier)?
        .ok_or_else(|| HalfsiesError::receipt_not_found(identifier))
}

fn resolve_expense(storage: &Storage, identifier: &str) -> HalfsiesResult<Expense> {
    ExpenseService::new(storage)
        .find(identifier)?
        .ok_or_else(|| HalfsiesError::expense_not_found(identifier))
}

pub fn handle_receipt_command(storage: &Storage, cmd: ReceiptCommands) -> HalfsiesResult<()> {
    let service = ReceiptService::new(storage);

    match cmd {
        ReceiptCommands::Upload { file, expense } => {
            let me = Session::require_user(storage)?;
            let expense = expense
                .as_deref()
                .map(|e| resolve_expense(storage, e))
                .transpose()?;
            let receipt = service.upload(&file, expense.as_ref().map(|e| e.id), me.id)?;
            println!(
                "Stored receipt: {} ({} bytes)",
                receipt.original_name, receipt.size_bytes
            );
            if let Some(expense) = expense {
                println!("  Attached to: {}", expense.description);
            }
            println!("  ID: {}", receipt.id);
        }

        ReceiptCommands::List { unattached } => {
            let names = Names::load(storage)?;
            print!("{}", format_receipt_list(&service.list(unattached)?, &names));
        }

        ReceiptCommands::Download { receipt, dest } => {
            let receipt = resolve_receipt(storage, &receipt)?;
            let written = service.download(receipt.id, &dest)?;
            println!("Saved {} to {}", receipt.original_name, written.display());
        }

        ReceiptCommands::Attach { receipt, expense } => {
            Session::require_user(storage)?;
            let receipt = resolve_receipt(storage, &receipt)?;
            let expense = resolve_expense(storage, &expense)?;
            service.attach(receipt.id, expense.id)?;
            println!(
                "Attached {} to {}",
                receipt.original_name, expense.description
            );
        }

        ReceiptCommands::Detach { receipt } => {
            Session::require_user(storage)?;
            let receipt = resolve_receipt(storage, &receipt)?;
            if !receipt.is_attached() {
                println!("{} is not attached to an expense.", receipt.original_name);
                return Ok(());
            }
            service.detach(receipt.id)?;
            println!("Detached {}", receipt.original_name);
        }

        ReceiptCommands::Delete { receipt } => {
            Session::require_user(storage)?;
            let receipt = resolve_receipt(storage, &receipt)?;
            let deleted = service.delete(receipt.id)?;
            println!("Deleted receipt: {}", deleted.original_name);
        }
    }

    Ok(())
}
