//! CLI commands for data export

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Subcommand, ValueEnum};

use crate::error::{HalfsiesError, HalfsiesResult};
use crate::export::{
    export_expenses_csv, export_full_json, export_full_yaml, export_settlements_csv, FullExport,
};
use crate::storage::Storage;
use crate::validation::assert_valid_month;

/// Full export format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Json,
    Yaml,
}

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export every record to one file
    All {
        output: PathBuf,
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Export expenses to CSV
    Expenses {
        output: PathBuf,
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Export settlement payments to CSV
    Settlements { output: PathBuf },

    /// Show what an export would contain
    Info,
}

fn create_output(output: &Path) -> HalfsiesResult<BufWriter<File>> {
    let file = File::create(output).map_err(|e| {
        HalfsiesError::Export(format!(
            "Failed to create file {}: {}",
            output.display(),
            e
        ))
    })?;
    Ok(BufWriter::new(file))
}

pub fn handle_export_command(storage: &Storage, cmd: ExportCommands) -> HalfsiesResult<()> {
    match cmd {
        ExportCommands::All {
            output,
            format,
            pretty,
        } => {
            let mut writer = create_output(&output)?;
            match format {
                ExportFormat::Json => export_full_json(storage, &mut writer, pretty)?,
                ExportFormat::Yaml => export_full_yaml(storage, &mut writer)?,
            }
            println!("Full database exported to: {}", output.display());
        }

        ExportCommands::Expenses { output, month } => {
            let month = month.as_deref().map(assert_valid_month).transpose()?;
            let count = export_expenses_csv(storage, create_output(&output)?, month)?;
            println!("Exported {} expense(s) to: {}", count, output.display());
        }

        ExportCommands::Settlements { output } => {
            let count = export_settlements_csv(storage, create_output(&output)?)?;
            println!("Exported {} settlement(s) to: {}", count, output.display());
        }

        ExportCommands::Info => {
            let export = FullExport::from_storage(storage)?;
            let meta = &export.metadata;

            println!("Export Information");
            println!("==================\n");
            println!("Schema Version: {}", export.schema_version);
            println!("App Version:    {}", export.app_version);
            println!();
            println!("Data Summary:");
            println!("  Members:      {}", meta.user_count);
            println!("  Categories:   {}", meta.category_count);
            println!("  Locations:    {}", meta.location_count);
            println!("  Expenses:     {}", meta.expense_count);
            println!("  Recurring:    {}", meta.recurring_count);
            println!("  Settlements:  {}", meta.settlement_count);
            println!("  Goals:        {}", meta.goal_count);
            println!("  Receipts:     {}", meta.receipt_count);

            if let (Some(earliest), Some(latest)) = (&meta.earliest_expense, &meta.latest_expense) {
                println!();
                println!("Expenses from {} to {}", earliest, latest);
            }
        }
    }

    Ok(())
}
