use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use halfsies::cli::{
    handle_analytics_command, handle_category_command, handle_check_command,
    handle_email_command, handle_expense_command, handle_export_command, handle_goal_command,
    handle_history_command, handle_location_command, handle_month_command,
    handle_receipt_command, handle_recurring_command, handle_settle_command,
    handle_user_command,
};
use halfsies::config::HalfsiesPaths;
use halfsies::services::RecurringService;
use halfsies::storage::{initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "halfsies",
    version,
    about = "Two-person household expense sharing",
    long_about = "Halfsies tracks the expenses two people share, works out who \
                  owes whom each month and records the payments that settle up."
)]
struct Cli {
    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and default categories
    Init,

    /// Show or change settings
    Config {
        /// Currency symbol used in output
        #[arg(long)]
        currency: Option<String>,
        /// Generate due recurring expenses before every command
        #[arg(long)]
        auto_recurring: Option<bool>,
        /// Turn statement email on or off
        #[arg(long)]
        email_enabled: Option<bool>,
        /// Sender address for statement email
        #[arg(long)]
        email_from: Option<String>,
    },

    /// Household members and login
    #[command(subcommand)]
    User(halfsies::cli::UserCommands),

    /// Shared expenses
    #[command(subcommand, alias = "exp")]
    Expense(halfsies::cli::ExpenseCommands),

    #[command(subcommand)]
    Category(halfsies::cli::CategoryCommands),

    #[command(subcommand)]
    Location(halfsies::cli::LocationCommands),

    /// Recurring bills
    #[command(subcommand)]
    Recurring(halfsies::cli::RecurringCommands),

    /// Payments between members
    #[command(subcommand)]
    Settle(halfsies::cli::SettleCommands),

    /// Who paid what in a month and who owes whom
    Month {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
    },

    /// Spending trends across months
    Analytics {
        /// First month (YYYY-MM), defaults to five months before --to
        #[arg(long)]
        from: Option<String>,
        /// Last month (YYYY-MM), defaults to the current month
        #[arg(long)]
        to: Option<String>,
    },

    /// Savings goals
    #[command(subcommand)]
    Goal(halfsies::cli::GoalCommands),

    /// Receipt files
    #[command(subcommand)]
    Receipt(halfsies::cli::ReceiptCommands),

    /// Export data to CSV, JSON or YAML
    #[command(subcommand)]
    Export(halfsies::cli::ExportCommands),

    /// Look for broken references between records
    Check {
        /// Repair what can be repaired
        #[arg(long)]
        fix: bool,
    },

    /// Email statements
    #[command(subcommand)]
    Email(halfsies::cli::EmailCommands),

    /// Recent changes from the change log
    History {
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
        #[arg(short, long, value_enum)]
        entity: Option<halfsies::cli::report::HistoryEntity>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    halfsies::logging::init(cli.verbose);

    let paths = HalfsiesPaths::new()?;
    let mut storage = Storage::open(paths.clone())?;

    let Some(command) = cli.command else {
        println!("Halfsies - shared expenses for two");
        println!();
        println!("Run 'halfsies init' to get started, or 'halfsies --help' for usage.");
        return Ok(());
    };

    match command {
        Commands::Init => {
            let already = storage.is_initialized();
            let seeded = initialize_storage(&storage)?;
            if already {
                println!("Halfsies is already set up at: {}", paths.base_dir().display());
            } else {
                println!("Initialized halfsies at: {}", paths.base_dir().display());
                println!("Created {} default categories.", seeded);
                println!();
                println!("Next: 'halfsies user register <NAME> <EMAIL>' for each member.");
            }
            return Ok(());
        }
        Commands::Config {
            currency,
            auto_recurring,
            email_enabled,
            email_from,
        } => {
            let changing = currency.is_some()
                || auto_recurring.is_some()
                || email_enabled.is_some()
                || email_from.is_some();
            if changing {
                let mut settings = storage.settings().clone();
                if let Some(currency) = currency {
                    settings.currency_symbol = currency;
                }
                if let Some(auto) = auto_recurring {
                    settings.auto_generate_recurring = auto;
                }
                if let Some(enabled) = email_enabled {
                    settings.email.enabled = enabled;
                }
                if let Some(from) = email_from {
                    settings.email.from = from;
                }
                storage.update_settings(settings)?;
                println!("Settings saved.");
                println!();
            }

            let settings = storage.settings();
            println!("Halfsies Configuration");
            println!("======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Receipts:         {}", paths.receipts_dir().display());
            println!("Change log:       {}", paths.audit_log().display());
            println!("Initialized:      {}", storage.is_initialized());
            println!();
            println!("Settings:");
            println!("  Currency symbol:    {}", settings.currency_symbol);
            println!("  Max receipt size:   {} bytes", settings.max_receipt_bytes);
            println!("  Auto recurring:     {}", settings.auto_generate_recurring);
            println!("  Email enabled:      {}", settings.email.enabled);
            if !settings.email.from.is_empty() {
                println!("  Email from:         {}", settings.email.from);
            }
            println!("  Email API key env:  {}", settings.email.api_key_env);
            return Ok(());
        }
        _ => {}
    }

    if !storage.is_initialized() {
        bail!("Halfsies is not initialized. Run 'halfsies init' first.");
    }

    if storage.settings().auto_generate_recurring {
        let today = chrono::Local::now().date_naive();
        match RecurringService::new(&storage).generate_due(today) {
            Ok(generated) if !generated.is_empty() => {
                eprintln!("Added {} recurring expense(s) that came due.", generated.len());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to generate recurring expenses"),
        }
    }

    match command {
        Commands::User(cmd) => handle_user_command(&storage, cmd)?,
        Commands::Expense(cmd) => handle_expense_command(&storage, cmd)?,
        Commands::Category(cmd) => handle_category_command(&storage, cmd)?,
        Commands::Location(cmd) => handle_location_command(&storage, cmd)?,
        Commands::Recurring(cmd) => handle_recurring_command(&storage, cmd)?,
        Commands::Settle(cmd) => handle_settle_command(&storage, cmd)?,
        Commands::Month { month } => handle_month_command(&storage, month)?,
        Commands::Analytics { from, to } => handle_analytics_command(&storage, from, to)?,
        Commands::Goal(cmd) => handle_goal_command(&storage, cmd)?,
        Commands::Receipt(cmd) => handle_receipt_command(&storage, cmd)?,
        Commands::Export(cmd) => handle_export_command(&storage, cmd)?,
        Commands::Check { fix } => handle_check_command(&storage, fix)?,
        Commands::Email(cmd) => handle_email_command(&storage, cmd)?,
        Commands::History { count, entity } => handle_history_command(&storage, count, entity)?,
        Commands::Init | Commands::Config { .. } => {}
    }

    Ok(())
}
