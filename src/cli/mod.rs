pub mod add;
pub mod cards;
pub mod dashboard;
pub mod init;
pub mod list;
pub mod pay;
pub mod report;
pub mod status;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::error::{FinanzasError, Result};
use crate::ledger::Ledger;
use crate::models::Kind;
use crate::reports::Filter;
use crate::settings::{load_settings, Settings};
use crate::source::Source;

pub(crate) fn parse_month_opt(month: &Option<String>) -> (Option<i32>, Option<u32>) {
    if let Some(m) = month {
        let parts: Vec<&str> = m.split('-').collect();
        if parts.len() == 2 {
            let year = parts[0].parse().ok();
            let month = parts[1].parse().ok();
            return (year, month);
        }
    }
    (None, None)
}

/// Settings plus the resolved ledger source, shared by every command.
pub struct Context {
    pub settings: Settings,
    pub source: Source,
}

impl Context {
    pub fn new(file: Option<&str>, url: Option<&str>) -> Self {
        let settings = load_settings();
        let source = Source::resolve(file, url, &settings);
        log::debug!("ledger source: {source}");
        Self { settings, source }
    }

    /// Load the ledger, telling the user about rows that could not be read.
    pub fn load(&self) -> Result<Ledger> {
        let ledger = self.source.load()?;
        if ledger.skipped() > 0 {
            eprintln!(
                "{}",
                format!(
                    "Skipped {} unreadable row(s) in {}",
                    ledger.skipped(),
                    self.source
                )
                .yellow()
            );
        }
        Ok(ledger)
    }
}

#[derive(Parser)]
#[command(
    name = "finanzas",
    version,
    about = "Personal finance ledger over a spreadsheet of income and expense movements."
)]
pub struct Cli {
    /// Ledger file (CSV or XLSX). Overrides settings.
    #[arg(long, global = true)]
    pub file: Option<String>,
    /// Published CSV URL (e.g. a Google Sheets link). Read-only.
    #[arg(long, global = true)]
    pub url: Option<String>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[value(alias = "income")]
    Ingreso,
    #[value(alias = "expense", alias = "egreso")]
    Gasto,
}

impl From<KindArg> for Kind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Ingreso => Kind::Income,
            KindArg::Gasto => Kind::Expense,
        }
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct PeriodArgs {
    /// Month filter: YYYY-MM
    #[arg(long)]
    pub month: Option<String>,
    /// Year filter: YYYY
    #[arg(long)]
    pub year: Option<i32>,
    /// Start date: YYYY-MM-DD or DD/MM/YYYY
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// End date: YYYY-MM-DD or DD/MM/YYYY
    #[arg(long = "to")]
    pub to_date: Option<String>,
}

impl PeriodArgs {
    pub fn to_filter(&self) -> Result<Filter> {
        let (my, mm) = parse_month_opt(&self.month);
        if let Some(raw) = &self.month {
            if my.is_none() || !mm.is_some_and(|m| (1..=12).contains(&m)) {
                return Err(FinanzasError::Other(format!(
                    "invalid --month '{raw}' (expected YYYY-MM)"
                )));
            }
        }
        if let (Some(year), Some(month_year)) = (self.year, my) {
            if year != month_year {
                return Err(FinanzasError::Other(format!(
                    "--year {year} conflicts with --month {}",
                    self.month.as_deref().unwrap_or_default()
                )));
            }
        }
        Filter::new(
            self.year.or(my),
            mm,
            self.from_date.as_deref(),
            self.to_date.as_deref(),
        )
    }
}

#[derive(Args, Clone, Debug)]
pub struct AddArgs {
    /// Movement type
    #[arg(long = "type", value_enum, default_value = "gasto")]
    pub kind: KindArg,
    /// Amount (non-negative); "1.500,50" and "1,500.50" are both accepted
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,
    /// Date: YYYY-MM-DD or DD/MM/YYYY (default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Category (default: first configured category for the type)
    #[arg(long)]
    pub category: Option<String>,
    /// Payment method (default: first configured method for the type)
    #[arg(long)]
    pub method: Option<String>,
    /// Record the expense as not yet paid
    #[arg(long)]
    pub pending: bool,
    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write settings and create an empty ledger.
    Init {
        /// Path of the ledger CSV (default: ~/Documents/finanzas/movimientos.csv)
        #[arg(long = "data-file")]
        data_file: Option<String>,
        /// Published CSV URL to read from instead of the local file
        #[arg(long = "source-url")]
        source_url: Option<String>,
        /// Your name, used in the dashboard greeting
        #[arg(long)]
        name: Option<String>,
    },
    /// Record a new income or expense movement.
    Add(AddArgs),
    /// Show the movement history.
    List {
        #[command(flatten)]
        period: PeriodArgs,
        /// Only this type
        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,
        /// Only pending expenses
        #[arg(long)]
        pending: bool,
    },
    /// Income, expense, pending and balance totals.
    Summary {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Totals per category.
    Categories {
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long = "type", value_enum, default_value = "gasto")]
        kind: KindArg,
    },
    /// Totals per payment method.
    Methods {
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long = "type", value_enum, default_value = "gasto")]
        kind: KindArg,
    },
    /// Monthly income, expense and running balance.
    Monthly {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Pending payments.
    Pending,
    /// Projected credit card debt per card.
    Cards,
    /// Mark pending expenses as paid.
    Pay {
        /// Row number shown by `finanzas list`
        #[arg(long, conflicts_with = "method", required_unless_present = "method")]
        row: Option<usize>,
        /// Settle every pending expense paid with this method
        #[arg(long)]
        method: Option<String>,
    },
    /// Show settings, source and ledger statistics.
    Status,
    /// Full-screen dashboard (default when no command is given).
    Dashboard,
    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
