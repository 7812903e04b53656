use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Overrides;
use crate::error::{Field, Result};
use crate::models::category::resolve_category;
use crate::models::expense::ExpenseDraft;
use crate::models::summary::Granularity;
use crate::operations::command::Command;
use crate::operations::filter::ExpenseFilter;
use crate::operations::validate::{parse_amount, parse_date, parse_month};

#[derive(Parser, Debug)]
#[command(name = "expense")]
#[command(about = "Personal expense tracker with summaries and charts")]
pub struct Cli {
    /// TOML settings file (also read from `EXPENSE_TRACKER_CONFIG`).
    #[arg(long, global = true, env = "EXPENSE_TRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Expense file, overriding the configured one.
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Log filter level for stderr output (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Without a subcommand the interactive menu starts.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            data_file: self.data_file.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Record a new expense.
    Add(AddArgs),
    /// Change one field of an expense, by its number in `list`.
    Edit(EditArgs),
    /// Delete an expense, by its number in `list`.
    Delete(DeleteArgs),
    /// Show every expense in stored order.
    List,
    Summary(Summary),
    /// Filter expenses by category, date range and amount range.
    Search(SearchArgs),
    /// Draw the spending trend in the terminal.
    Chart(ChartArgs),
    /// Suggest expense fields from a receipt text file.
    Scan(ScanArgs),
    /// Append expenses from a `date,description,amount,category[,timestamp]` CSV.
    Import { path: PathBuf },
    /// Write every expense to a CSV file.
    Export { path: PathBuf },
    /// Interactive menu.
    Shell,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub amount: String,
    /// Menu number 1-8, a predefined name, or any custom label.
    pub category: String,
    /// YYYY-MM-DD, defaults to today.
    #[arg(long)]
    pub date: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EditField {
    Amount,
    Category,
    Date,
    Description,
}

impl From<EditField> for Field {
    fn from(field: EditField) -> Self {
        match field {
            EditField::Amount => Field::Amount,
            EditField::Category => Field::Category,
            EditField::Date => Field::Date,
            EditField::Description => Field::Description,
        }
    }
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub number: usize,
    #[arg(value_enum)]
    pub field: EditField,
    pub value: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub number: usize,
    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct Summary {
    #[command(subcommand)]
    pub command: SummaryCommand,
}

#[derive(Subcommand, Debug)]
pub enum SummaryCommand {
    /// Totals and shares per category.
    Category,
    /// Total, count, average, highest and lowest.
    Overall,
    /// Expenses of one day, defaults to today.
    Daily { date: Option<String> },
    /// Monday to Sunday totals for the week containing the anchor date.
    Weekly {
        #[arg(long)]
        anchor: Option<String>,
    },
    /// Category breakdown of one month (YYYY-MM), defaults to the current month.
    Monthly { month: Option<String> },
    /// Top categories, amount distribution and per-category statistics.
    Stats,
    /// Total, count, average, min and max per period.
    Periods {
        #[arg(value_enum, default_value = "monthly")]
        granularity: PeriodArg,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl From<PeriodArg> for Granularity {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Daily => Granularity::Daily,
            PeriodArg::Weekly => Granularity::Weekly,
            PeriodArg::Monthly => Granularity::Monthly,
            PeriodArg::Quarterly => Granularity::Quarterly,
            PeriodArg::Yearly => Granularity::Yearly,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Repeatable. Matches case-insensitively.
    #[arg(long = "category")]
    pub categories: Vec<String>,
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub to: Option<String>,
    #[arg(long)]
    pub min: Option<String>,
    #[arg(long)]
    pub max: Option<String>,
}

#[derive(Args, Debug)]
pub struct ChartArgs {
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    pub path: PathBuf,
    /// Record the suggested expense after scanning.
    #[arg(long)]
    pub save: bool,
    /// Used when the receipt has no readable amount, or to correct it.
    #[arg(long)]
    pub amount: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
}

impl ScanArgs {
    /// Explicit flags win over what the scanner suggested.
    pub fn merge(&self, mut draft: ExpenseDraft) -> ExpenseDraft {
        if let Some(amount) = &self.amount {
            draft.amount = amount.clone();
        }
        if let Some(category) = &self.category {
            draft.category = resolve_category(category);
        }
        if self.date.is_some() {
            draft.date = self.date.clone();
        }
        if self.description.is_some() {
            draft.description = self.description.clone();
        }
        draft
    }
}

fn optional_date(input: Option<&str>) -> Result<Option<NaiveDate>> {
    input.map(parse_date).transpose()
}

/// Converts parsed arguments into a [`Command`]. `Shell` has no command form.
pub fn to_command(command: &CliCommand, today: NaiveDate) -> Result<Option<Command>> {
    let command = match command {
        CliCommand::Add(args) => Command::Add(ExpenseDraft {
            amount: args.amount.clone(),
            category: resolve_category(&args.category),
            date: args.date.clone(),
            description: args.description.clone(),
        }),
        CliCommand::Edit(args) => {
            let field = Field::from(args.field);
            let value = match field {
                Field::Category => resolve_category(&args.value),
                _ => args.value.clone(),
            };
            Command::Edit {
                number: args.number,
                field,
                value,
            }
        }
        CliCommand::Delete(args) => Command::Delete {
            number: args.number,
        },
        CliCommand::List => Command::ViewAll,
        CliCommand::Summary(summary) => match &summary.command {
            SummaryCommand::Category => Command::CategorySummary,
            SummaryCommand::Overall => Command::OverallSummary,
            SummaryCommand::Daily { date } => Command::DailySummary {
                date: optional_date(date.as_deref())?.unwrap_or(today),
            },
            SummaryCommand::Weekly { anchor } => Command::WeeklySummary {
                anchor: optional_date(anchor.as_deref())?.unwrap_or(today),
            },
            SummaryCommand::Monthly { month } => {
                let (year, month) = match month {
                    Some(raw) => parse_month(raw)?,
                    None => parse_month(&today.format("%Y-%m").to_string())?,
                };
                Command::MonthlySummary { year, month }
            }
            SummaryCommand::Stats => Command::Statistics,
            SummaryCommand::Periods { granularity } => Command::Periods((*granularity).into()),
        },
        CliCommand::Search(args) => Command::Search(ExpenseFilter {
            categories: args.categories.iter().map(|c| resolve_category(c)).collect(),
            from: optional_date(args.from.as_deref())?,
            to: optional_date(args.to.as_deref())?,
            min_amount: args.min.as_deref().map(parse_amount).transpose()?,
            max_amount: args.max.as_deref().map(parse_amount).transpose()?,
        }),
        CliCommand::Chart(args) => Command::Chart {
            from: optional_date(args.from.as_deref())?,
            to: optional_date(args.to.as_deref())?,
        },
        CliCommand::Scan(args) => Command::ScanReceipt {
            path: args.path.clone(),
        },
        CliCommand::Import { path } => Command::Import { path: path.clone() },
        CliCommand::Export { path } => Command::Export { path: path.clone() },
        CliCommand::Shell => return Ok(None),
    };
    Ok(Some(command))
}

/// `to_command` with the local date.
pub fn to_command_today(command: &CliCommand) -> Result<Option<Command>> {
    to_command(command, Local::now().date_naive())
}
