mod cli;
mod config;
mod db;
mod display;
mod error;
mod models;
mod operations;
mod shell;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

use crate::cli::{Cli, CliCommand, to_command_today};
use crate::config::{ChartsBackend, ScannerBackend, Settings};
use crate::db::ledger::Ledger;
use crate::db::repository::JsonFileRepository;
use crate::display::Presenter;
use crate::error::{LedgerError, Result};
use crate::operations::command::{Command, Outcome, Session};
use crate::operations::receipt::{NoScanner, ReceiptScanner, TextReceiptScanner};
use crate::operations::report::{ChartRenderer, NoCharts, TerminalCharts};
use crate::shell::Shell;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match config::load(&cli.overrides()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("❌ {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "{crate_name}={level}",
            crate_name = env!("CARGO_CRATE_NAME"),
            level = settings.log_level
        ))
        .with_writer(io::stderr)
        .init();

    let presenter = Presenter::new(&settings.currency);
    match run(&cli, &settings, &presenter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", presenter.error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, settings: &Settings, presenter: &Presenter) -> Result<()> {
    let (ledger, warning) = Ledger::open(JsonFileRepository::new(&settings.data_file));
    if let Some(warning) = warning {
        eprintln!("{}", presenter.error(&warning));
        eprintln!("Starting with an empty expense list.");
    }
    tracing::info!(
        path = %ledger.repository().path().display(),
        count = ledger.len(),
        "ledger opened"
    );
    let mut session = Session::new(ledger, charts_for(settings), scanner_for(settings));

    let command = match &cli.command {
        None | Some(CliCommand::Shell) => {
            let stdin = io::stdin();
            return Shell::new(&mut session, presenter, stdin.lock(), io::stdout())
                .run()
                .map_err(|e| LedgerError::Terminal(e.to_string()));
        }
        Some(command) => command,
    };

    if let CliCommand::Delete(args) = command {
        if !args.yes && !confirm(&format!("Delete expense {}? (y/N): ", args.number))? {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let Some(parsed) = to_command_today(command)? else {
        return Ok(());
    };
    let outcome = session.execute(parsed)?;
    if !matches!(outcome, Outcome::ChartShown) {
        println!("{}", presenter.outcome(&outcome));
    }

    if let (CliCommand::Scan(args), Outcome::Suggestion(suggestion)) = (command, &outcome) {
        if args.save {
            let added = session.execute(Command::Add(args.merge(suggestion.to_draft())))?;
            println!("{}", presenter.outcome(&added));
        }
    }
    Ok(())
}

fn charts_for(settings: &Settings) -> Box<dyn ChartRenderer> {
    match settings.charts {
        ChartsBackend::Terminal => Box::new(TerminalCharts),
        ChartsBackend::None => Box::new(NoCharts),
    }
}

fn scanner_for(settings: &Settings) -> Box<dyn ReceiptScanner> {
    match settings.scanner {
        ScannerBackend::Text => match TextReceiptScanner::new() {
            Ok(scanner) => Box::new(scanner),
            Err(err) => {
                tracing::warn!(%err, "receipt scanner unavailable");
                Box::new(NoScanner)
            }
        },
        ScannerBackend::None => Box::new(NoScanner),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout()
        .flush()
        .map_err(|e| LedgerError::Terminal(e.to_string()))?;
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .map_err(|e| LedgerError::Terminal(e.to_string()))?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
