use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::{Local, NaiveDate};

use crate::display::Presenter;
use crate::error::Field;
use crate::models::category::{PREDEFINED_CATEGORIES, resolve_category};
use crate::models::expense::ExpenseDraft;
use crate::models::summary::Granularity;
use crate::operations::command::{Command, Outcome, Session};
use crate::operations::filter::ExpenseFilter;
use crate::operations::validate::{parse_amount, parse_date, parse_month};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Add,
    Scan,
    List,
    Edit,
    Delete,
    Summary,
    Search,
    Chart,
    Import,
    Export,
    Help,
    Exit,
}

const MENU: &str = "\
=== Expense Tracker ===
  1. Add expense
  2. Scan receipt
  3. View all expenses
  4. Edit expense
  5. Delete expense
  6. Summaries
  7. Search
  8. Chart
  9. Import CSV
 10. Export CSV
 11. Help
  0. Exit";

const SUMMARY_MENU: &str = "\
  1. By category
  2. Overall
  3. Daily
  4. Weekly
  5. Monthly
  6. Per period
  7. Statistics";

/// Accepts the menu number or the command word.
pub fn check_for_command(input: &str) -> Option<MenuChoice> {
    let choice = match input.trim().to_lowercase().as_str() {
        "1" | "add" => MenuChoice::Add,
        "2" | "scan" => MenuChoice::Scan,
        "3" | "list" | "view" => MenuChoice::List,
        "4" | "edit" => MenuChoice::Edit,
        "5" | "delete" | "remove" => MenuChoice::Delete,
        "6" | "summary" => MenuChoice::Summary,
        "7" | "search" => MenuChoice::Search,
        "8" | "chart" => MenuChoice::Chart,
        "9" | "import" => MenuChoice::Import,
        "10" | "export" => MenuChoice::Export,
        "11" | "help" | "?" => MenuChoice::Help,
        "0" | "exit" | "quit" => MenuChoice::Exit,
        _ => return None,
    };
    Some(choice)
}

/// The interactive menu loop. End of input behaves like `exit`.
pub struct Shell<'a, R, W> {
    session: &'a mut Session,
    presenter: &'a Presenter<'a>,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(session: &'a mut Session, presenter: &'a Presenter<'a>, input: R, output: W) -> Self {
        Self {
            session,
            presenter,
            input,
            output,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "{MENU}")?;
        loop {
            let Some(line) = self.ask("\nChoose an option (11 for help): ")? else {
                break;
            };
            if line.is_empty() {
                continue;
            }
            let Some(choice) = check_for_command(&line) else {
                writeln!(self.output, "No valid command found: '{line}'.")?;
                continue;
            };
            tracing::debug!(?choice, "menu choice");

            let keep_going = match choice {
                MenuChoice::Add => self.add(ExpenseDraft::default())?,
                MenuChoice::Scan => self.scan()?,
                MenuChoice::List => self.run_command(Command::ViewAll)?,
                MenuChoice::Edit => self.edit()?,
                MenuChoice::Delete => self.delete()?,
                MenuChoice::Summary => self.summary()?,
                MenuChoice::Search => self.search()?,
                MenuChoice::Chart => self.chart()?,
                MenuChoice::Import => self.transfer(true)?,
                MenuChoice::Export => self.transfer(false)?,
                MenuChoice::Help => {
                    writeln!(self.output, "{MENU}")?;
                    true
                }
                MenuChoice::Exit => false,
            };
            if !keep_going {
                break;
            }
        }
        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    /// Prompts and reads one trimmed line, `None` at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Like `ask`, but a blank answer keeps `default`.
    fn ask_or(&mut self, prompt: &str, default: Option<&str>) -> io::Result<Option<String>> {
        let prompt = match default {
            Some(d) if !d.is_empty() => format!("{prompt} [{d}]: "),
            _ => format!("{prompt}: "),
        };
        Ok(self.ask(&prompt)?.map(|answer| {
            if answer.is_empty() {
                default.unwrap_or_default().to_string()
            } else {
                answer
            }
        }))
    }

    /// Runs a command and prints the result or the error. Returns `true` to keep the loop going.
    fn run_command(&mut self, command: Command) -> io::Result<bool> {
        match self.session.execute(command) {
            Ok(Outcome::ChartShown) => {}
            Ok(outcome) => writeln!(self.output, "{}", self.presenter.outcome(&outcome))?,
            Err(err) => writeln!(self.output, "{}", self.presenter.error(&err))?,
        }
        Ok(true)
    }

    /// A blank answer or an unreadable date both fall back to today.
    fn ask_date_or_today(&mut self, prompt: &str, default: Option<&str>) -> io::Result<Option<NaiveDate>> {
        let today = Local::now().date_naive();
        let Some(raw) = self.ask_or(prompt, default)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(Some(today));
        }
        match parse_date(&raw) {
            Ok(date) => Ok(Some(date)),
            Err(err) => {
                writeln!(self.output, "❌ {err} Using today's date ({today}).")?;
                Ok(Some(today))
            }
        }
    }

    fn add(&mut self, prefill: ExpenseDraft) -> io::Result<bool> {
        let prefilled_amount = Some(prefill.amount.as_str()).filter(|a| !a.is_empty());
        let amount = loop {
            let Some(raw) = self.ask_or("Enter amount", prefilled_amount)? else {
                return Ok(false);
            };
            match parse_amount(&raw) {
                Ok(_) => break raw,
                Err(err) => writeln!(self.output, "{}", self.presenter.error(&err))?,
            }
        };

        writeln!(self.output, "Categories:")?;
        for (i, category) in PREDEFINED_CATEGORIES.iter().enumerate() {
            writeln!(self.output, "  {}. {category}", i + 1)?;
        }
        let prefilled_category = Some(prefill.category.as_str()).filter(|c| !c.is_empty());
        let category = loop {
            let Some(raw) = self.ask_or("Choose a category (1-8) or type a custom one", prefilled_category)? else {
                return Ok(false);
            };
            let category = resolve_category(&raw);
            if category.is_empty() {
                writeln!(self.output, "❌ Category cannot be empty.")?;
                continue;
            }
            break category;
        };

        let Some(date) = self.ask_date_or_today("Enter date (YYYY-MM-DD, blank for today)", prefill.date.as_deref())? else {
            return Ok(false);
        };
        let Some(description) = self.ask_or("Description (optional)", prefill.description.as_deref())? else {
            return Ok(false);
        };

        self.run_command(Command::Add(ExpenseDraft {
            amount,
            category,
            date: Some(date.format("%Y-%m-%d").to_string()),
            description: Some(description),
        }))
    }

    fn scan(&mut self) -> io::Result<bool> {
        let Some(path) = self.ask("Receipt file: ")? else {
            return Ok(false);
        };
        match self.session.execute(Command::ScanReceipt {
            path: PathBuf::from(path),
        }) {
            Ok(Outcome::Suggestion(suggestion)) => {
                writeln!(self.output, "{}", self.presenter.suggestion(&suggestion))?;
                writeln!(self.output, "Press Enter to accept a suggestion or type a new value.")?;
                self.add(suggestion.to_draft())
            }
            Ok(_) => Ok(true),
            Err(err) => {
                writeln!(self.output, "{}", self.presenter.error(&err))?;
                writeln!(self.output, "Enter the expense manually instead.")?;
                self.add(ExpenseDraft::default())
            }
        }
    }

    /// Shows the listing and reads an expense number. `Ok(None)` also covers "nothing to pick".
    fn pick_number(&mut self) -> io::Result<Option<Option<usize>>> {
        if self.session.ledger().is_empty() {
            writeln!(self.output, "❌ No expenses recorded yet.")?;
            return Ok(Some(None));
        }
        let rows = self.session.listing();
        writeln!(self.output, "{}", self.presenter.listing(&rows))?;
        let Some(raw) = self.ask("Expense number: ")? else {
            return Ok(None);
        };
        match raw.parse::<usize>() {
            Ok(number) => Ok(Some(Some(number))),
            Err(_) => {
                writeln!(self.output, "❌ '{raw}' is not an expense number.")?;
                Ok(Some(None))
            }
        }
    }

    fn edit(&mut self) -> io::Result<bool> {
        let Some(picked) = self.pick_number()? else {
            return Ok(false);
        };
        let Some(number) = picked else {
            return Ok(true);
        };
        let Some(raw) = self.ask("Field to edit (1. amount, 2. category, 3. date, 4. description): ")? else {
            return Ok(false);
        };
        let field = match raw.to_lowercase().as_str() {
            "1" | "amount" => Field::Amount,
            "2" | "category" => Field::Category,
            "3" | "date" => Field::Date,
            "4" | "description" => Field::Description,
            _ => {
                writeln!(self.output, "❌ Unknown field '{raw}'.")?;
                return Ok(true);
            }
        };
        let Some(value) = self.ask(&format!("New {}: ", field.name()))? else {
            return Ok(false);
        };
        let value = match field {
            Field::Category => resolve_category(&value),
            _ => value,
        };
        self.run_command(Command::Edit {
            number,
            field,
            value,
        })
    }

    fn delete(&mut self) -> io::Result<bool> {
        let Some(picked) = self.pick_number()? else {
            return Ok(false);
        };
        let Some(number) = picked else {
            return Ok(true);
        };
        let Some(answer) = self.ask(&format!("Delete expense {number}? (y/N): "))? else {
            return Ok(false);
        };
        if !answer.eq_ignore_ascii_case("y") && !answer.eq_ignore_ascii_case("yes") {
            writeln!(self.output, "Deletion cancelled.")?;
            return Ok(true);
        }
        self.run_command(Command::Delete { number })
    }

    fn summary(&mut self) -> io::Result<bool> {
        writeln!(self.output, "{SUMMARY_MENU}")?;
        let Some(choice) = self.ask("Summary type: ")? else {
            return Ok(false);
        };
        let command = match choice.as_str() {
            "1" => Command::CategorySummary,
            "2" => Command::OverallSummary,
            "3" => {
                let Some(date) = self.ask_date_or_today("Date (YYYY-MM-DD, blank for today)", None)? else {
                    return Ok(false);
                };
                Command::DailySummary { date }
            }
            "4" => {
                let Some(anchor) = self.ask_date_or_today("Any date in the week (blank for this week)", None)? else {
                    return Ok(false);
                };
                Command::WeeklySummary { anchor }
            }
            "5" => {
                let current = Local::now().date_naive().format("%Y-%m").to_string();
                let Some(raw) = self.ask_or("Month (YYYY-MM)", Some(current.as_str()))? else {
                    return Ok(false);
                };
                match parse_month(&raw) {
                    Ok((year, month)) => Command::MonthlySummary { year, month },
                    Err(err) => {
                        writeln!(self.output, "{}", self.presenter.error(&err))?;
                        return Ok(true);
                    }
                }
            }
            "6" => {
                let Some(raw) = self.ask_or("Granularity (daily, weekly, monthly, quarterly, yearly)", Some("monthly"))? else {
                    return Ok(false);
                };
                let granularity = match raw.to_lowercase().as_str() {
                    "daily" => Granularity::Daily,
                    "weekly" => Granularity::Weekly,
                    "monthly" => Granularity::Monthly,
                    "quarterly" => Granularity::Quarterly,
                    "yearly" => Granularity::Yearly,
                    _ => {
                        writeln!(self.output, "❌ Unknown granularity '{raw}'.")?;
                        return Ok(true);
                    }
                };
                Command::Periods(granularity)
            }
            "7" => Command::Statistics,
            _ => {
                writeln!(self.output, "❌ Unknown summary '{choice}'.")?;
                return Ok(true);
            }
        };
        self.run_command(command)
    }

    fn search(&mut self) -> io::Result<bool> {
        let Some(categories) = self.ask("Categories (comma separated, blank for all): ")? else {
            return Ok(false);
        };
        let mut answers = Vec::with_capacity(4);
        for prompt in ["From date (YYYY-MM-DD): ", "To date (YYYY-MM-DD): ", "Minimum amount: ", "Maximum amount: "] {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(false);
            };
            answers.push(Some(answer).filter(|a| !a.is_empty()));
        }

        let parsed: crate::error::Result<ExpenseFilter> = (|| {
            Ok(ExpenseFilter {
                categories: categories
                    .split(',')
                    .map(resolve_category)
                    .filter(|c| !c.is_empty())
                    .collect(),
                from: answers[0].as_deref().map(parse_date).transpose()?,
                to: answers[1].as_deref().map(parse_date).transpose()?,
                min_amount: answers[2].as_deref().map(parse_amount).transpose()?,
                max_amount: answers[3].as_deref().map(parse_amount).transpose()?,
            })
        })();
        match parsed {
            Ok(filter) => self.run_command(Command::Search(filter)),
            Err(err) => {
                writeln!(self.output, "{}", self.presenter.error(&err))?;
                Ok(true)
            }
        }
    }

    fn chart(&mut self) -> io::Result<bool> {
        let Some(from) = self.ask("From date (YYYY-MM-DD, blank for first expense): ")? else {
            return Ok(false);
        };
        let Some(to) = self.ask("To date (YYYY-MM-DD, blank for today): ")? else {
            return Ok(false);
        };
        let dates: crate::error::Result<(Option<NaiveDate>, Option<NaiveDate>)> = (|| {
            Ok((
                Some(from.as_str()).filter(|d| !d.is_empty()).map(parse_date).transpose()?,
                Some(to.as_str()).filter(|d| !d.is_empty()).map(parse_date).transpose()?,
            ))
        })();
        match dates {
            Ok((from, to)) => self.run_command(Command::Chart { from, to }),
            Err(err) => {
                writeln!(self.output, "{}", self.presenter.error(&err))?;
                Ok(true)
            }
        }
    }

    fn transfer(&mut self, import: bool) -> io::Result<bool> {
        let prompt = if import {
            "CSV file to import (date,description,amount,category[,timestamp]): "
        } else {
            "CSV file to write: "
        };
        let Some(path) = self.ask(prompt)? else {
            return Ok(false);
        };
        if path.is_empty() {
            return Ok(true);
        }
        let path = PathBuf::from(path);
        self.run_command(if import {
            Command::Import { path }
        } else {
            Command::Export { path }
        })
    }
}
