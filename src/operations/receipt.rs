use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::expense::ExpenseDraft;

/// Values read off a receipt. Every field is only a suggestion for manual entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptSuggestion {
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl ReceiptSuggestion {
    /// Pre-fills a draft. Anything the scanner did not find stays blank.
    pub fn to_draft(&self) -> ExpenseDraft {
        ExpenseDraft {
            amount: self.amount.map(|a| a.to_string()).unwrap_or_default(),
            category: self.category.clone().unwrap_or_default(),
            date: self.date.map(|d| d.format("%Y-%m-%d").to_string()),
            description: self.description.clone(),
        }
    }
}

pub trait ReceiptScanner {
    fn scan(&self, path: &Path) -> Result<ReceiptSuggestion>;
}

/// Used when receipt scanning is switched off.
#[derive(Debug, Default)]
pub struct NoScanner;

impl ReceiptScanner for NoScanner {
    fn scan(&self, _path: &Path) -> Result<ReceiptSuggestion> {
        Err(LedgerError::Capability(
            "Receipt scanning is disabled. Enter the expense manually.".to_string(),
        ))
    }
}

/// A keyword (case-insensitive regex) that maps receipt text to a category.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub pattern: Regex,
    pub category: String,
}

/// Reads receipt text that has already been through OCR and picks out the
/// total, the purchase date, the merchant line and a likely category.
#[derive(Debug)]
pub struct TextReceiptScanner {
    rules: Vec<CategoryRule>,
    total_line: Regex,
    money: Regex,
    iso_date: Regex,
    dmy_date: Regex,
}

impl TextReceiptScanner {
    pub fn new() -> Result<Self> {
        let rules = [
            (r"restaurant|cafe|coffee|pizza|grocer|supermarket|bakery|food", "Food"),
            (r"uber|taxi|metro|bus|train|fuel|petrol|parking", "Transport"),
            (r"cinema|movie|netflix|concert|theatre|game", "Entertainment"),
            (r"pharmacy|clinic|hospital|medic|dental", "Health"),
            (r"electric|water bill|internet|mobile recharge|gas bill|rent", "Bills"),
            (r"book|course|tuition|school|stationery", "Education"),
            (r"mall|store|fashion|apparel|electronics|mart", "Shopping"),
        ]
        .into_iter()
        .map(|(pattern, category)| {
            Ok(CategoryRule {
                pattern: compile(&format!(r"(?i)\b(?:{pattern})"))?,
                category: category.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            total_line: compile(r"(?i)\b(?:grand\s+total|total|amount\s+due|net\s+amount)\b")?,
            money: compile(r"(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d{1,2}))?")?,
            iso_date: compile(r"\b(\d{4})-(\d{2})-(\d{2})\b")?,
            dmy_date: compile(r"\b(\d{1,2})[./](\d{1,2})[./](\d{4})\b")?,
        })
    }

    /// The parsing half of [`ReceiptScanner::scan`], on text already in memory.
    pub fn suggest(&self, text: &str) -> ReceiptSuggestion {
        ReceiptSuggestion {
            amount: self.find_amount(text),
            date: self.find_date(text),
            description: text
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string),
            category: self
                .rules
                .iter()
                .find(|rule| rule.pattern.is_match(text))
                .map(|rule| rule.category.clone()),
        }
    }

    fn amounts_in(&self, line: &str) -> Vec<Decimal> {
        self.money
            .captures_iter(line)
            .filter_map(|caps| {
                let whole = caps.get(1)?.as_str().replace(',', "");
                let raw = match caps.get(2) {
                    Some(cents) => format!("{whole}.{}", cents.as_str()),
                    None => whole,
                };
                Decimal::from_str(&raw).ok()
            })
            .filter(|amount| *amount > Decimal::ZERO)
            .collect()
    }

    /// Last amount on the last "total" line, else the largest amount with cents.
    fn find_amount(&self, text: &str) -> Option<Decimal> {
        let from_total = text
            .lines()
            .filter(|line| self.total_line.is_match(line) && !line.to_lowercase().contains("subtotal"))
            .filter_map(|line| self.amounts_in(line).last().copied())
            .last();
        if from_total.is_some() {
            return from_total;
        }

        text.lines()
            .flat_map(|line| self.amounts_in(line))
            .filter(|amount| amount.scale() > 0)
            .max()
    }

    fn find_date(&self, text: &str) -> Option<NaiveDate> {
        let iso = self.iso_date.captures_iter(text).find_map(|caps| {
            NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )
        });
        iso.or_else(|| {
            self.dmy_date.captures_iter(text).find_map(|caps| {
                NaiveDate::from_ymd_opt(
                    caps[3].parse().ok()?,
                    caps[2].parse().ok()?,
                    caps[1].parse().ok()?,
                )
            })
        })
    }
}

impl ReceiptScanner for TextReceiptScanner {
    fn scan(&self, path: &Path) -> Result<ReceiptSuggestion> {
        let text = fs::read_to_string(path).map_err(|e| {
            LedgerError::Capability(format!("Could not read receipt '{}': {e}", path.display()))
        })?;
        let suggestion = self.suggest(&text);
        tracing::debug!(?suggestion, path = %path.display(), "receipt scanned");
        Ok(suggestion)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| LedgerError::Capability(format!("Invalid receipt pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const RECEIPT: &str = "\
  Blue Door Cafe
  12 Market Street
  Date: 26/11/2024
  Cappuccino            180.00
  Croissant              95.50
  Subtotal              275.50
  GST 5%                 13.78
  TOTAL                 289.28
  Thank you!
";

    #[test]
    fn test_suggest_reads_total_date_and_category() {
        let scanner = TextReceiptScanner::new().unwrap();
        let suggestion = scanner.suggest(RECEIPT);

        assert_eq!(suggestion.amount, Some(Decimal::new(28928, 2)));
        assert_eq!(suggestion.date, NaiveDate::from_ymd_opt(2024, 11, 26));
        assert_eq!(suggestion.description.as_deref(), Some("Blue Door Cafe"));
        assert_eq!(suggestion.category.as_deref(), Some("Food"));
    }

    #[test]
    fn test_suggest_falls_back_to_largest_amount() {
        let scanner = TextReceiptScanner::new().unwrap();
        let suggestion = scanner.suggest("City Taxi\n2024-11-20\nFare 1,240.00\nTip 60.00\n");

        assert_eq!(suggestion.amount, Some(Decimal::new(124000, 2)));
        assert_eq!(suggestion.date, NaiveDate::from_ymd_opt(2024, 11, 20));
        assert_eq!(suggestion.category.as_deref(), Some("Transport"));
    }

    #[test]
    fn test_suggest_on_unreadable_text_leaves_fields_blank() {
        let scanner = TextReceiptScanner::new().unwrap();
        let suggestion = scanner.suggest("\n\n???\n");

        assert_eq!(suggestion.amount, None);
        assert_eq!(suggestion.date, None);
        assert_eq!(suggestion.category, None);

        let draft = suggestion.to_draft();
        assert_eq!(draft.amount, "");
        assert_eq!(draft.date, None);
    }

    #[test]
    fn test_scan_reads_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{}", RECEIPT).unwrap();

        let scanner = TextReceiptScanner::new().unwrap();
        let suggestion = scanner.scan(tmp.path()).unwrap();
        assert_eq!(suggestion.amount, Some(Decimal::new(28928, 2)));
    }

    #[test]
    fn test_missing_scanner_and_missing_file_are_capability_errors() {
        assert!(matches!(
            NoScanner.scan(Path::new("receipt.txt")),
            Err(LedgerError::Capability(_))
        ));

        let scanner = TextReceiptScanner::new().unwrap();
        assert!(matches!(
            scanner.scan(Path::new("/definitely/not/here.txt")),
            Err(LedgerError::Capability(_))
        ));
    }
}
