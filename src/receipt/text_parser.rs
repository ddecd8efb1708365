//! Heuristic parsing of raw OCR text into a receipt.

use chrono::NaiveDate;
use regex::Regex;

use crate::domain::{Decimal, ReceiptData, ReceiptItem};

const SUMMARY_WORDS: [&str; 4] = ["subtotal", "tax", "tip", "total"];

#[derive(Debug, Clone)]
pub struct ReceiptTextParser {
    date: Regex,
    item: Regex,
    subtotal: Regex,
    tax: Regex,
    tip: Regex,
    total: Regex,
}

impl ReceiptTextParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            date: Regex::new(r"(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})")?,
            item: Regex::new(r"^(.+?)\s+(?:(\d+)\s+)?\$?(\d+\.\d{2})$")?,
            subtotal: Regex::new(r"(?i)\bsub\s*total[:\s]*\$?(\d+\.\d{2})")?,
            tax: Regex::new(r"(?i)\btax\b[:\s]*\$?(\d+\.\d{2})")?,
            tip: Regex::new(r"(?i)\b(?:tip|gratuity)\b[:\s]*\$?(\d+\.\d{2})")?,
            total: Regex::new(r"(?i)\btotal[:\s]*\$?(\d+\.\d{2})")?,
        })
    }

    /// Parse OCR text. `today` is used when no date is recognised.
    pub fn parse(&self, text: &str, today: &str) -> ReceiptData {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let merchant = lines
            .first()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "Unknown Merchant".to_string());
        let date = self.parse_date(text).unwrap_or_else(|| today.to_string());

        let items: Vec<ReceiptItem> = lines
            .iter()
            .skip(1)
            .filter(|line| !is_summary_line(line))
            .filter_map(|line| self.parse_item(line))
            .collect();

        let subtotal = capture_amount(&self.subtotal, text)
            .unwrap_or_else(|| items.iter().map(|i| i.total).sum());
        let tax = capture_amount(&self.tax, text).unwrap_or_default();
        let tip = capture_amount(&self.tip, text).unwrap_or_default();
        let total = capture_amount(&self.total, text).unwrap_or(subtotal + tax + tip);

        ReceiptData {
            merchant,
            date,
            items,
            subtotal,
            tax,
            tip,
            total,
        }
    }

    /// Month-first, like US receipts. Returns `YYYY-MM-DD`.
    fn parse_date(&self, text: &str) -> Option<String> {
        let caps = self.date.captures(text)?;
        let month: u32 = caps.get(1)?.as_str().parse().ok()?;
        let day: u32 = caps.get(2)?.as_str().parse().ok()?;
        let year_raw = caps.get(3)?.as_str();
        let year: i32 = match year_raw.len() {
            2 => 2000 + year_raw.parse::<i32>().ok()?,
            4 => year_raw.parse().ok()?,
            _ => return None,
        };
        NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
    }

    fn parse_item(&self, line: &str) -> Option<ReceiptItem> {
        let caps = self.item.captures(line)?;
        let name = caps.get(1)?.as_str().trim().to_string();
        let quantity = caps
            .get(2)
            .and_then(|q| q.as_str().parse::<u32>().ok())
            .filter(|q| *q > 0)
            .unwrap_or(1);
        let total = Decimal::from_str_canonical(caps.get(3)?.as_str()).ok()?;
        let price = total
            .checked_div(Decimal::from(quantity))
            .map(|p| p.round_cents())
            .unwrap_or(total);
        Some(ReceiptItem {
            name,
            quantity,
            price,
            total,
        })
    }
}

fn is_summary_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    SUMMARY_WORDS.iter().any(|w| lower.contains(w))
}

fn capture_amount(re: &Regex, text: &str) -> Option<Decimal> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| Decimal::from_str_canonical(m.as_str()).ok())
}
