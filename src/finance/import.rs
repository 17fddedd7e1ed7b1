//! Spreadsheet and Stripe export parsing.
//!
//! Column headers are matched loosely (`"Total Income"` is revenue),
//! dates are normalised to `YYYY-MM` and numbers tolerate currency symbols,
//! thousands separators and accounting negatives.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::models::FinancialRecordInput;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("CSV could not be read: {0}")]
    Csv(#[from] csv::Error),

    #[error("File is not valid UTF-8")]
    Encoding,

    #[error("No columns found in CSV")]
    NoColumns,

    #[error("Invalid Google Sheets URL")]
    InvalidSheetUrl,

    #[error("Could not fetch the Google Sheet: {0}")]
    Fetch(String),
}

/// Canonical field names, checked in order: the first key contained in the
/// lowercased header wins.
const COLUMN_MAPPINGS: &[(&str, &str)] = &[
    ("date", "month"),
    ("period", "month"),
    ("month", "month"),
    ("revenue", "revenue"),
    ("income", "revenue"),
    ("sales", "revenue"),
    ("expense", "expenses"),
    ("costs", "expenses"),
    ("spending", "expenses"),
    ("cash", "cash_balance"),
    ("balance", "cash_balance"),
    ("amount", "amount"),
    ("net", "net"),
    ("fee", "fee"),
    ("created", "date"),
    ("type", "type"),
    ("description", "description"),
];

pub fn normalize_column_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    COLUMN_MAPPINGS
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lower)
}

const DAY_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y", "%m-%d-%Y", "%m/%d/%Y"];

static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})[-/](\d{1,2})").unwrap());

static SHEET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:/spreadsheets/d/|[?&]id=)([a-zA-Z0-9_-]+)").unwrap());

/// Normalise a date-ish cell to `YYYY-MM`.
pub fn parse_date_to_month(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in DAY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date.format("%Y-%m").to_string());
        }
    }

    // "January 2024" / "Jan 2024": pin to the first of the month.
    for fmt in ["%d %B %Y", "%d %b %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {raw}"), fmt) {
            return Some(date.format("%Y-%m").to_string());
        }
    }

    let caps = YEAR_MONTH.captures(raw)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(format!("{year:04}-{month:02}"))
}

/// Lenient number parsing; anything unparseable is zero.
pub fn parse_float(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ',' | ' '))
        .collect();
    let (negative, digits) = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };
    match digits.parse::<f64>() {
        Ok(v) if v.is_finite() => {
            if negative {
                -v
            } else {
                v
            }
        }
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub latest_cash_balance: Option<f64>,
    pub average_monthly_expenses: Option<f64>,
    pub average_monthly_revenue: Option<f64>,
    pub months_of_data: usize,
    pub records_parsed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SpreadsheetImport {
    pub records: Vec<FinancialRecordInput>,
    pub summary: FinancialSummary,
    /// Per-row problems; the rest of the file is still imported.
    pub errors: Vec<String>,
}

/// Read a CSV and map each header to its canonical field. When two headers
/// map to the same field the leftmost wins.
fn read_rows(content: &str) -> Result<Vec<BTreeMap<String, String>>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_column_name)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::NoColumns);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = BTreeMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            row.entry(header.clone()).or_insert_with(|| value.to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}

fn field<'a>(row: &'a BTreeMap<String, String>, name: &str) -> &'a str {
    row.get(name).map(String::as_str).unwrap_or("")
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Parse a financial spreadsheet: one month per row with revenue, expenses
/// and cash columns. Expenses are split across buckets by the standard ratio.
pub fn import_spreadsheet(content: &str) -> Result<SpreadsheetImport, ImportError> {
    let rows = read_rows(content)?;
    let mut import = SpreadsheetImport::default();
    let mut revenues = Vec::new();
    let mut expenses = Vec::new();
    let mut cash_balances = Vec::new();

    for (line, row) in rows.iter().enumerate() {
        let raw_month = match field(row, "month") {
            "" => field(row, "date"),
            m => m,
        };
        let Some(month) = parse_date_to_month(raw_month) else {
            import
                .errors
                .push(format!("Row {}: could not parse date '{raw_month}'", line + 2));
            continue;
        };

        let revenue = parse_float(field(row, "revenue"));
        let expense = parse_float(field(row, "expenses"));
        let cash = parse_float(field(row, "cash_balance"));
        if revenue > 0.0 {
            revenues.push(revenue);
        }
        if expense > 0.0 {
            expenses.push(expense);
        }
        if cash > 0.0 {
            cash_balances.push(cash);
        }
        import
            .records
            .push(FinancialRecordInput::from_totals(&month, revenue, expense, cash));
    }

    import.summary = FinancialSummary {
        latest_cash_balance: cash_balances.last().copied(),
        average_monthly_expenses: average(&expenses),
        average_monthly_revenue: average(&revenues),
        months_of_data: import
            .records
            .iter()
            .map(|r| r.month.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .len(),
        records_parsed: import.records.len(),
    };
    Ok(import)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StripeSummary {
    pub total_revenue: f64,
    pub net_revenue: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StripeMonth {
    pub revenue: f64,
    pub fees: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StripeImport {
    /// Keyed by `YYYY-MM`.
    pub months: BTreeMap<String, StripeMonth>,
    pub summary: StripeSummary,
    pub errors: Vec<String>,
}

/// Parse a Stripe payments export. Amounts and fees are in cents; only
/// positive charges count.
pub fn import_stripe(content: &str) -> Result<StripeImport, ImportError> {
    let rows = read_rows(content)?;
    let mut import = StripeImport::default();
    let mut total_fees = 0.0;

    for (line, row) in rows.iter().enumerate() {
        let amount = parse_float(field(row, "amount")) / 100.0;
        if amount <= 0.0 {
            continue;
        }
        let fee = parse_float(field(row, "fee")) / 100.0;
        import.summary.total_revenue += amount;
        import.summary.transaction_count += 1;
        total_fees += fee;

        let raw_date = match field(row, "date") {
            "" => field(row, "month"),
            d => d,
        };
        match parse_date_to_month(raw_date) {
            Some(month) => {
                let entry = import.months.entry(month).or_default();
                entry.revenue += amount;
                entry.fees += fee;
            }
            None => import
                .errors
                .push(format!("Row {}: could not parse date '{raw_date}'", line + 2)),
        }
    }

    import.summary.net_revenue = import.summary.total_revenue - total_fees;
    Ok(import)
}

/// Pull the spreadsheet id out of a Google Sheets share link.
pub fn extract_sheet_id(url: &str) -> Option<String> {
    SHEET_ID.captures(url).map(|caps| caps[1].to_string())
}

pub fn sheet_export_url(sheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv")
}

/// Download a publicly shared Google Sheet as CSV. Blocking; call from
/// `spawn_blocking`.
pub fn fetch_google_sheet_csv(sheet_url: &str) -> Result<String, ImportError> {
    if !sheet_url.contains("docs.google.com/spreadsheets") {
        return Err(ImportError::InvalidSheetUrl);
    }
    let sheet_id = extract_sheet_id(sheet_url).ok_or(ImportError::InvalidSheetUrl)?;

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| ImportError::Fetch(e.to_string()))?;
    let response = client
        .get(sheet_export_url(&sheet_id))
        .send()
        .map_err(|e| ImportError::Fetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ImportError::Fetch(format!("HTTP {}", response.status())));
    }
    response.text().map_err(|e| ImportError::Fetch(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_map_by_first_matching_key() {
        assert_eq!(normalize_column_name("Date"), "month");
        assert_eq!(normalize_column_name(" Monthly Revenue ($) "), "month");
        assert_eq!(normalize_column_name("Total Income"), "revenue");
        assert_eq!(normalize_column_name("Operating Costs"), "expenses");
        assert_eq!(normalize_column_name("Bank Balance"), "cash_balance");
        assert_eq!(normalize_column_name("Created (UTC)"), "date");
        assert_eq!(normalize_column_name("Notes"), "notes");
    }

    #[test]
    fn dates_in_many_formats() {
        assert_eq!(parse_date_to_month("2024-01-15").as_deref(), Some("2024-01"));
        assert_eq!(parse_date_to_month("2024/02/03").as_deref(), Some("2024-02"));
        assert_eq!(parse_date_to_month("15/03/2024").as_deref(), Some("2024-03"));
        assert_eq!(parse_date_to_month("04-30-2024").as_deref(), Some("2024-04"));
        assert_eq!(parse_date_to_month("January 2024").as_deref(), Some("2024-01"));
        assert_eq!(parse_date_to_month("Sep 2023").as_deref(), Some("2023-09"));
        assert_eq!(parse_date_to_month("2024-05").as_deref(), Some("2024-05"));
        assert_eq!(parse_date_to_month("2024/6").as_deref(), Some("2024-06"));
        assert_eq!(parse_date_to_month("2024-01-05 10:12:00").as_deref(), Some("2024-01"));
        assert_eq!(parse_date_to_month("next spring"), None);
        assert_eq!(parse_date_to_month(""), None);
    }

    #[test]
    fn numbers_tolerate_formatting() {
        assert_eq!(parse_float("$1,234.50"), 1234.5);
        assert_eq!(parse_float("€ 99"), 99.0);
        assert_eq!(parse_float("(500)"), -500.0);
        assert_eq!(parse_float("n/a"), 0.0);
        assert_eq!(parse_float(""), 0.0);
    }

    #[test]
    fn spreadsheet_rows_become_records() {
        let csv = "Month,Revenue,Expenses,Cash Balance\n\
                   2024-01,20000,48000,170000\n\
                   2024-02,\"$22,000\",50000,142000\n\
                   someday,1,1,1\n";
        let import = import_spreadsheet(csv).unwrap();
        assert_eq!(import.records.len(), 2);
        assert_eq!(import.errors.len(), 1);
        assert!(import.errors[0].contains("someday"));

        let feb = &import.records[1];
        assert_eq!(feb.month, "2024-02");
        assert_eq!(feb.revenue_recurring, 22_000.0);
        assert!((feb.expenses_salaries - 30_000.0).abs() < 1e-6);
        assert!((feb.total_expenses() - 50_000.0).abs() < 1e-6);

        assert_eq!(import.summary.latest_cash_balance, Some(142_000.0));
        assert_eq!(import.summary.average_monthly_revenue, Some(21_000.0));
        assert_eq!(import.summary.months_of_data, 2);
    }

    #[test]
    fn header_only_csv_has_no_records() {
        let import = import_spreadsheet("date,revenue\n").unwrap();
        assert!(import.records.is_empty());
        assert_eq!(import.summary.average_monthly_revenue, None);
    }

    #[test]
    fn empty_file_has_no_columns() {
        assert!(matches!(import_spreadsheet(""), Err(ImportError::NoColumns)));
    }

    #[test]
    fn stripe_export_grouped_by_month() {
        let csv = "id,Amount,Fee,Created (UTC)\n\
                   ch_1,5000,175,2024-03-02 10:00:00\n\
                   ch_2,2500,100,2024-03-20 11:00:00\n\
                   ch_3,-1000,0,2024-03-21 11:00:00\n\
                   ch_4,10000,320,2024-04-01 09:00:00\n";
        let import = import_stripe(csv).unwrap();
        assert_eq!(import.summary.transaction_count, 3);
        assert!((import.summary.total_revenue - 175.0).abs() < 1e-9);
        assert!((import.summary.net_revenue - 169.05).abs() < 1e-9);

        let march = import.months["2024-03"];
        assert!((march.revenue - 75.0).abs() < 1e-9);
        assert!((march.fees - 2.75).abs() < 1e-9);
        assert_eq!(import.months.len(), 2);
    }

    #[test]
    fn sheet_id_from_share_links() {
        assert_eq!(
            extract_sheet_id("https://docs.google.com/spreadsheets/d/1AbC-d_9/edit#gid=0").as_deref(),
            Some("1AbC-d_9")
        );
        assert_eq!(
            extract_sheet_id("https://docs.google.com/spreadsheets?id=XYZ123").as_deref(),
            Some("XYZ123")
        );
        assert_eq!(extract_sheet_id("https://example.com/sheet"), None);
    }

    #[test]
    fn non_google_url_rejected_without_fetch() {
        assert!(matches!(
            fetch_google_sheet_csv("https://example.com/data.csv"),
            Err(ImportError::InvalidSheetUrl)
        ));
    }
}
