//! Cell coercion: dates, amounts and currencies as banks write them

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::adapters::from_excel_serial;
use crate::domain::{fold_label, RawCell};

static DMY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})$").unwrap());
static YMD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})$").unwrap());
static CURRENCY_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)u\$s|us\$|\busd\b|\bars\b|\$").unwrap());
static ARS_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bars\b|\bpesos?\b").unwrap());

/// Decimal separator convention of a layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// `1.234,56` (es-AR)
    #[default]
    DecimalComma,
    /// `1,234.56`
    DecimalDot,
}

/// Parse a date cell
///
/// Accepts native spreadsheet dates, Excel serial numbers and text in
/// day-first or ISO order. Time parts are ignored.
pub fn parse_date(cell: &RawCell) -> Result<NaiveDate, String> {
    match cell {
        RawCell::Date(d) => Ok(*d),
        RawCell::Number(n) => {
            from_excel_serial(*n).ok_or_else(|| format!("'{}' is not a date", n))
        }
        RawCell::Text(s) => parse_date_text(s),
        RawCell::Empty => Err("missing date".to_string()),
        RawCell::Bool(b) => Err(format!("'{}' is not a date", b)),
    }
}

pub fn parse_date_text(raw: &str) -> Result<NaiveDate, String> {
    let s = raw.trim();
    // Drop a time part: "15/01/2024 10:32", "2024-01-15T10:32:00.000-03:00"
    let date_part = s
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(s);

    let invalid = || format!("'{}' is not a date", raw.trim());

    if let Some(caps) = DMY_RE.captures(date_part) {
        let day: u32 = caps[1].parse().map_err(|_| invalid())?;
        let month: u32 = caps[2].parse().map_err(|_| invalid())?;
        let year_text = &caps[3];
        let mut year: i32 = year_text.parse().map_err(|_| invalid())?;
        if year_text.len() == 2 {
            year += if year < 70 { 2000 } else { 1900 };
        }
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid);
    }

    if let Some(caps) = YMD_RE.captures(date_part) {
        let year: i32 = caps[1].parse().map_err(|_| invalid())?;
        let month: u32 = caps[2].parse().map_err(|_| invalid())?;
        let day: u32 = caps[3].parse().map_err(|_| invalid())?;
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid);
    }

    Err(invalid())
}

/// Parse an amount cell. Blank cells (and a lone `-`) are `Ok(None)`.
pub fn parse_amount(cell: &RawCell, format: NumberFormat) -> Result<Option<Decimal>, String> {
    match cell {
        RawCell::Empty => Ok(None),
        RawCell::Number(n) => {
            if !n.is_finite() {
                return Err(format!("'{}' is not an amount", n));
            }
            Decimal::from_str(&n.to_string())
                .map(Some)
                .map_err(|_| format!("'{}' is not an amount", n))
        }
        RawCell::Text(s) => parse_amount_text(s, format),
        RawCell::Date(d) => Err(format!("'{}' is not an amount", d)),
        RawCell::Bool(b) => Err(format!("'{}' is not an amount", b)),
    }
}

pub fn parse_amount_text(raw: &str, format: NumberFormat) -> Result<Option<Decimal>, String> {
    let invalid = || format!("'{}' is not an amount", raw.trim());

    let mut s: String = CURRENCY_TOKEN_RE
        .replace_all(raw, "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if s.is_empty() || s == "-" {
        return Ok(None);
    }

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.to_string();
    } else if let Some(rest) = s.strip_suffix('-') {
        // Trailing minus, as in "1.234,56-"
        negative = !negative;
        s = rest.to_string();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.to_string();
    }

    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return Err(invalid());
    }
    if !s.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let canonical = canonical_digits(&s, format);
    let value = Decimal::from_str(&canonical).map_err(|_| invalid())?;
    Ok(Some(if negative { -value } else { value }))
}

/// Rewrite digits with separators into `1234.56` form
fn canonical_digits(s: &str, format: NumberFormat) -> String {
    let has_comma = s.contains(',');
    let has_dot = s.contains('.');

    let decimal = match (has_comma, has_dot) {
        // Both present: the last one is the decimal separator
        (true, true) => {
            if s.rfind(',') > s.rfind('.') {
                Some(',')
            } else {
                Some('.')
            }
        }
        (true, false) => single_separator(s, ',', format == NumberFormat::DecimalComma),
        (false, true) => single_separator(s, '.', format == NumberFormat::DecimalDot),
        (false, false) => None,
    };

    s.chars()
        .filter_map(|c| match c {
            ',' | '.' if Some(c) == decimal => Some('.'),
            ',' | '.' => None,
            d => Some(d),
        })
        .collect()
}

/// Decide whether a lone separator kind is decimal or grouping
fn single_separator(s: &str, sep: char, is_layout_decimal: bool) -> Option<char> {
    let occurrences = s.matches(sep).count();
    if occurrences > 1 {
        return None;
    }
    let digits_after = s.rsplit(sep).next().map(str::len).unwrap_or(0);
    // "1.234" is a thousand in a decimal-comma layout, "1234.5" is not
    if is_layout_decimal || digits_after != 3 {
        Some(sep)
    } else {
        None
    }
}

/// Currency code mentioned in a piece of text
pub fn detect_currency(text: &str) -> Option<&'static str> {
    let folded = fold_label(text);
    if folded.contains("u$s")
        || folded.contains("us$")
        || folded.contains("usd")
        || folded.contains("dolar")
    {
        return Some("USD");
    }
    if folded.contains('$') || ARS_WORD_RE.is_match(&folded) {
        return Some("ARS");
    }
    None
}
