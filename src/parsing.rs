use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{Kind, Status};

// ---------------------------------------------------------------------------
// Text folding
// ---------------------------------------------------------------------------

/// Lower-case and strip Spanish accents so "Categoría" and "categoria" compare equal.
pub fn fold(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Parse a spreadsheet amount. Handles both "1.234,56" and "1,234.56" styles,
/// currency symbols and parenthesized negatives.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '"' | ' ' | '\u{a0}'))
        .collect();
    if s.is_empty() {
        return None;
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return parse_amount(inner).map(|v| -v.abs());
    }
    normalize_separators(&s)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn normalize_separators(s: &str) -> String {
    match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) => {
            if comma > dot {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (None, Some(comma)) => {
            let decimals = s.len() - comma - 1;
            if s.matches(',').count() == 1 && (1..=2).contains(&decimals) {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (Some(dot), None) => {
            let decimals = s.len() - dot - 1;
            if s.matches('.').count() > 1 || decimals == 3 {
                s.replace('.', "")
            } else {
                s.to_string()
            }
        }
        (None, None) => s.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})$").unwrap())
}

fn dmy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4}|\d{2})$").unwrap())
}

/// Parse ISO (`2025-01-31`, optionally with a time part) or day-first
/// (`31/01/2025`, `31/1/25`) dates.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let token = raw.split_whitespace().next()?;
    let token = token.split('T').next().unwrap_or(token);

    if let Some(caps) = iso_re().captures(token) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(caps) = dmy_re().captures(token) {
        let d: u32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let mut y: i32 = caps[3].parse().ok()?;
        if caps[3].len() == 2 {
            y += 2000;
        }
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    None
}

#[cfg(feature = "xlsx")]
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

// ---------------------------------------------------------------------------
// Type / status
// ---------------------------------------------------------------------------

pub fn parse_kind(raw: &str) -> Option<Kind> {
    let folded = fold(raw);
    if ["ingreso", "income", "entrada"]
        .iter()
        .any(|k| folded.starts_with(k))
    {
        Some(Kind::Income)
    } else if ["gasto", "egreso", "expense", "salida"]
        .iter()
        .any(|k| folded.starts_with(k))
    {
        Some(Kind::Expense)
    } else {
        None
    }
}

pub fn parse_status(raw: &str) -> Status {
    let folded = fold(raw);
    if ["pendiente", "pending", "a pagar", "impago"]
        .iter()
        .any(|k| folded.starts_with(k))
    {
        Status::Pending
    } else {
        Status::Realized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("  Categoría "), "categoria");
        assert_eq!(fold("DESCRIPCIÓN"), "descripcion");
        assert_eq!(fold("Método"), "metodo");
        assert_eq!(fold("Año"), "ano");
    }

    #[test]
    fn test_parse_amount_plain() {
        assert_eq!(parse_amount("1500"), Some(1500.0));
        assert_eq!(parse_amount("12.5"), Some(12.5));
        assert_eq!(parse_amount("12,5"), Some(12.5));
        assert_eq!(parse_amount("  -42.50  "), Some(-42.5));
    }

    #[test]
    fn test_parse_amount_thousands_styles() {
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("1.500"), Some(1500.0));
        assert_eq!(parse_amount("1,500"), Some(1500.0));
        assert_eq!(parse_amount("2.000.000"), Some(2_000_000.0));
    }

    #[test]
    fn test_parse_amount_currency_and_negatives() {
        assert_eq!(parse_amount("$ 2.500,00"), Some(2500.0));
        assert_eq!(parse_amount("\"$1,234.56\""), Some(1234.56));
        assert_eq!(parse_amount("(50,00)"), Some(-50.0));
        assert_eq!(parse_amount("-$50.00"), Some(-50.0));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2025-01-31"), Some(ymd(2025, 1, 31)));
        assert_eq!(parse_date("2025-01-31 00:00:00"), Some(ymd(2025, 1, 31)));
        assert_eq!(parse_date("2025-01-31T10:00:00"), Some(ymd(2025, 1, 31)));
        assert_eq!(parse_date("31/01/2025"), Some(ymd(2025, 1, 31)));
        assert_eq!(parse_date("5/3/25"), Some(ymd(2025, 3, 5)));
        assert_eq!(parse_date("05-03-2025"), Some(ymd(2025, 3, 5)));
    }

    #[test]
    fn test_parse_date_rejects_invalid() {
        assert_eq!(parse_date("30/02/2025"), None);
        assert_eq!(parse_date("2025-13-01"), None);
        assert_eq!(parse_date("ayer"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("Ingreso"), Some(Kind::Income));
        assert_eq!(parse_kind("INGRESOS"), Some(Kind::Income));
        assert_eq!(parse_kind("Gasto"), Some(Kind::Expense));
        assert_eq!(parse_kind("Egreso"), Some(Kind::Expense));
        assert_eq!(parse_kind("expense"), Some(Kind::Expense));
        assert_eq!(parse_kind("transferencia"), None);
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("Pendiente"), Status::Pending);
        assert_eq!(parse_status("a pagar"), Status::Pending);
        assert_eq!(parse_status("Realizado"), Status::Realized);
        assert_eq!(parse_status(""), Status::Realized);
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45667.0), Some(ymd(2025, 1, 10)));
    }
}
