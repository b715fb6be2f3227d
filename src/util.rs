// Cell coercion and number formatting helpers.
//
// Spreadsheet cells arrive as loosely typed `calamine::Data`; everything past
// the loader works with plain text keys and `Decimal` amounts.
use calamine::Data;
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

const FONTE_LEN: usize = 8;

static PLAIN_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid amount pattern"));
static PT_BR_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d{1,3}(\.\d{3})*(,\d+)?$").expect("valid pt-BR amount pattern")
});

/// Normalize a header cell: trim surrounding whitespace and upper-case.
pub fn normalize_header(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Coerce a cell to text.
///
/// Whole floats are written without a fractional part, since spreadsheets
/// store integer codes such as `ORGANOGRAMA` as floats.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Read a cell as an amount. Empty cells count as zero; anything that is not
/// a number yields `None`.
pub fn cell_amount(cell: &Data) -> Option<Decimal> {
    match cell {
        Data::Empty => Some(Decimal::ZERO),
        Data::Int(i) => Some(Decimal::from(*i)),
        // `f64` display is the shortest string that round-trips, so 0.1 stays 0.1.
        Data::Float(f) if f.is_finite() => Decimal::from_str(&f.to_string()).ok(),
        Data::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Parse a textual amount. Only two layouts are accepted:
///
/// - plain: `1234.56`, `-200`, `1.234` (a single dot is a decimal point);
/// - pt-BR: `1.234,56`, `1.234.567`, `10,5` (dots group thousands in threes,
///   the comma is the decimal separator).
///
/// Blank text is zero. Anything else, such as `1,234.56`, is `None`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return Some(Decimal::ZERO);
    }
    if PLAIN_AMOUNT.is_match(s) {
        return Decimal::from_str(s).ok();
    }
    if PT_BR_AMOUNT.is_match(s) {
        return Decimal::from_str(&s.replace('.', "").replace(',', ".")).ok();
    }
    None
}

/// Last eight characters of the organograma code, or the whole code when it
/// is shorter.
pub fn fonte_de_recurso(organograma: &str) -> String {
    let len = organograma.chars().count();
    organograma
        .chars()
        .skip(len.saturating_sub(FONTE_LEN))
        .collect()
}

/// Nearest `f64` to an amount, for spreadsheet cells. Goes through the
/// decimal text so the result is correctly rounded.
///
/// Spreadsheet numbers are doubles: amounts with more than 15 significant
/// digits lose their trailing digits in the sheet, while panels and CSV
/// files keep the exact decimal.
pub fn amount_to_f64(n: Decimal) -> f64 {
    n.to_string().parse().unwrap_or_default()
}

/// Format an amount for display with thousands separators and at least two
/// decimals. The value is never rounded.
pub fn format_decimal(n: Decimal) -> String {
    let mut n = n.normalize();
    if n.scale() < 2 {
        n.rescale(2);
    }
    let neg = n.is_sign_negative() && !n.is_zero();
    let s = n.abs().to_string();
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u128 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
