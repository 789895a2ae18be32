use crate::error::{MetricsError, Result};
use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

/// Parses an ISO `YYYY-MM-DD` date, failing loudly rather than letting a
/// malformed value propagate into derived fields.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| MetricsError::InvalidDate {
        value: value.to_string(),
    })
}

/// `YYYY-MM` bucket key; lexicographic order equals chronological order.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .checked_sub_days(Days::new(1))
        .unwrap()
}

/// Adds whole calendar months, clamping the day to the target month's length
/// (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let last = last_day_of_month(year, month);
    let day = date.day().min(last.day());
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(last)
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

// Invoice ids encode a correlative number plus a trailing 4-digit year:
// prefix + digits + YYYY, e.g. "FACT12025" is correlative 1 of 2025.
static INVOICE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)(\d+?)(\d{4})$").unwrap());

fn parse_invoice_id(id: &str) -> Option<(i32, u64)> {
    let caps = INVOICE_ID_RE.captures(id.trim())?;
    let correlative: u64 = caps.get(2)?.as_str().parse().ok()?;
    let year: i32 = caps.get(3)?.as_str().parse().ok()?;
    Some((year, correlative))
}

/// Orders invoice ids by (year, correlative). Unparseable ids always sort
/// after well-formed ones, in ascending and descending use alike.
pub fn compare_invoice_ids(a: &str, b: &str) -> Ordering {
    match (parse_invoice_id(a), parse_invoice_id(b)) {
        (Some(ka), Some(kb)) => ka.cmp(&kb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Descending comparator that still pushes unparseable ids to the end.
pub fn compare_invoice_ids_desc(a: &str, b: &str) -> Ordering {
    match (parse_invoice_id(a), parse_invoice_id(b)) {
        (Some(ka), Some(kb)) => kb.cmp(&ka),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_iso_date("2025-01-10").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
        assert!(parse_iso_date("10/01/2025").is_err());
        assert!(parse_iso_date("2025-13-01").is_err());
        assert!(parse_iso_date("").is_err());
    }

    #[test]
    fn test_month_key() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(month_key(date), "2025-03");
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2023, 2),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            last_day_of_month(2023, 12),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_add_months() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(add_months(date, 1), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(add_months(date, 12), NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert_eq!(add_months(date, -1), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_months_between() {
        let start = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        assert_eq!(months_between(start, end), 3);
    }

    #[test]
    fn test_invoice_id_same_year_sorts_by_correlative() {
        assert_eq!(compare_invoice_ids("FACT12024", "FACT22024"), Ordering::Less);
        assert_eq!(compare_invoice_ids("FACT102024", "FACT22024"), Ordering::Greater);
    }

    #[test]
    fn test_invoice_id_year_dominates_correlative() {
        assert_eq!(compare_invoice_ids("FACT92024", "FACT12025"), Ordering::Less);
    }

    #[test]
    fn test_malformed_ids_sort_last_both_directions() {
        let mut ids = vec!["XYZ", "FACT12025", "FACT12024"];
        ids.sort_by(|a, b| compare_invoice_ids(a, b));
        assert_eq!(ids, vec!["FACT12024", "FACT12025", "XYZ"]);

        let mut ids = vec!["XYZ", "FACT12025", "FACT12024"];
        ids.sort_by(|a, b| compare_invoice_ids_desc(a, b));
        assert_eq!(ids, vec!["FACT12025", "FACT12024", "XYZ"]);
    }
}
