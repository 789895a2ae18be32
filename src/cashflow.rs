//! Cashflow metrics: burn rate, net burn, runway, and category breakdowns
//! derived from raw dated bank-ledger rows.
//!
//! Sign discipline: ledger amounts keep their source sign (expenses negative,
//! inflows positive) all the way through bucketing and averaging via
//! [`SignedAmount`]; magnitudes appear only in the final display-oriented
//! fields of [`CashflowMetrics`].

use crate::amount::SignedAmount;
use crate::error::Result;
use crate::normalize::NormalizerConfig;
use crate::schema::{CashBalance, LedgerRecord};
use crate::utils::{add_months, month_key};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// `YYYY-MM` key; ascending lexicographic order is chronological.
    pub month: String,
    pub total: SignedAmount,
}

/// Groups records by calendar month of their date, summing amounts.
pub fn monthly_buckets(records: &[LedgerRecord]) -> Vec<MonthlyBucket> {
    let mut totals: BTreeMap<String, SignedAmount> = BTreeMap::new();
    for record in records {
        *totals.entry(month_key(record.date)).or_default() += record.amount;
    }

    totals
        .into_iter()
        .map(|(month, total)| MonthlyBucket { month, total })
        .collect()
}

/// Last `window_months` buckets; 0 means no filter (all history).
fn trailing_window(buckets: &[MonthlyBucket], window_months: usize) -> &[MonthlyBucket] {
    if window_months == 0 || buckets.len() <= window_months {
        buckets
    } else {
        &buckets[buckets.len() - window_months..]
    }
}

fn average(buckets: &[MonthlyBucket]) -> f64 {
    if buckets.is_empty() {
        return 0.0;
    }
    let sum: f64 = buckets.iter().map(|b| b.total.raw()).sum();
    sum / buckets.len() as f64
}

/// Average monthly operating spend over the trailing window, financing rows
/// excluded. Sign follows the ledger convention, so the result is typically
/// negative; callers take the magnitude for display.
///
/// A window longer than the available history averages only the months
/// present, never dividing by the nominal window length.
pub fn burn_rate(
    expenses: &[LedgerRecord],
    window_months: usize,
    cfg: &NormalizerConfig,
) -> SignedAmount {
    let operating: Vec<LedgerRecord> = expenses
        .iter()
        .filter(|e| !cfg.is_financing_expense(&e.category))
        .cloned()
        .collect();

    let buckets = monthly_buckets(&operating);
    SignedAmount::new(average(trailing_window(&buckets, window_months)))
}

/// Average monthly operating inflow, excluding grant/loan/equity categories.
/// Never negative.
pub fn avg_monthly_inflow(
    inflows: &[LedgerRecord],
    window_months: usize,
    cfg: &NormalizerConfig,
) -> f64 {
    let operating: Vec<LedgerRecord> = inflows
        .iter()
        .filter(|i| !cfg.is_financing_inflow(&i.category))
        .cloned()
        .collect();

    let buckets = monthly_buckets(&operating);
    average(trailing_window(&buckets, window_months)).max(0.0)
}

/// Positive means cash is depleting, negative or zero means accumulating.
pub fn net_burn(burn: SignedAmount, avg_inflow: f64) -> f64 {
    burn.magnitude() - avg_inflow
}

/// Months of cash left at the current net burn. Infinite runway is a distinct
/// state, never coerced to zero months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Runway {
    Finite(f64),
    Indefinite,
}

impl Runway {
    pub fn is_indefinite(&self) -> bool {
        matches!(self, Runway::Indefinite)
    }

    pub fn months(&self) -> Option<f64> {
        match self {
            Runway::Finite(m) => Some(*m),
            Runway::Indefinite => None,
        }
    }

    /// Wire value used in flat snapshot structs: -1 marks infinite runway,
    /// per the reporting convention.
    pub fn sentinel(&self) -> f64 {
        match self {
            Runway::Finite(m) => *m,
            Runway::Indefinite => -1.0,
        }
    }
}

impl fmt::Display for Runway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runway::Finite(m) => write!(f, "{:.1}", m),
            Runway::Indefinite => write!(f, "Indefinido"),
        }
    }
}

/// Runway is indefinite whenever net burn is zero or negative; the empty-data
/// case reaches this through a zero net burn, never via a shortcut.
pub fn runway_months(current_cash: f64, net_burn: f64) -> Runway {
    if net_burn <= 0.0 {
        Runway::Indefinite
    } else {
        Runway::Finite(current_cash / net_burn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunwayEnd {
    Date(NaiveDate),
    Indefinite,
}

impl fmt::Display for RunwayEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunwayEnd::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            RunwayEnd::Indefinite => write!(f, "Indefinido"),
        }
    }
}

impl Serialize for RunwayEnd {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Adds `floor(runway months)` whole months to today.
pub fn runway_end_date(runway: Runway, today: NaiveDate) -> RunwayEnd {
    match runway {
        Runway::Indefinite => RunwayEnd::Indefinite,
        Runway::Finite(months) => RunwayEnd::Date(add_months(today, months.floor() as i32)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    /// Absolute spend in the window.
    pub total: f64,
    /// Share of the absolute grand total, 0..=100.
    pub percentage: f64,
}

/// Spend per canonical category over the trailing window, descending by
/// magnitude. Financing and blank categories never appear.
pub fn expenses_by_category(
    expenses: &[LedgerRecord],
    window_months: usize,
    cfg: &NormalizerConfig,
) -> Vec<CategoryShare> {
    let operating: Vec<LedgerRecord> = expenses
        .iter()
        .filter(|e| !e.category.trim().is_empty() && !cfg.is_financing_expense(&e.category))
        .cloned()
        .collect();

    let buckets = monthly_buckets(&operating);
    let window: std::collections::BTreeSet<&str> = trailing_window(&buckets, window_months)
        .iter()
        .map(|b| b.month.as_str())
        .collect();

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for record in &operating {
        if !window.contains(month_key(record.date).as_str()) {
            continue;
        }
        *totals.entry(cfg.canonical_category(&record.category)).or_default() +=
            record.amount.magnitude();
    }

    let grand_total: f64 = totals.values().sum();

    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|(category, total)| CategoryShare {
            category,
            total,
            percentage: if grand_total == 0.0 {
                0.0
            } else {
                total / grand_total * 100.0
            },
        })
        .collect();

    shares.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    shares
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowPoint {
    pub month: String,
    pub inflow: f64,
    pub outflow: f64,
    pub net: f64,
}

/// Month-by-month inflow vs outflow for charting. Months present in either
/// series appear in the union with the missing side at zero.
pub fn cashflow_chart_series(
    expenses: &[LedgerRecord],
    inflows: &[LedgerRecord],
    window_months: usize,
) -> Vec<CashflowPoint> {
    let expense_buckets: BTreeMap<String, SignedAmount> = monthly_buckets(expenses)
        .into_iter()
        .map(|b| (b.month, b.total))
        .collect();
    let inflow_buckets: BTreeMap<String, SignedAmount> = monthly_buckets(inflows)
        .into_iter()
        .map(|b| (b.month, b.total))
        .collect();

    let mut months: Vec<String> = expense_buckets
        .keys()
        .chain(inflow_buckets.keys())
        .cloned()
        .collect();
    months.sort();
    months.dedup();

    if window_months > 0 && months.len() > window_months {
        months = months.split_off(months.len() - window_months);
    }

    months
        .into_iter()
        .map(|month| {
            let inflow = inflow_buckets.get(&month).map(|a| a.raw()).unwrap_or(0.0);
            let outflow = expense_buckets
                .get(&month)
                .map(|a| a.magnitude())
                .unwrap_or(0.0);
            CashflowPoint {
                month,
                inflow,
                outflow,
                net: inflow - outflow,
            }
        })
        .collect()
}

/// The single externally consumed "cash health" snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CashflowMetrics {
    pub current_cash: f64,
    /// Burn rate magnitude (display convention).
    pub burn_rate: f64,
    pub avg_monthly_inflow: f64,
    pub net_burn: f64,
    /// Months of runway; -1 marks infinite runway.
    pub runway_months: f64,
    pub runway_end: RunwayEnd,
    pub categories: Vec<CategoryShare>,
}

pub fn cashflow_metrics(
    expenses: &[LedgerRecord],
    inflows: &[LedgerRecord],
    cash: &CashBalance,
    window_months: usize,
    today: NaiveDate,
    cfg: &NormalizerConfig,
) -> Result<CashflowMetrics> {
    let burn = burn_rate(expenses, window_months, cfg);
    let inflow = avg_monthly_inflow(inflows, window_months, cfg);
    let net = net_burn(burn, inflow);
    let runway = runway_months(cash.current, net);

    Ok(CashflowMetrics {
        current_cash: cash.current,
        burn_rate: burn.magnitude(),
        avg_monthly_inflow: inflow,
        net_burn: net,
        runway_months: runway.sentinel(),
        runway_end: runway_end_date(runway, today),
        categories: expenses_by_category(expenses, window_months, cfg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cfg() -> NormalizerConfig {
        NormalizerConfig::with_defaults()
    }

    fn three_months_of_expenses() -> Vec<LedgerRecord> {
        vec![
            LedgerRecord::new(date(2025, 1, 10), -1000.0, "Hosting"),
            LedgerRecord::new(date(2025, 2, 10), -2000.0, "Hosting"),
            LedgerRecord::new(date(2025, 3, 10), -3000.0, "Hosting"),
        ]
    }

    #[test]
    fn test_monthly_buckets_sorted_ascending() {
        let records = vec![
            LedgerRecord::new(date(2025, 3, 5), -300.0, "A"),
            LedgerRecord::new(date(2025, 1, 5), -100.0, "A"),
            LedgerRecord::new(date(2025, 1, 20), -50.0, "B"),
        ];

        let buckets = monthly_buckets(&records);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].month, "2025-01");
        assert_eq!(buckets[0].total.raw(), -150.0);
        assert_eq!(buckets[1].month, "2025-03");
    }

    #[test]
    fn test_burn_rate_mean_over_window() {
        let burn = burn_rate(&three_months_of_expenses(), 3, &cfg());
        assert_eq!(burn.raw(), -2000.0);
        assert_eq!(burn.magnitude(), 2000.0);
    }

    #[test]
    fn test_burn_rate_short_history_averages_present_months_only() {
        // Window of 12 with only 3 months of data: divide by 3, not 12.
        let burn = burn_rate(&three_months_of_expenses(), 12, &cfg());
        assert_eq!(burn.raw(), -2000.0);
    }

    #[test]
    fn test_burn_rate_excludes_financing() {
        let mut expenses = three_months_of_expenses();
        expenses.push(LedgerRecord::new(date(2025, 2, 15), -99999.0, "Financiación"));

        let burn = burn_rate(&expenses, 3, &cfg());
        assert_eq!(burn.raw(), -2000.0);
    }

    #[test]
    fn test_burn_rate_empty_is_zero() {
        let burn = burn_rate(&[], 6, &cfg());
        assert!(burn.is_zero());
    }

    #[test]
    fn test_avg_inflow_excludes_financing_labels() {
        let inflows = vec![
            LedgerRecord::new(date(2025, 1, 5), 5000.0, "Ventas"),
            LedgerRecord::new(date(2025, 2, 5), 7000.0, "Ventas"),
            LedgerRecord::new(date(2025, 2, 20), 250000.0, "Ampliación de capital"),
            LedgerRecord::new(date(2025, 1, 25), 40000.0, "Préstamo"),
        ];

        assert_eq!(avg_monthly_inflow(&inflows, 2, &cfg()), 6000.0);
    }

    #[test]
    fn test_net_burn_signs() {
        assert_eq!(net_burn(SignedAmount::new(-8000.0), 5000.0), 3000.0);
        assert_eq!(net_burn(SignedAmount::new(-4000.0), 5000.0), -1000.0);
    }

    #[test]
    fn test_runway_infinite_when_cash_positive() {
        let runway = runway_months(60000.0, -500.0);
        assert!(runway.is_indefinite());
        assert_eq!(runway.sentinel(), -1.0);
        assert_eq!(runway.to_string(), "Indefinido");
        assert_eq!(
            runway_end_date(runway, date(2025, 6, 1)),
            RunwayEnd::Indefinite
        );
        assert_eq!(runway_end_date(runway, date(2025, 6, 1)).to_string(), "Indefinido");
    }

    #[test]
    fn test_runway_finite_exact() {
        let runway = runway_months(60000.0, 5000.0);
        assert_eq!(runway.months(), Some(12.0));

        let end = runway_end_date(runway, date(2025, 6, 15));
        assert_eq!(end, RunwayEnd::Date(date(2026, 6, 15)));
    }

    #[test]
    fn test_runway_zero_net_burn_is_indefinite() {
        assert!(runway_months(0.0, 0.0).is_indefinite());
    }

    #[test]
    fn test_expenses_by_category_shares() {
        let expenses = vec![
            LedgerRecord::new(date(2025, 1, 5), -6000.0, "Nóminas"),
            LedgerRecord::new(date(2025, 1, 9), -3000.0, "Hosting"),
            LedgerRecord::new(date(2025, 2, 9), -1000.0, "Hosting"),
            LedgerRecord::new(date(2025, 2, 10), -500.0, "Financiación"),
            LedgerRecord::new(date(2025, 2, 11), -123.0, "  "),
        ];

        let shares = expenses_by_category(&expenses, 0, &cfg());
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].category, "Nóminas");
        assert_eq!(shares[0].total, 6000.0);
        assert!((shares[0].percentage - 60.0).abs() < 1e-9);
        assert_eq!(shares[1].category, "Hosting");
        assert_eq!(shares[1].total, 4000.0);
        assert!((shares[1].percentage - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_expenses_by_category_empty_total_is_zero_percent() {
        let shares = expenses_by_category(&[], 6, &cfg());
        assert!(shares.is_empty());
    }

    #[test]
    fn test_expenses_by_category_window_filter() {
        let expenses = vec![
            LedgerRecord::new(date(2024, 6, 5), -9000.0, "Hosting"),
            LedgerRecord::new(date(2025, 1, 5), -1000.0, "Hosting"),
            LedgerRecord::new(date(2025, 2, 5), -1000.0, "Nóminas"),
        ];

        let shares = expenses_by_category(&expenses, 2, &cfg());
        let hosting = shares.iter().find(|s| s.category == "Hosting").unwrap();
        assert_eq!(hosting.total, 1000.0);
    }

    #[test]
    fn test_chart_series_month_union() {
        let expenses = vec![LedgerRecord::new(date(2025, 1, 5), -2000.0, "Hosting")];
        let inflows = vec![LedgerRecord::new(date(2025, 2, 5), 3000.0, "Ventas")];

        let series = cashflow_chart_series(&expenses, &inflows, 0);
        assert_eq!(series.len(), 2);

        assert_eq!(series[0].month, "2025-01");
        assert_eq!(series[0].inflow, 0.0);
        assert_eq!(series[0].outflow, 2000.0);
        assert_eq!(series[0].net, -2000.0);

        assert_eq!(series[1].month, "2025-02");
        assert_eq!(series[1].inflow, 3000.0);
        assert_eq!(series[1].outflow, 0.0);
        assert_eq!(series[1].net, 3000.0);
    }

    #[test]
    fn test_chart_series_trailing_window() {
        let expenses = vec![
            LedgerRecord::new(date(2025, 1, 5), -100.0, "A"),
            LedgerRecord::new(date(2025, 2, 5), -100.0, "A"),
            LedgerRecord::new(date(2025, 3, 5), -100.0, "A"),
        ];

        let series = cashflow_chart_series(&expenses, &[], 2);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].month, "2025-02");
    }

    #[test]
    fn test_cashflow_metrics_composition() {
        let cash = CashBalance {
            current: 60000.0,
            history: vec![],
        };
        let inflows = vec![
            LedgerRecord::new(date(2025, 1, 5), 1000.0, "Ventas"),
            LedgerRecord::new(date(2025, 2, 5), 1000.0, "Ventas"),
            LedgerRecord::new(date(2025, 3, 5), 1000.0, "Ventas"),
        ];

        let metrics = cashflow_metrics(
            &three_months_of_expenses(),
            &inflows,
            &cash,
            3,
            date(2025, 3, 31),
            &cfg(),
        )
        .unwrap();

        assert_eq!(metrics.burn_rate, 2000.0);
        assert_eq!(metrics.avg_monthly_inflow, 1000.0);
        assert_eq!(metrics.net_burn, 1000.0);
        assert_eq!(metrics.runway_months, 60.0);
        assert_eq!(metrics.runway_end, RunwayEnd::Date(date(2030, 3, 31)));
        assert_eq!(metrics.categories.len(), 1);
    }
}
