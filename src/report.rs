//! Report data collectors: orchestrate the metrics engines into flat snapshot
//! structures for the presentation and PDF layers, which consume them as
//! immutable view models and never compute metrics themselves.

use crate::cashflow::{cashflow_metrics, CashflowMetrics};
use crate::error::Result;
use crate::forecast::{calculate_forecast, ForecastData};
use crate::normalize::NormalizerConfig;
use crate::schema::{
    Contract, ContractEvent, ContractStatus, Dataset, Invoice, MrrPoint, PaymentStatus,
    RevenueCategory,
};
use crate::utils::month_key;
use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;

/// Which date an invoice is bucketed under: accrual (devengo) uses the issue
/// date, collection (cobro) uses the payment date and covers paid invoices
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBasis {
    Accrual,
    Collection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueBucket {
    pub month: String,
    pub total: f64,
}

/// Monthly net revenue on the chosen date basis, ascending by month.
pub fn monthly_revenue(invoices: &[Invoice], basis: DateBasis) -> Vec<RevenueBucket> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();

    for invoice in invoices {
        let bucket_date = match basis {
            DateBasis::Accrual => Some(invoice.issue_date),
            DateBasis::Collection => invoice.payment_date,
        };
        if let Some(date) = bucket_date {
            *totals.entry(month_key(date)).or_default() += invoice.net_amount;
        }
    }

    totals
        .into_iter()
        .map(|(month, total)| RevenueBucket { month, total })
        .collect()
}

/// Average days between issue and payment, over paid invoices only.
pub fn days_sales_outstanding(invoices: &[Invoice]) -> f64 {
    let lags: Vec<i64> = invoices.iter().filter_map(|inv| inv.days_to_pay).collect();
    if lags.is_empty() {
        return 0.0;
    }
    lags.iter().sum::<i64>() as f64 / lags.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRevenue {
    pub client: String,
    pub total: f64,
    /// Share of total net billed, 0..=100.
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueMetrics {
    pub total_billed: f64,
    pub total_collected: f64,
    pub total_pending: f64,
    /// Collected share of billed, 0..=100.
    pub collection_rate: f64,
    /// Recurring share of billed net, 0..=100.
    pub recurring_share: f64,
    pub dso: f64,
    /// Descending by total; keys are normalized client names.
    pub by_client: Vec<ClientRevenue>,
    pub monthly_accrual: Vec<RevenueBucket>,
    pub monthly_collection: Vec<RevenueBucket>,
}

pub fn revenue_metrics(invoices: &[Invoice], cfg: &NormalizerConfig) -> RevenueMetrics {
    let total_billed: f64 = invoices.iter().map(|inv| inv.net_amount).sum();
    let total_collected: f64 = invoices
        .iter()
        .filter(|inv| inv.status == PaymentStatus::Paid)
        .map(|inv| inv.net_amount)
        .sum();
    let recurring_billed: f64 = invoices
        .iter()
        .filter(|inv| inv.revenue_category == RevenueCategory::Recurring)
        .map(|inv| inv.net_amount)
        .sum();

    let mut client_totals: BTreeMap<String, f64> = BTreeMap::new();
    for invoice in invoices {
        *client_totals
            .entry(cfg.normalize_client(&invoice.client))
            .or_default() += invoice.net_amount;
    }

    let mut by_client: Vec<ClientRevenue> = client_totals
        .into_iter()
        .map(|(client, total)| ClientRevenue {
            client,
            total,
            percentage: if total_billed == 0.0 {
                0.0
            } else {
                total / total_billed * 100.0
            },
        })
        .collect();
    by_client.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));

    RevenueMetrics {
        total_billed,
        total_collected,
        total_pending: total_billed - total_collected,
        collection_rate: if total_billed == 0.0 {
            0.0
        } else {
            total_collected / total_billed * 100.0
        },
        recurring_share: if total_billed == 0.0 {
            0.0
        } else {
            recurring_billed / total_billed * 100.0
        },
        dso: days_sales_outstanding(invoices),
        by_client,
        monthly_accrual: monthly_revenue(invoices, DateBasis::Accrual),
        monthly_collection: monthly_revenue(invoices, DateBasis::Collection),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractMetrics {
    pub active_count: usize,
    pub inactive_count: usize,
    pub negotiation_count: usize,
    /// Annualized value of active contracts.
    pub active_arr: f64,
    pub active_mrr: f64,
    /// Annualized value of contracts still in negotiation.
    pub pipeline_arr: f64,
    /// Net ARR movement from contract events, signed by event kind.
    pub net_arr_movement: f64,
}

pub fn contract_metrics(contracts: &[Contract], events: &[ContractEvent]) -> ContractMetrics {
    let count = |status: ContractStatus| contracts.iter().filter(|c| c.status == status).count();

    let active_arr: f64 = contracts
        .iter()
        .filter(|c| c.status == ContractStatus::Active)
        .map(|c| c.current_price_annual)
        .sum();
    let active_mrr: f64 = contracts
        .iter()
        .filter(|c| c.status == ContractStatus::Active)
        .map(|c| c.current_mrr)
        .sum();
    let pipeline_arr: f64 = contracts
        .iter()
        .filter(|c| c.status == ContractStatus::Negotiation)
        .map(|c| c.current_price_annual)
        .sum();

    ContractMetrics {
        active_count: count(ContractStatus::Active),
        inactive_count: count(ContractStatus::Inactive),
        negotiation_count: count(ContractStatus::Negotiation),
        active_arr,
        active_mrr,
        pipeline_arr,
        net_arr_movement: events.iter().map(|e| e.signed_arr_delta()).sum(),
    }
}

/// The full dashboard snapshot handed to the presentation/PDF layers.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSnapshot {
    pub generated_at: NaiveDate,
    pub cashflow: CashflowMetrics,
    pub forecast: ForecastData,
    pub revenue: RevenueMetrics,
    pub contracts: ContractMetrics,
    /// Precomputed MRR/ARR trend, passed through untouched.
    pub mrr_trend: Vec<MrrPoint>,
}

/// Orchestration entry point: runs every engine over the dataset and composes
/// the flat snapshot. Pure except for logging.
pub fn collect_report(
    dataset: &Dataset,
    reference_date: NaiveDate,
    window_months: usize,
    cfg: &NormalizerConfig,
) -> Result<ReportSnapshot> {
    info!(
        "Collecting report snapshot for {} ({} invoices, {} contracts)",
        reference_date.format("%Y-%m-%d"),
        dataset.invoices.len(),
        dataset.contracts.len()
    );

    let cashflow = cashflow_metrics(
        &dataset.expenses,
        &dataset.inflows,
        &dataset.cash_balance,
        window_months,
        reference_date,
        cfg,
    )?;
    debug!(
        "Cashflow: burn {:.2}, net burn {:.2}, runway {}",
        cashflow.burn_rate, cashflow.net_burn, cashflow.runway_end
    );

    let forecast = calculate_forecast(&dataset.contracts, &dataset.invoices, reference_date, cfg);
    debug!(
        "Forecast: total MRR {:.2} across {} clients, {} months left in FY{}",
        forecast.total_mrr,
        forecast.clients.len(),
        forecast.months_remaining_fy,
        forecast.fiscal_year
    );

    Ok(ReportSnapshot {
        generated_at: reference_date,
        cashflow,
        forecast,
        revenue: revenue_metrics(&dataset.invoices, cfg),
        contracts: contract_metrics(&dataset.contracts, &dataset.contract_events),
        mrr_trend: dataset.mrr_series.clone(),
    })
}
