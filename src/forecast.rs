//! Recurring-revenue forecast: projects MRR per active client from the most
//! recent recurring invoice (or the contract's stated MRR when the client has
//! not been billed yet) and rolls the total up into horizon and fiscal-year
//! views.
//!
//! The projection is a flat run-rate: no churn or growth is modeled, so the
//! M+12 horizon is exactly twelve times the M+1 horizon. That simplification
//! is deliberate.

use crate::normalize::{fold_key, NormalizerConfig};
use crate::schema::{BillingFrequency, Contract, ContractStatus, Invoice, RevenueCategory};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MrrSource {
    /// Estimated from the client's most recent recurring invoice.
    Invoice,
    /// Fallback to the contract's stated MRR (client not billed yet).
    Contract,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientForecast {
    pub client_id: String,
    pub client_name: String,
    pub billing_frequency: BillingFrequency,
    pub mrr: f64,
    pub source: MrrSource,
    /// Share of total MRR, 0..=100.
    pub pct_of_total: f64,
    /// MRR times the months remaining in the fiscal year.
    pub fiscal_year_forecast: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastData {
    pub reference_date: NaiveDate,
    pub fiscal_year: i32,
    /// Months left in the fiscal year, current month included.
    pub months_remaining_fy: u32,
    pub total_mrr: f64,
    pub forecast_m1: f64,
    pub forecast_m3: f64,
    pub forecast_m6: f64,
    pub forecast_m12: f64,
    /// Recurring net amounts already invoiced this fiscal year.
    pub billed_ytd: f64,
    pub forecast_remaining_fy: f64,
    pub estimated_total_fy: f64,
    /// Sorted by MRR descending.
    pub clients: Vec<ClientForecast>,
}

/// Pure function of its inputs and the reference date; identical inputs
/// produce identical output.
pub fn calculate_forecast(
    contracts: &[Contract],
    invoices: &[Invoice],
    reference_date: NaiveDate,
    cfg: &NormalizerConfig,
) -> ForecastData {
    let fiscal_year = reference_date.year();
    let months_remaining_fy = 12 - reference_date.month0();

    // Recurring invoices grouped by normalized client key. The alias table
    // bridges naming drift between the invoicing and contract systems.
    let mut by_client: BTreeMap<String, Vec<&Invoice>> = BTreeMap::new();
    for invoice in invoices {
        if invoice.revenue_category != RevenueCategory::Recurring {
            continue;
        }
        let key = fold_key(&cfg.normalize_client(&invoice.client));
        by_client.entry(key).or_default().push(invoice);
    }

    let mut clients: Vec<ClientForecast> = Vec::new();

    for contract in contracts {
        if contract.status != ContractStatus::Active {
            continue;
        }
        if cfg.is_excluded_client(&contract.client_id) {
            continue;
        }

        let frequency = contract.billing_frequency.unwrap_or(BillingFrequency::Monthly);

        let latest_invoice = by_client
            .get(&fold_key(&contract.client_id))
            .and_then(|group| group.iter().max_by_key(|inv| inv.issue_date));

        let (mrr, source) = match latest_invoice {
            Some(invoice) => (
                invoice.net_amount / frequency.months_per_period(),
                MrrSource::Invoice,
            ),
            None => (contract.current_mrr, MrrSource::Contract),
        };

        clients.push(ClientForecast {
            client_id: contract.client_id.clone(),
            client_name: contract.client_name.clone(),
            billing_frequency: frequency,
            mrr,
            source,
            pct_of_total: 0.0,
            fiscal_year_forecast: mrr * months_remaining_fy as f64,
        });
    }

    let total_mrr: f64 = clients.iter().map(|c| c.mrr).sum();
    for client in &mut clients {
        client.pct_of_total = if total_mrr == 0.0 {
            0.0
        } else {
            client.mrr / total_mrr * 100.0
        };
    }

    clients.sort_by(|a, b| b.mrr.partial_cmp(&a.mrr).unwrap_or(std::cmp::Ordering::Equal));

    // Billed YTD counts every recurring invoice issued this fiscal year,
    // independent of the per-client projection above.
    let billed_ytd: f64 = invoices
        .iter()
        .filter(|inv| {
            inv.revenue_category == RevenueCategory::Recurring && inv.issue_year == fiscal_year
        })
        .map(|inv| inv.net_amount)
        .sum();

    let forecast_remaining_fy = total_mrr * months_remaining_fy as f64;

    ForecastData {
        reference_date,
        fiscal_year,
        months_remaining_fy,
        total_mrr,
        forecast_m1: total_mrr,
        forecast_m3: total_mrr * 3.0,
        forecast_m6: total_mrr * 6.0,
        forecast_m12: total_mrr * 12.0,
        billed_ytd,
        forecast_remaining_fy,
        estimated_total_fy: billed_ytd + forecast_remaining_fy,
        clients,
    }
}
