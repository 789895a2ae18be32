//! Invoice enrichment: derives the full invoice record from the nine
//! author-supplied base fields.
//!
//! Every edit goes through full re-derivation ([`update`] merges the partial
//! edit over the existing base fields and calls [`enrich`] again), so derived
//! fields can never drift out of sync with their inputs.

use crate::error::{MetricsError, Result};
use crate::schema::{Invoice, InvoiceDraft, PaymentStatus};
use crate::utils::{first_day_of_month, parse_iso_date};
use chrono::Datelike;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `{year}Q{1..4}` with the quarter from `ceil(month/3)`.
pub fn quarter_label(year: i32, month: u32) -> String {
    format!("{}Q{}", year, month.div_ceil(3))
}

/// Derives all computed invoice fields from a validated draft.
///
/// Date strings are still parsed defensively: the upstream API owns input
/// validation, but a malformed date fails here with an error instead of
/// producing silently wrong derived months and quarters.
pub fn enrich(draft: &InvoiceDraft) -> Result<Invoice> {
    let issue_date = parse_iso_date(&draft.issue_date)?;

    let payment_date = match (&draft.status, &draft.payment_date) {
        (PaymentStatus::Paid, Some(raw)) => Some(parse_iso_date(raw)?),
        (PaymentStatus::Paid, None) => {
            return Err(MetricsError::MissingPaymentDate(draft.id.clone()))
        }
        // A pending invoice carries no payment-derived fields even if the
        // source row still has a stale date.
        (PaymentStatus::Pending, _) => None,
    };

    let days_to_pay = payment_date.map(|paid| (paid - issue_date).num_days());

    let tax_amount = draft.total_amount - draft.net_amount;
    let implied_tax_rate = if draft.net_amount == 0.0 {
        0.0
    } else {
        tax_amount / draft.net_amount
    };

    let category = draft.revenue_type.category();

    Ok(Invoice {
        id: draft.id.clone(),
        issue_date,
        client: draft.client.trim().to_string(),
        concept: draft.concept.clone(),
        revenue_type: draft.revenue_type,
        net_amount: draft.net_amount,
        total_amount: draft.total_amount,
        status: draft.status,
        payment_date,
        issue_year: issue_date.year(),
        issue_month: issue_date.month(),
        issue_month_start: first_day_of_month(issue_date),
        fiscal_quarter: quarter_label(issue_date.year(), issue_date.month()),
        payment_year: payment_date.map(|d| d.year()),
        payment_month: payment_date.map(|d| d.month()),
        payment_month_start: payment_date.map(first_day_of_month),
        days_to_pay,
        revenue_type_label: draft.revenue_type.label().to_string(),
        revenue_category: category,
        recurring: category == crate::schema::RevenueCategory::Recurring,
        tax_amount,
        implied_tax_rate,
    })
}

/// A partial edit over an existing invoice. The id is not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InvoiceEdit {
    pub issue_date: Option<String>,
    pub client: Option<String>,
    pub concept: Option<String>,
    pub revenue_type: Option<crate::schema::RevenueType>,
    pub net_amount: Option<f64>,
    pub total_amount: Option<f64>,
    pub status: Option<PaymentStatus>,
    /// `Some(None)` clears the payment date, `None` leaves it untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<Option<String>>,
}

/// Merges the supplied fields over the existing record and re-runs the full
/// derivation chain. Never recomputes partially.
pub fn update(existing: &Invoice, edit: &InvoiceEdit) -> Result<Invoice> {
    let draft = InvoiceDraft {
        id: existing.id.clone(),
        issue_date: edit
            .issue_date
            .clone()
            .unwrap_or_else(|| existing.issue_date.format("%Y-%m-%d").to_string()),
        client: edit.client.clone().unwrap_or_else(|| existing.client.clone()),
        concept: edit.concept.clone().unwrap_or_else(|| existing.concept.clone()),
        revenue_type: edit.revenue_type.unwrap_or(existing.revenue_type),
        net_amount: edit.net_amount.unwrap_or(existing.net_amount),
        total_amount: edit.total_amount.unwrap_or(existing.total_amount),
        status: edit.status.unwrap_or(existing.status),
        payment_date: match &edit.payment_date {
            Some(new_value) => new_value.clone(),
            None => existing.payment_date.map(|d| d.format("%Y-%m-%d").to_string()),
        },
    };

    enrich(&draft)
}
