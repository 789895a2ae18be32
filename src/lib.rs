//! # Financial Metrics Engine
//!
//! A library for deriving SaaS financial KPIs from raw transactional records:
//! invoices, contracts, bank-ledger movements, and cash balances in; MRR/ARR,
//! burn rate, runway, DSO, and recurring-revenue forecasts out.
//!
//! ## Core Concepts
//!
//! - **Enrichment**: the 9 author-supplied invoice fields deterministically
//!   yield 13 derived ones (fiscal quarter, payment lag, recurring
//!   classification, implied tax rate); edits always re-derive everything.
//! - **Sign discipline**: ledger amounts keep their bank-statement sign
//!   through every aggregation step; magnitudes appear only at the display
//!   boundary.
//! - **Normalization-once**: accent/case folding, client aliasing, and
//!   category synonyms are applied at ingestion, never ad hoc downstream.
//! - **Pure engines**: every metric is a deterministic function of its input
//!   collections and a reference date; no I/O, no hidden state, concurrent
//!   invocation needs no coordination.
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_metrics_engine::*;
//! use chrono::NaiveDate;
//!
//! let draft = InvoiceDraft {
//!     id: "FACT12025".to_string(),
//!     issue_date: "2025-01-10".to_string(),
//!     client: "ACME Corp".to_string(),
//!     concept: "Monthly license".to_string(),
//!     revenue_type: RevenueType::RecurringLicense,
//!     net_amount: 1000.0,
//!     total_amount: 1210.0,
//!     status: PaymentStatus::Paid,
//!     payment_date: Some("2025-01-25".to_string()),
//! };
//!
//! let invoice = enrich(&draft)?;
//! assert_eq!(invoice.fiscal_quarter, "2025Q1");
//! assert_eq!(invoice.days_to_pay, Some(15));
//!
//! let snapshot = collect_report(
//!     &dataset,
//!     NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
//!     6,
//!     &NormalizerConfig::with_defaults(),
//! )?;
//! ```

pub mod amount;
pub mod cashflow;
pub mod enrich;
pub mod error;
pub mod forecast;
pub mod normalize;
pub mod report;
pub mod schema;
pub mod store;
pub mod utils;

pub use amount::SignedAmount;
pub use cashflow::{
    avg_monthly_inflow, burn_rate, cashflow_chart_series, cashflow_metrics, expenses_by_category,
    monthly_buckets, net_burn, runway_end_date, runway_months, CashflowMetrics, CashflowPoint,
    CategoryShare, MonthlyBucket, Runway, RunwayEnd,
};
pub use enrich::{enrich, quarter_label, update, InvoiceEdit};
pub use error::{MetricsError, Result};
pub use forecast::{calculate_forecast, ClientForecast, ForecastData, MrrSource};
pub use normalize::{
    coerce_bool, fold_key, parse_billing_frequency, parse_contract_status, parse_payment_status,
    parse_revenue_type, NormalizerConfig,
};
pub use report::{
    collect_report, contract_metrics, days_sales_outstanding, monthly_revenue, revenue_metrics,
    ClientRevenue, ContractMetrics, DateBasis, ReportSnapshot, RevenueBucket, RevenueMetrics,
};
pub use schema::*;
pub use store::{StoreLock, WriteGuard};
pub use utils::{compare_invoice_ids, compare_invoice_ids_desc, month_key, parse_iso_date};
