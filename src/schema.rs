use crate::amount::SignedAmount;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RevenueType {
    #[schemars(description = "Recurring license/subscription billing; counts toward MRR and forecast")]
    RecurringLicense,

    #[schemars(description = "One-time setup/onboarding fee; never counts toward recurring revenue")]
    SetupFee,
}

impl RevenueType {
    pub fn category(self) -> RevenueCategory {
        match self {
            RevenueType::RecurringLicense => RevenueCategory::Recurring,
            RevenueType::SetupFee => RevenueCategory::NonRecurring,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RevenueType::RecurringLicense => "recurring_license",
            RevenueType::SetupFee => "setup_fee",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RevenueCategory {
    Recurring,
    NonRecurring,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Pending,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Inactive,
    Negotiation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BillingFrequency {
    Monthly,
    Quarterly,
    Annual,
}

impl BillingFrequency {
    /// Number of months covered by one invoice at this frequency.
    pub fn months_per_period(self) -> f64 {
        match self {
            BillingFrequency::Monthly => 1.0,
            BillingFrequency::Quarterly => 3.0,
            BillingFrequency::Annual => 12.0,
        }
    }
}

/// The author-supplied invoice fields, before derivation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InvoiceDraft {
    #[schemars(description = "Invoice identifier, e.g. 'FACT12025'. Immutable once created.")]
    pub id: String,

    #[schemars(description = "Issue date in ISO YYYY-MM-DD format")]
    pub issue_date: String,

    #[schemars(description = "Customer name as entered in the invoicing system")]
    pub client: String,

    #[schemars(description = "Free-text billing concept")]
    pub concept: String,

    pub revenue_type: RevenueType,

    pub net_amount: f64,

    #[schemars(description = "Gross amount including tax; expected to be >= net_amount")]
    pub total_amount: f64,

    pub status: PaymentStatus,

    #[schemars(description = "Payment date in ISO YYYY-MM-DD; present iff status is paid")]
    pub payment_date: Option<String>,
}

/// A fully derived invoice. Every field beyond the draft is computed by the
/// enrichment engine and never author-supplied; edits go through full
/// re-derivation so these stay internally consistent.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Invoice {
    pub id: String,
    pub issue_date: NaiveDate,
    pub client: String,
    pub concept: String,
    pub revenue_type: RevenueType,
    pub net_amount: f64,
    pub total_amount: f64,
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,

    pub issue_year: i32,
    pub issue_month: u32,
    pub issue_month_start: NaiveDate,
    #[schemars(description = "Fiscal quarter label, e.g. '2025Q1'")]
    pub fiscal_quarter: String,
    pub payment_year: Option<i32>,
    pub payment_month: Option<u32>,
    pub payment_month_start: Option<NaiveDate>,
    #[schemars(description = "Whole days between issue and payment; null while unpaid")]
    pub days_to_pay: Option<i64>,
    pub revenue_type_label: String,
    pub revenue_category: RevenueCategory,
    pub recurring: bool,
    pub tax_amount: f64,
    #[schemars(description = "tax_amount / net_amount, 0 when net_amount is 0")]
    pub implied_tax_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Contract {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub product: String,
    pub status: ContractStatus,
    pub base_arr: f64,
    pub current_price_annual: f64,
    pub current_mrr: f64,
    pub currency: String,
    pub setup_fee: f64,
    #[schemars(description = "Billing cadence; treated as monthly when unspecified")]
    pub billing_frequency: Option<BillingFrequency>,
    pub start_date: NaiveDate,
    #[schemars(description = "End date; null means indefinite")]
    pub end_date: Option<NaiveDate>,
    pub notice_period_months: u32,
    #[serde(deserialize_with = "crate::normalize::de_loose_bool")]
    pub ipc_applies: bool,
    pub ipc_frequency: Option<String>,
    pub ipc_month: Option<u32>,
    pub account_owner: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContractEventKind {
    NewBusiness,
    Expansion,
    Downgrade,
    Cancellation,
}

/// A point-in-time change to a contract's commercial terms. The ARR delta is
/// stored as a positive magnitude; [`ContractEvent::signed_arr_delta`] applies
/// the sign implied by the event kind.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContractEvent {
    pub contract_id: String,
    pub client_id: String,
    pub date: NaiveDate,
    pub kind: ContractEventKind,
    #[schemars(description = "ARR delta magnitude in EUR, always stored positive")]
    pub arr_delta: f64,
}

impl ContractEvent {
    pub fn signed_arr_delta(&self) -> f64 {
        match self.kind {
            ContractEventKind::NewBusiness | ContractEventKind::Expansion => self.arr_delta,
            ContractEventKind::Downgrade | ContractEventKind::Cancellation => -self.arr_delta,
        }
    }
}

/// A bank-ledger row: expense or inflow, depending on the amount's sign.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LedgerRecord {
    pub date: NaiveDate,
    pub amount: SignedAmount,
    pub category: String,
}

impl LedgerRecord {
    pub fn new(date: NaiveDate, amount: f64, category: impl Into<String>) -> Self {
        Self {
            date,
            amount: SignedAmount::new(amount),
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BalancePoint {
    #[schemars(description = "Month key in YYYY-MM format")]
    pub month: String,
    pub balance: f64,
}

/// Current cash position plus its monthly history; externally supplied and
/// read-only to the engines.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CashBalance {
    pub current: f64,
    pub history: Vec<BalancePoint>,
}

/// One point of the precomputed MRR/ARR trend series, consumed as-is.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MrrPoint {
    #[schemars(description = "Month key in YYYY-MM format")]
    pub month: String,
    pub mrr_approx: f64,
    pub arr_approx: f64,
}

/// The full parsed file set handed to the report collectors. The surrounding
/// application owns reading and validating the flat CSV/JSON store; the
/// engines only ever see these typed collections.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Dataset {
    pub invoices: Vec<Invoice>,
    pub contracts: Vec<Contract>,
    pub contract_events: Vec<ContractEvent>,
    pub expenses: Vec<LedgerRecord>,
    pub inflows: Vec<LedgerRecord>,
    pub cash_balance: CashBalance,
    pub mrr_series: Vec<MrrPoint>,
}

impl Dataset {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Dataset)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
