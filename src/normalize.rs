//! Ingestion-time normalization of raw record labels.
//!
//! Source files mix accented and unaccented spellings ("negociación" vs
//! "negociacion"), inconsistent casing, stray whitespace around client names,
//! and booleans serialized as the strings "True"/"False". Everything is folded
//! exactly once here, at the boundary where raw records become typed ones;
//! comparison sites downstream never re-normalize.

use crate::error::{MetricsError, Result};
use crate::schema::{BillingFrequency, ContractStatus, PaymentStatus, RevenueType};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Lowercases, trims, and strips Spanish diacritics so that raw labels can be
/// matched against a single canonical spelling.
pub fn fold_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

pub fn parse_contract_status(raw: &str) -> Result<ContractStatus> {
    match fold_key(raw).as_str() {
        "activo" | "active" => Ok(ContractStatus::Active),
        "inactivo" | "inactive" => Ok(ContractStatus::Inactive),
        "negociacion" | "negotiation" => Ok(ContractStatus::Negotiation),
        _ => Err(MetricsError::UnknownLabel {
            field: "contract status",
            value: raw.to_string(),
        }),
    }
}

pub fn parse_billing_frequency(raw: &str) -> Result<BillingFrequency> {
    match fold_key(raw).as_str() {
        "mensual" | "monthly" => Ok(BillingFrequency::Monthly),
        "trimestral" | "quarterly" => Ok(BillingFrequency::Quarterly),
        "anual" | "annual" | "yearly" => Ok(BillingFrequency::Annual),
        _ => Err(MetricsError::UnknownLabel {
            field: "billing frequency",
            value: raw.to_string(),
        }),
    }
}

pub fn parse_revenue_type(raw: &str) -> Result<RevenueType> {
    match fold_key(raw).as_str() {
        "recurring_license" | "licencia recurrente" | "licencia" => Ok(RevenueType::RecurringLicense),
        "setup_fee" | "setup" | "implantacion" => Ok(RevenueType::SetupFee),
        _ => Err(MetricsError::UnknownLabel {
            field: "revenue type",
            value: raw.to_string(),
        }),
    }
}

pub fn parse_payment_status(raw: &str) -> Result<PaymentStatus> {
    match fold_key(raw).as_str() {
        "paid" | "cobrada" | "pagada" => Ok(PaymentStatus::Paid),
        "pending" | "pendiente" => Ok(PaymentStatus::Pending),
        _ => Err(MetricsError::UnknownLabel {
            field: "payment status",
            value: raw.to_string(),
        }),
    }
}

/// Accepts literal JSON booleans as well as the string forms "True"/"False"
/// that some exports produce.
pub fn coerce_bool(raw: &str) -> Result<bool> {
    match fold_key(raw).as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(MetricsError::UnknownLabel {
            field: "boolean",
            value: raw.to_string(),
        }),
    }
}

/// Serde helper for boolean-like fields: `#[serde(deserialize_with = "de_loose_bool")]`.
pub fn de_loose_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Text(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Text(s) => coerce_bool(&s).map_err(serde::de::Error::custom),
    }
}

/// Deployment-specific normalization tables. The alias and synonym sets are
/// tied to the concrete client base and chart of expense labels, so they are
/// loaded as configuration data alongside the record files rather than
/// hardcoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Invoicing-system client name -> canonical contract client id.
    /// Keys are matched after folding, so accent and case variants collapse.
    #[serde(default)]
    pub client_aliases: BTreeMap<String, String>,

    /// Expense subcategory spelling variants -> canonical label.
    #[serde(default)]
    pub category_synonyms: BTreeMap<String, String>,

    /// Expense categories excluded from all operating metrics.
    #[serde(default = "default_financing_expense_categories")]
    pub financing_expense_categories: BTreeSet<String>,

    /// Inflow categories (grants, loans, equity) excluded from operating inflow.
    #[serde(default = "default_financing_inflow_categories")]
    pub financing_inflow_categories: BTreeSet<String>,

    /// Clients with a contract row but no genuine recurring billing; skipped
    /// by the forecast engine.
    #[serde(default)]
    pub forecast_excluded_clients: BTreeSet<String>,
}

fn default_financing_expense_categories() -> BTreeSet<String> {
    ["financiacion"].iter().map(|s| s.to_string()).collect()
}

fn default_financing_inflow_categories() -> BTreeSet<String> {
    ["financiacion", "prestamo", "subvencion", "ampliacion de capital"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl NormalizerConfig {
    pub fn with_defaults() -> Self {
        Self {
            financing_expense_categories: default_financing_expense_categories(),
            financing_inflow_categories: default_financing_inflow_categories(),
            ..Default::default()
        }
    }

    /// Trims and de-aliases a customer name into the canonical grouping key.
    /// Untrimmed names silently fragment one customer into several buckets,
    /// so every grouping site must go through this.
    pub fn normalize_client(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let folded = fold_key(trimmed);
        for (alias, canonical) in &self.client_aliases {
            if fold_key(alias) == folded {
                return canonical.clone();
            }
        }
        trimmed.to_string()
    }

    /// Collapses spelling/casing variants of an expense subcategory.
    pub fn canonical_category(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let folded = fold_key(trimmed);
        for (variant, canonical) in &self.category_synonyms {
            if fold_key(variant) == folded {
                return canonical.clone();
            }
        }
        trimmed.to_string()
    }

    pub fn is_financing_expense(&self, category: &str) -> bool {
        self.financing_expense_categories.contains(&fold_key(category))
    }

    pub fn is_financing_inflow(&self, category: &str) -> bool {
        self.financing_inflow_categories.contains(&fold_key(category))
    }

    pub fn is_excluded_client(&self, client_id: &str) -> bool {
        let folded = fold_key(client_id);
        self.forecast_excluded_clients
            .iter()
            .any(|c| fold_key(c) == folded)
    }
}
