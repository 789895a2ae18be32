use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg};

/// A ledger amount carrying its raw bank-statement sign.
///
/// Expense rows arrive negative and inflow rows positive; keeping the sign
/// inside the type means every aggregation step states explicitly whether it
/// works on raw signed values ([`SignedAmount::raw`]) or on display
/// magnitudes ([`SignedAmount::magnitude`]). Ad-hoc `abs()` calls at
/// consumer sites were the main source of sign bugs this type replaces.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SignedAmount(f64);

impl SignedAmount {
    pub fn new(raw: f64) -> Self {
        Self(raw)
    }

    /// The value as it appears in the ledger, sign included.
    pub fn raw(self) -> f64 {
        self.0
    }

    /// The display magnitude, always non-negative.
    pub fn magnitude(self) -> f64 {
        self.0.abs()
    }

    pub fn is_outflow(self) -> bool {
        self.0 < 0.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl From<f64> for SignedAmount {
    fn from(raw: f64) -> Self {
        Self(raw)
    }
}

impl Add for SignedAmount {
    type Output = SignedAmount;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for SignedAmount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Neg for SignedAmount {
    type Output = SignedAmount;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for SignedAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self(0.0), |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_queries() {
        let expense = SignedAmount::new(-1500.0);
        assert!(expense.is_outflow());
        assert_eq!(expense.raw(), -1500.0);
        assert_eq!(expense.magnitude(), 1500.0);

        let inflow = SignedAmount::new(2000.0);
        assert!(!inflow.is_outflow());
        assert_eq!(inflow.magnitude(), 2000.0);
    }

    #[test]
    fn test_sum_preserves_sign() {
        let total: SignedAmount = vec![
            SignedAmount::new(-1000.0),
            SignedAmount::new(-2000.0),
            SignedAmount::new(500.0),
        ]
        .into_iter()
        .sum();
        assert_eq!(total.raw(), -2500.0);
        assert_eq!(total.magnitude(), 2500.0);
    }

    #[test]
    fn test_serde_transparent() {
        let amount: SignedAmount = serde_json::from_str("-42.5").unwrap();
        assert_eq!(amount.raw(), -42.5);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "-42.5");
    }
}
