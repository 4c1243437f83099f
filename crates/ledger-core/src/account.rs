//! The durable `(TenantID, AccountID)` row holding a balance.

use serde::{Deserialize, Serialize};

use crate::types::{Amount, Version};

/// Full state of an account row.
///
/// Invariant: an `Account` row exists for every referenced `AccountID` in a
/// transfer; the engine never creates accounts implicitly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub tenant_id: String,
    pub account_id: String,
    pub amount: Amount,
    pub currency: String,
    /// Monotonically non-decreasing optimistic-concurrency token.
    pub version: Version,
    /// Opaque profile fields — not interpreted by the engine.
    #[serde(default)]
    pub profile: AccountProfile,
}

/// Opaque account metadata. The engine never reads or validates these
/// fields; they pass through untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountProfile {
    pub full_name: Option<String>,
    pub birthday: Option<String>,
    pub mobile: Option<String>,
    pub national_id: Option<String>,
}

impl Account {
    pub fn new(tenant_id: String, account_id: String, amount: Amount, currency: String, now: i64) -> Self {
        Self {
            tenant_id,
            account_id,
            amount,
            currency,
            version: now,
            profile: AccountProfile::default(),
        }
    }
}
