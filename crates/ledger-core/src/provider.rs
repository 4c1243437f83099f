//! Tenant (`ServiceProvider`) registration: webhook endpoint + signing key.

use serde::{Deserialize, Serialize};

/// A tenant registration. `email` is the primary key; uniqueness is
/// enforced on create.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub email: String,
    pub tenant_id: String,
    pub escrow_account: String,
    pub webhook_url: String,
    /// Base64-encoded PKIX RSA public key used to verify outbound webhook
    /// signatures.
    pub webhook_signing_key: String,
    pub currency: String,
    /// Unix seconds of last access. Opaque to the engine; callers update it
    /// via `put_provider` when they choose to.
    pub last_accessed: i64,
}

/// A single webhook delivery attempt, persisted for audit and for
/// tenant-driven query (spec §4.4 point 5, §4.6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceProviderTransaction {
    pub service_provider: String,
    /// Unix seconds; part of the composite key and the date-range index.
    pub transaction_date: i64,
    pub transaction_id: String,
    pub initiator_uuid: String,
    pub url: String,
    pub status_code: Option<u16>,
    pub success: bool,
    pub error: Option<String>,
}
