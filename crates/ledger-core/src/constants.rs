//! ─── Ledger engine constants ─────────────────────────────────────────────
//!
//! Tenant/table naming and default-window constants shared across the
//! store, RPC, and node crates.

// ── Tenant normalization ──────────────────────────────────────────────────────

/// Sentinel meaning "default tenant". An empty tenant argument at any entry
/// point is rewritten to this literal before being used as a key, preserving
/// compatibility with an earlier single-tenant schema.
pub const DEFAULT_TENANT: &str = "nil";

/// Normalize a tenant argument: empty string becomes [`DEFAULT_TENANT`].
/// This is the single place the substitution happens — never inline it.
pub fn normalize_tenant(tenant: &str) -> String {
    if tenant.is_empty() {
        DEFAULT_TENANT.to_string()
    } else {
        tenant.to_string()
    }
}

// ── Escrow ─────────────────────────────────────────────────────────────────────

/// System-owned escrow account. Every cross-tenant transfer parks funds here
/// before release; this is the hot key of the system (see design notes).
pub const ESCROW_ACCOUNT: &str = "NIL_ESCROW_ACCOUNT";

/// Tenant that owns [`ESCROW_ACCOUNT`].
pub const ESCROW_TENANT: &str = "ESCROW_TENANT";

/// `CashoutProvider` value meaning "release locally" rather than handing off
/// to a named external provider.
pub const CASHOUT_PROVIDER_LOCAL: &str = "nil";

// ── Currency ───────────────────────────────────────────────────────────────────

/// Fixed currency tag carried on every account/transfer in the current
/// deployment. A single currency tag is carried but unused (no conversion).
pub const CURRENCY: &str = "SDG";

// ── Pagination / query windows ──────────────────────────────────────────────────

/// Default page size for `GetAllTransactions` when unspecified.
pub const DEFAULT_QUERY_LIMIT: u32 = 25;

/// Default lookback window for `QueryServiceProviderTransactions` when the
/// caller omits a start date: "last 30 days".
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

// ── Persisted table names (§6 "Persisted state layout") ─────────────────────────

pub const TABLE_ACCOUNTS: &str = "NilUsers";
pub const TABLE_LEDGER: &str = "LedgerTable";
pub const TABLE_TRANSACTIONS: &str = "TransactionsTable";
pub const TABLE_TRANSACTIONS_FROM_INDEX: &str = "FromAccountIndex";
pub const TABLE_TRANSACTIONS_TO_INDEX: &str = "ToAccountIndex";
pub const TABLE_ESCROW: &str = "EscrowTransactions";
pub const TABLE_ESCROW_FROM_TENANT_INDEX: &str = "FromTenantIDIndex";
pub const TABLE_SERVICE_PROVIDERS: &str = "ServiceProviders";
pub const TABLE_SERVICE_PROVIDER_TRANSACTIONS: &str = "ServiceProviderTransactions";
pub const TABLE_QR_PAYMENTS: &str = "QRPaymentsTable";
pub const TABLE_QR_PAYMENTS_CREATOR_INDEX: &str = "CreatorAccountIDIndex";

// ── Webhook signature wire format ────────────────────────────────────────────────

/// Header carrying the base64(RSA-SHA256(InitiatorUUID)) signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tenant_normalizes_to_nil() {
        assert_eq!(normalize_tenant(""), DEFAULT_TENANT);
    }

    #[test]
    fn non_empty_tenant_passes_through() {
        assert_eq!(normalize_tenant("acme"), "acme");
    }
}
