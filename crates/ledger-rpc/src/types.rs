//! Wire-level request/response shapes that don't already exist in
//! `ledger-core`. Where a domain type is already `Serialize`/`Deserialize`
//! (`Account`, `TransferRequest`, `TransferResponse`, `QrPaymentRequest`,
//! `EscrowTransaction`, `ServiceProvider`, ...) it is returned directly —
//! no parallel `Rpc*` shadow struct, unlike a node whose domain types
//! aren't already wire-safe.

use serde::{Deserialize, Serialize};

use ledger_core::{Amount, Beneficiary};

/// `ledger_createAccount` params.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateAccountParams {
    pub tenant_id: String,
    pub account_id: String,
    #[serde(default)]
    pub initial_amount: Option<Amount>,
}

/// `ledger_escrowRequest` params — the wire shape of
/// [`ledger_store::EscrowRequestEntry`], which itself isn't `Deserialize`
/// since it's an internal coordinator type built from validated pieces.
#[derive(Clone, Debug, Deserialize)]
pub struct EscrowRequestParams {
    pub from_account: String,
    pub from_tenant_id: String,
    pub to_account: String,
    pub to_tenant_id: String,
    pub amount: Amount,
    pub initiator_uuid: String,
    #[serde(default)]
    pub cashout_provider: String,
    pub service_provider: String,
    #[serde(default)]
    pub beneficiary: Beneficiary,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub signed_uuid: Option<String>,
}

/// `ledger_generateQrPayment` params.
#[derive(Clone, Debug, Deserialize)]
pub struct GenerateQrPaymentParams {
    pub tenant_id: String,
    pub account_id: String,
    pub amount: Amount,
}

/// `ledger_getAllTransactions` params — the filter predicate set from
/// spec.md §4.6, all optional.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GetAllTransactionsParams {
    pub tenant_id: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub to_date: Option<i64>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// `ledger_queryServiceProviderTransactions` params. `start_date`/`end_date`
/// are strings so either a Unix-seconds integer or an RFC-3339 timestamp
/// can be sent, per spec.md §4.6.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QueryProviderTransactionsParams {
    pub service_provider: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// `ledger_getTransactions` response — `cursor` is hex-encoded opaque
/// continuation state, `None` once the scan is exhausted.
#[derive(Clone, Debug, Serialize)]
pub struct PagedLedgerEntries {
    pub entries: Vec<ledger_core::LedgerEntry>,
    pub cursor: Option<String>,
}
