use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use ledger_core::{
    Account, EscrowTransaction, QrPaymentRequest, ServiceProvider, ServiceProviderTransaction,
    TransactionEntry, TransferRequest, TransferResponse,
};

use crate::types::{
    CreateAccountParams, EscrowRequestParams, GenerateQrPaymentParams, GetAllTransactionsParams,
    PagedLedgerEntries, QueryProviderTransactionsParams,
};

/// Ledger engine JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "ledger_" via `namespace = "ledger"`.
#[rpc(server, namespace = "ledger")]
pub trait LedgerApi {
    /// Create a brand-new account. Fails with `-32602` if it already exists.
    #[method(name = "createAccount")]
    async fn create_account(&self, params: CreateAccountParams) -> RpcResult<Account>;

    /// Fetch an account's full state.
    #[method(name = "getAccount")]
    async fn get_account(&self, tenant_id: String, account_id: String) -> RpcResult<Option<Account>>;

    /// Fetch just an account's balance.
    #[method(name = "inquireBalance")]
    async fn inquire_balance(&self, tenant_id: String, account_id: String) -> RpcResult<String>;

    /// Run a single-tenant transfer (spec.md §4.2). Business-level failures
    /// (insufficient balance, unknown account, ...) come back as a
    /// successful call whose `TransferResponse.status == "error"`; only an
    /// `UnrecoverableInconsistency` surfaces as a `-32000` RPC error.
    #[method(name = "transfer")]
    async fn transfer(&self, request: TransferRequest) -> RpcResult<TransferResponse>;

    /// Park funds in escrow toward a (possibly external) beneficiary
    /// (spec.md §4.3). Idempotent on `initiator_uuid`.
    #[method(name = "escrowRequest")]
    async fn escrow_request(&self, params: EscrowRequestParams) -> RpcResult<EscrowTransaction>;

    /// Look up an escrow transaction by its idempotency key.
    #[method(name = "getEscrowTransaction")]
    async fn get_escrow_transaction(&self, initiator_uuid: String) -> RpcResult<Option<EscrowTransaction>>;

    /// Generate a pull-payment QR request (spec.md §4.5).
    #[method(name = "generateQrPayment")]
    async fn generate_qr_payment(&self, params: GenerateQrPaymentParams) -> RpcResult<QrPaymentRequest>;

    /// Look up a QR payment request by id.
    #[method(name = "inquireQrPayment")]
    async fn inquire_qr_payment(&self, tenant_id: String, payment_id: String) -> RpcResult<QrPaymentRequest>;

    /// Settle a pending QR payment by transferring from `payer_account`.
    #[method(name = "performQrPayment")]
    async fn perform_qr_payment(
        &self,
        tenant_id: String,
        payment_id: String,
        payer_account: String,
    ) -> RpcResult<TransferResponse>;

    /// List every QR payment request created by `creator_account_id`.
    #[method(name = "getQrPaymentsForUser")]
    async fn get_qr_payments_for_user(
        &self,
        tenant_id: String,
        creator_account_id: String,
    ) -> RpcResult<Vec<QrPaymentRequest>>;

    /// Paginated scan of `LedgerEntry` postings for one account.
    #[method(name = "getTransactions")]
    async fn get_transactions(
        &self,
        account: String,
        limit: u32,
        cursor: Option<String>,
    ) -> RpcResult<PagedLedgerEntries>;

    /// Union of the sent/received `TransactionEntry` indexes for an account.
    #[method(name = "getDetailedTransactions")]
    async fn get_detailed_transactions(&self, account: String, limit: u32) -> RpcResult<Vec<TransactionEntry>>;

    /// Filtered scan over a tenant's `TransactionEntry` rows.
    #[method(name = "getAllTransactions")]
    async fn get_all_transactions(&self, params: GetAllTransactionsParams) -> RpcResult<Vec<TransactionEntry>>;

    /// Reconciliation sweep: every `TransactionEntry` still pending/failed.
    #[method(name = "listPendingReconciliation")]
    async fn list_pending_reconciliation(&self, tenant_id: String, limit: u32) -> RpcResult<Vec<TransactionEntry>>;

    /// `(ServiceProvider, TransactionDate)` range query over webhook
    /// delivery attempts.
    #[method(name = "queryServiceProviderTransactions")]
    async fn query_service_provider_transactions(
        &self,
        params: QueryProviderTransactionsParams,
    ) -> RpcResult<Vec<ServiceProviderTransaction>>;

    /// Register a new tenant. Fails with `-32602` if the email is already
    /// registered.
    #[method(name = "registerServiceProvider")]
    async fn register_service_provider(&self, provider: ServiceProvider) -> RpcResult<()>;

    /// Fetch a tenant's registration.
    #[method(name = "getServiceProvider")]
    async fn get_service_provider(&self, email: String) -> RpcResult<Option<ServiceProvider>>;
}
