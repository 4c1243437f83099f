use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use ledger_core::{
    Account, EscrowTransaction, LedgerError, QrPaymentRequest, ServiceProvider,
    ServiceProviderTransaction, TransactionEntry, TransferRequest, TransferResponse,
};
use ledger_store::{EscrowCoordinator, EscrowRequestEntry, QrFlow, StateDb, TransferEngine, TransferEntry};

use crate::api::LedgerApiServer;
use crate::types::{
    CreateAccountParams, EscrowRequestParams, GenerateQrPaymentParams, GetAllTransactionsParams,
    PagedLedgerEntries, QueryProviderTransactionsParams,
};

/// `-32602`: invalid params (bad input, not-found, business-rule failure).
fn invalid_params(e: impl std::fmt::Display) -> ErrorObject<'static> {
    ErrorObject::owned(-32602, e.to_string(), None::<()>)
}

/// `-32603`: internal error (storage/serialization failures).
fn internal_err(e: impl std::fmt::Display) -> ErrorObject<'static> {
    ErrorObject::owned(-32603, e.to_string(), None::<()>)
}

/// `-32000`: fatal/operator-alert band, reserved for
/// `LedgerError::UnrecoverableInconsistency` (spec.md §6).
fn fatal_err(e: impl std::fmt::Display) -> ErrorObject<'static> {
    ErrorObject::owned(-32000, e.to_string(), None::<()>)
}

fn map_ledger_error(e: LedgerError) -> ErrorObject<'static> {
    match &e {
        LedgerError::UnrecoverableInconsistency { .. } => fatal_err(e),
        LedgerError::Storage(_) | LedgerError::Serialization(_) => internal_err(e),
        _ => invalid_params(e),
    }
}

/// Shared state passed to the RPC server: the storage layer plus the three
/// business-logic coordinators built on top of it.
pub struct RpcServerState {
    pub db: Arc<StateDb>,
    pub transfer: TransferEngine,
    pub escrow: Arc<EscrowCoordinator>,
    pub qr: QrFlow,
    /// Fallback page size for callers that omit their own `limit`/`page_size`,
    /// overriding `ledger_core::DEFAULT_QUERY_LIMIT`. Set from `--query-page-size`.
    pub default_query_limit: u32,
}

impl RpcServerState {
    pub fn new(
        db: Arc<StateDb>,
        transfer: TransferEngine,
        escrow: Arc<EscrowCoordinator>,
        qr: QrFlow,
        default_query_limit: u32,
    ) -> Self {
        Self {
            db,
            transfer,
            escrow,
            qr,
            default_query_limit,
        }
    }
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr` with permissive CORS headers.
    /// Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any);

        let server = Server::builder()
            .set_http_middleware(tower::ServiceBuilder::new().layer(cors))
            .build(addr)
            .await?;

        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl LedgerApiServer for RpcServer {
    async fn create_account(&self, params: CreateAccountParams) -> RpcResult<Account> {
        let tenant = ledger_core::normalize_tenant(&params.tenant_id);
        let amount = ledger_core::round_amount(params.initial_amount.unwrap_or(ledger_core::Amount::ZERO));
        let account = Account::new(
            tenant,
            params.account_id,
            amount,
            ledger_core::CURRENCY.to_string(),
            ledger_core::unix_now(),
        );
        self.state
            .db
            .create_account(&account)
            .map_err(map_ledger_error)?;
        Ok(account)
    }

    async fn get_account(&self, tenant_id: String, account_id: String) -> RpcResult<Option<Account>> {
        let tenant = ledger_core::normalize_tenant(&tenant_id);
        self.state
            .db
            .get_account(&tenant, &account_id)
            .map_err(map_ledger_error)
    }

    async fn inquire_balance(&self, tenant_id: String, account_id: String) -> RpcResult<String> {
        let tenant = ledger_core::normalize_tenant(&tenant_id);
        let account = self
            .state
            .db
            .get_account(&tenant, &account_id)
            .map_err(map_ledger_error)?
            .ok_or_else(|| invalid_params(LedgerError::UserNotFound { tenant, account: account_id }))?;
        Ok(account.amount.to_string())
    }

    async fn transfer(&self, request: TransferRequest) -> RpcResult<TransferResponse> {
        let entry = TransferEntry::within_tenant(
            &request.tenant_id,
            request.from_account,
            request.to_account,
            request.amount,
            request.initiator_uuid,
        );
        let entry = TransferEntry {
            signed_uuid: request.signed_uuid,
            comment: request.comment,
            ..entry
        };
        self.state.transfer.transfer(entry).map_err(map_ledger_error)
    }

    async fn escrow_request(&self, params: EscrowRequestParams) -> RpcResult<EscrowTransaction> {
        let entry = EscrowRequestEntry {
            from_account: params.from_account,
            from_tenant_id: params.from_tenant_id,
            to_account: params.to_account,
            to_tenant_id: params.to_tenant_id,
            amount: params.amount,
            initiator_uuid: params.initiator_uuid,
            cashout_provider: params.cashout_provider,
            service_provider: params.service_provider,
            beneficiary: params.beneficiary,
            comment: params.comment,
            signed_uuid: params.signed_uuid,
        };
        self.state
            .escrow
            .escrow_request(entry)
            .await
            .map_err(map_ledger_error)
    }

    async fn get_escrow_transaction(&self, initiator_uuid: String) -> RpcResult<Option<EscrowTransaction>> {
        self.state
            .escrow
            .is_duplicate(&initiator_uuid)
            .map_err(map_ledger_error)
    }

    async fn generate_qr_payment(&self, params: GenerateQrPaymentParams) -> RpcResult<QrPaymentRequest> {
        self.state
            .qr
            .generate_qr_payment(&params.tenant_id, &params.account_id, params.amount)
            .map_err(map_ledger_error)
    }

    async fn inquire_qr_payment(&self, tenant_id: String, payment_id: String) -> RpcResult<QrPaymentRequest> {
        self.state
            .qr
            .inquire_qr_payment(&tenant_id, &payment_id)
            .map_err(map_ledger_error)
    }

    async fn perform_qr_payment(
        &self,
        tenant_id: String,
        payment_id: String,
        payer_account: String,
    ) -> RpcResult<TransferResponse> {
        self.state
            .qr
            .perform_qr_payment(&tenant_id, &payment_id, &payer_account)
            .map_err(map_ledger_error)
    }

    async fn get_qr_payments_for_user(
        &self,
        tenant_id: String,
        creator_account_id: String,
    ) -> RpcResult<Vec<QrPaymentRequest>> {
        self.state
            .qr
            .get_all_qr_payments_for_user(&tenant_id, &creator_account_id)
            .map_err(map_ledger_error)
    }

    async fn get_transactions(
        &self,
        account: String,
        limit: u32,
        cursor: Option<String>,
    ) -> RpcResult<PagedLedgerEntries> {
        let cursor_bytes = cursor
            .map(|c| hex::decode(c).map_err(invalid_params))
            .transpose()?;
        let (entries, next_cursor) = ledger_store::get_transactions(&self.state.db, &account, limit, cursor_bytes)
            .map_err(map_ledger_error)?;
        Ok(PagedLedgerEntries {
            entries,
            cursor: next_cursor.map(hex::encode),
        })
    }

    async fn get_detailed_transactions(&self, account: String, limit: u32) -> RpcResult<Vec<TransactionEntry>> {
        ledger_store::get_detailed_transactions(&self.state.db, &account, limit).map_err(map_ledger_error)
    }

    async fn get_all_transactions(&self, params: GetAllTransactionsParams) -> RpcResult<Vec<TransactionEntry>> {
        let filter = ledger_store::TransactionFilter {
            account: params.account,
            status: params.status,
            from_date: params.from_date,
            to_date: params.to_date,
            limit: params.limit.or(Some(self.state.default_query_limit)),
        };
        ledger_store::get_all_transactions(&self.state.db, &params.tenant_id, filter).map_err(map_ledger_error)
    }

    async fn list_pending_reconciliation(&self, tenant_id: String, limit: u32) -> RpcResult<Vec<TransactionEntry>> {
        ledger_store::list_pending_transaction_entries(&self.state.db, &tenant_id, limit).map_err(map_ledger_error)
    }

    async fn query_service_provider_transactions(
        &self,
        params: QueryProviderTransactionsParams,
    ) -> RpcResult<Vec<ServiceProviderTransaction>> {
        ledger_store::query_service_provider_transactions(
            &self.state.db,
            &params.service_provider,
            params.start_date.as_deref(),
            params.end_date.as_deref(),
            params.page_size.or(Some(self.state.default_query_limit)),
        )
        .map_err(map_ledger_error)
    }

    async fn register_service_provider(&self, provider: ServiceProvider) -> RpcResult<()> {
        self.state.db.create_provider(&provider).map_err(map_ledger_error)
    }

    async fn get_service_provider(&self, email: String) -> RpcResult<Option<ServiceProvider>> {
        self.state.db.get_provider(&email).map_err(map_ledger_error)
    }
}

