//! Persisted state and business logic for the ledger engine (spec.md §4).
//!
//! `db` is the sled-backed storage layer; everything else is a thin layer
//! of business rules over it. Nothing here talks JSON-RPC — that is
//! `ledger-rpc`'s job.

pub mod db;
pub mod escrow;
pub mod qr;
pub mod query;
pub mod transfer;
pub mod webhook;

pub use db::StateDb;
pub use escrow::{EscrowCoordinator, EscrowRequestEntry, ReleaseEvent, ESCROW_ACCOUNT, ESCROW_TENANT};
pub use qr::QrFlow;
pub use query::{get_all_transactions, get_detailed_transactions, get_transactions, list_pending_transaction_entries, query_service_provider_transactions, TransactionFilter};
pub use transfer::{TransferEngine, TransferEntry};
pub use webhook::{mask_account, EscrowTransactionWebhookPayload, WebhookDispatcher};
