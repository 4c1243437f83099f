//! ledger-rpc
//!
//! JSON-RPC 2.0 server exposing the ledger engine's account, transfer,
//! escrow, QR, and query operations.
//!
//! Namespace: "ledger". See `api::LedgerApi` for the full method list.

pub mod api;
pub mod server;
pub mod types;

pub use api::LedgerApiServer;
pub use server::{RpcServer, RpcServerState};
