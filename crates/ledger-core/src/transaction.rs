//! Transfer requests/responses and the two durable record types a transfer
//! produces: the immutable `LedgerEntry` posting and the audit
//! `TransactionEntry`.

use serde::{Deserialize, Serialize};

use crate::types::{Amount, InitiatorUuid, PostingType, ResponseCode, TransactionId, TransactionStatus};

/// Caller-supplied request to move `amount` from one account to another.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub tenant_id: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: Amount,
    /// Caller idempotency key, reused across retries.
    pub initiator_uuid: InitiatorUuid,
    /// Optional signature over `initiator_uuid` supplied by the caller.
    #[serde(default)]
    pub signed_uuid: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Payload returned by the transfer engine on success.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferResponseData {
    pub transaction_id: TransactionId,
    pub amount: Amount,
    pub currency: String,
    pub uuid: InitiatorUuid,
    pub signed_uuid: Option<String>,
}

/// Wire-level transfer response (spec §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub status: String,
    pub code: String,
    pub message: String,
    pub data: Option<TransferResponseData>,
}

impl TransferResponse {
    pub fn success(data: TransferResponseData) -> Self {
        Self {
            status: "success".to_string(),
            code: ResponseCode::SuccessfulTransaction.as_str().to_string(),
            message: "transfer completed".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: ResponseCode, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            code: code.as_str().to_string(),
            message: message.into(),
            data: None,
        }
    }
}

/// One side of a balanced posting pair. Immutable once written.
///
/// Exactly two entries share a `transaction_id`: one `Debit` on the sender,
/// one `Credit` on the receiver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub account_id: String,
    pub transaction_id: TransactionId,
    pub amount: Amount,
    pub posting_type: PostingType,
    /// Unix seconds.
    pub time: i64,
    pub tenant_id: String,
    pub initiator_uuid: InitiatorUuid,
}

/// Audit record of a transfer attempt. Written once with
/// `status = FailedOrPending` at attempt start and overwritten with
/// `status = Success` on success.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub tenant_id: String,
    pub transaction_id: TransactionId,
    pub from_account: String,
    pub to_account: String,
    pub amount: Amount,
    /// Unix seconds.
    pub transaction_date: i64,
    pub status: TransactionStatus,
    pub initiator_uuid: InitiatorUuid,
    pub comment: Option<String>,
    pub signed_uuid: Option<String>,
}
