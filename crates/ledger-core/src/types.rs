use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monetary amount, two fractional digits of authoritative precision.
///
/// Every write path rounds via [`round_amount`] so that a stored balance and
/// the posting amount that produced it can never diverge.
pub type Amount = Decimal;

/// Round `value` to two decimal places — the Rust equivalent of the
/// original store's `"%.2f"` write discipline.
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Optimistic-concurrency token: Unix-seconds timestamp at last mutation.
pub type Version = i64;

/// Logical tenant partition. `"nil"` is the default tenant sentinel —
/// see [`crate::constants::normalize_tenant`].
pub type TenantId = String;

/// Opaque account identifier, unique within a tenant.
pub type AccountId = String;

/// Engine-assigned transaction identifier.
pub type TransactionId = String;

/// Caller-supplied idempotency key, reused across retries.
pub type InitiatorUuid = String;

/// Generate a fresh, globally unique identifier for transaction IDs,
/// initiator UUIDs, and QR payment IDs.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current Unix-seconds timestamp, the optimistic-concurrency `Version`
/// token source (spec.md §9: "the Unix-seconds clock as the version
/// token").
pub fn unix_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_secs() as i64
}

/// One side of a balanced posting pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostingType {
    Debit,
    Credit,
}

impl fmt::Display for PostingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostingType::Debit => write!(f, "debit"),
            PostingType::Credit => write!(f, "credit"),
        }
    }
}

/// Outcome of a single `TransactionEntry` attempt. The store tolerates both
/// the integer and string wire forms on read; the string form is always
/// emitted by RPC responses (the spec's dual-wire-form note).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Success,
    FailedOrPending,
}

impl TransactionStatus {
    pub fn code(self) -> u8 {
        match self {
            TransactionStatus::Success => 0,
            TransactionStatus::FailedOrPending => 1,
        }
    }

    pub fn from_code(v: u8) -> Option<Self> {
        match v {
            0 => Some(TransactionStatus::Success),
            1 => Some(TransactionStatus::FailedOrPending),
            _ => None,
        }
    }
}

/// Stable, machine-readable response code carried in every transfer response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseCode {
    SuccessfulTransaction,
    UserNotFound,
    InsufficientBalance,
    InvalidAmount,
    DebitFailed,
    CreditFailed,
}

impl ResponseCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::SuccessfulTransaction => "successful_transaction",
            ResponseCode::UserNotFound => "user_not_found",
            ResponseCode::InsufficientBalance => "insufficient_balance",
            ResponseCode::InvalidAmount => "invalid_amount",
            ResponseCode::DebitFailed => "debit_failed",
            ResponseCode::CreditFailed => "credit_failed",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
