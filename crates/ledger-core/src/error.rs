use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    // ── Input validation ─────────────────────────────────────────────────────
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("from_account and to_account must both be non-empty")]
    MissingAccount,

    // ── Account lookup ───────────────────────────────────────────────────────
    #[error("account not found: tenant={tenant} account={account}")]
    UserNotFound { tenant: String, account: String },

    #[error("account already exists: tenant={tenant} account={account}")]
    AccountExists { tenant: String, account: String },

    // ── Transfer engine ──────────────────────────────────────────────────────
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: String, have: String },

    #[error("debit leg failed for transaction {transaction_id}: {detail}")]
    DebitFailed {
        transaction_id: String,
        detail: String,
    },

    #[error("credit leg failed for transaction {transaction_id} (rollback succeeded): {detail}")]
    CreditFailed {
        transaction_id: String,
        detail: String,
    },

    /// Fatal: the compensating rollback after a failed credit leg itself
    /// failed. The sender's balance is now inconsistent with its ledger
    /// postings. An operator must reconcile by hand; the engine does not
    /// abort the process (see DESIGN.md for why this is a `Result`, not a
    /// `panic!`, despite the source design's literal panic on this path).
    #[error(
        "unrecoverable inconsistency: rollback of debit failed for initiator {initiator_uuid}: {detail}"
    )]
    UnrecoverableInconsistency {
        initiator_uuid: String,
        detail: String,
    },

    // ── Escrow coordinator ────────────────────────────────────────────────────
    #[error("escrow transaction not found for initiator {0}")]
    EscrowTransactionNotFound(String),

    #[error("escrow transaction {0} is in a terminal state and cannot be re-released")]
    EscrowAlreadyTerminal(String),

    // ── QR collection flow ───────────────────────────────────────────────────
    #[error("QR payment not found: tenant={tenant} payment={payment_id}")]
    PaymentNotFound { tenant: String, payment_id: String },

    #[error("QR payment {payment_id} is not in the expected state (current: {current})")]
    InvalidState {
        payment_id: String,
        current: String,
    },

    // ── Service provider registry ─────────────────────────────────────────────
    #[error("service provider not found: {0}")]
    ProviderNotFound(String),

    #[error("service provider already registered: {0}")]
    ProviderAlreadyRegistered(String),

    // ── Webhook signing ───────────────────────────────────────────────────────
    #[error("webhook signature failed: {0}")]
    SignatureFailed(String),

    // ── Serialization / storage ───────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    // ── General ───────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl LedgerError {
    /// The stable response code carried in a `TransferResponse`, where
    /// applicable (see spec §6 "Codes (stable identifiers, not free text)").
    pub fn response_code(&self) -> Option<crate::types::ResponseCode> {
        use crate::types::ResponseCode;
        match self {
            LedgerError::InvalidAmount | LedgerError::MissingAccount => {
                Some(ResponseCode::InvalidAmount)
            }
            LedgerError::UserNotFound { .. } => Some(ResponseCode::UserNotFound),
            LedgerError::InsufficientBalance { .. } => Some(ResponseCode::InsufficientBalance),
            LedgerError::DebitFailed { .. } => Some(ResponseCode::DebitFailed),
            LedgerError::CreditFailed { .. } => Some(ResponseCode::CreditFailed),
            _ => None,
        }
    }
}
