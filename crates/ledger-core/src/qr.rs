//! Pull-payment request: `(TenantID, PaymentID)` composite key.

use serde::{Deserialize, Serialize};

use crate::types::Amount;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QrStatus {
    Pending,
    Completed,
}

impl QrStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QrStatus::Pending => "PENDING",
            QrStatus::Completed => "COMPLETED",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QrPaymentRequest {
    pub tenant_id: String,
    pub payment_id: String,
    /// The payee account (duplicated into `to_account` at creation time,
    /// matching the source design's redundant field).
    pub account_id: String,
    pub amount: Amount,
    pub status: QrStatus,
    pub uuid: String,
    /// Unix seconds.
    pub creation_date: i64,
    pub to_account: String,
}

impl QrPaymentRequest {
    pub fn is_paid(&self) -> bool {
        self.status == QrStatus::Completed
    }
}
