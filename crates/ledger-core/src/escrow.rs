//! Escrow transaction state — the record the escrow coordinator evolves
//! through `InProgress → Completed | Failed`.

use serde::{Deserialize, Serialize};

use crate::types::{Amount, InitiatorUuid, TransactionId};

/// Explicit escrow state. `Pending` is conceptual only: the row is first
/// persisted as `InProgress`, because by the time it is written the park
/// phase has already succeeded (see [`crate::constants`] and the escrow
/// coordinator). Transitions are monotone; no transition out of a terminal
/// state (`Completed`/`Failed`) is permitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl EscrowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EscrowStatus::Completed | EscrowStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EscrowStatus::Pending => "Pending",
            EscrowStatus::InProgress => "InProgress",
            EscrowStatus::Completed => "Completed",
            EscrowStatus::Failed => "Failed",
        }
    }
}

/// Where the release leg ends up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashoutProvider {
    /// Release locally: `TransientAccount/TransientTenant → ToAccount/ToTenantID`.
    Local,
    /// Hand off to a named external cash-out provider via webhook.
    External(String),
}

impl CashoutProvider {
    pub fn from_str(s: &str) -> Self {
        if s.is_empty() || s == crate::constants::CASHOUT_PROVIDER_LOCAL {
            CashoutProvider::Local
        } else {
            CashoutProvider::External(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CashoutProvider::Local => crate::constants::CASHOUT_PROVIDER_LOCAL,
            CashoutProvider::External(name) => name,
        }
    }
}

/// Opaque recipient metadata for an external cash-out.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Beneficiary {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// **(InitiatorUUID, TransactionID)** composite key — InitiatorUUID is the
/// idempotency key, TransactionID is engine-assigned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscrowTransaction {
    pub initiator_uuid: InitiatorUuid,
    pub transaction_id: TransactionId,
    pub from_account: String,
    pub from_tenant_id: String,
    pub to_account: String,
    pub to_tenant_id: String,
    pub amount: Amount,
    /// Unix seconds.
    pub transaction_date: i64,
    /// RFC-3339 timestamp.
    pub timestamp: String,
    pub status: EscrowStatus,
    /// Escrow holding key used between phases.
    pub transient_account: String,
    pub transient_tenant: String,
    pub cashout_provider: CashoutProvider,
    /// Tenant whose webhook and escrow key apply.
    pub service_provider: String,
    pub beneficiary: Beneficiary,
    pub comment: Option<String>,
    pub signed_uuid: Option<String>,
}

impl EscrowTransaction {
    /// True once the row has reached a terminal state and must not be
    /// re-transitioned (see spec's terminal-stability property).
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
