//! Webhook dispatcher — spec.md §4.4.
//!
//! One outbound `POST` per `EscrowTransaction` state transition a tenant
//! needs to hear about, signed with the platform's RSA key over the
//! transaction's `InitiatorUUID` and delivered to the tenant's registered
//! `webhook_url` (falling back to a node-wide default). Every attempt,
//! success or failure, is persisted to `ServiceProviderTransactions` —
//! grounded on `sns/main.go`'s `sendWebhookNotification`, which always
//! calls `StoreLocalWebhooks` before dispatch and logs (never panics) on a
//! non-200 response.

use std::sync::Arc;

use ledger_core::{unix_now, Beneficiary, EscrowTransaction, LedgerError, ServiceProviderTransaction};
use ledger_crypto::PlatformKeyPair;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::db::StateDb;

/// Outbound wire shape of an `EscrowTransaction` notification.
///
/// `to_account` is masked (first 3 + `****` + last 4) — grounded on
/// `sns/types.go`'s `NewEscrowTransactionWrapper`, which never sends a full
/// account number to a tenant's webhook endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct EscrowTransactionWebhookPayload {
    pub transaction_id: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: ledger_core::Amount,
    pub comment: Option<String>,
    pub time: i64,
    pub status: &'static str,
    pub uuid: String,
    pub timestamp: String,
    pub signed_uuid: Option<String>,
    pub cashout_provider: String,
    pub beneficiary: Beneficiary,
    pub service_provider: String,
}

/// Mask an account number as `abc****wxyz`. Accounts shorter than 7
/// characters are returned unmasked — there is nothing safe left to hide.
pub fn mask_account(account: &str) -> String {
    if account.len() < 7 {
        return account.to_string();
    }
    let prefix = &account[..3];
    let suffix = &account[account.len() - 4..];
    format!("{prefix}****{suffix}")
}

impl EscrowTransactionWebhookPayload {
    pub fn from_escrow_transaction(tx: &EscrowTransaction) -> Self {
        Self {
            transaction_id: tx.transaction_id.clone(),
            from_account: tx.from_account.clone(),
            to_account: mask_account(&tx.to_account),
            amount: tx.amount,
            comment: tx.comment.clone(),
            time: tx.transaction_date,
            status: tx.status.as_str(),
            uuid: tx.initiator_uuid.clone(),
            timestamp: tx.timestamp.clone(),
            signed_uuid: tx.signed_uuid.clone(),
            cashout_provider: tx.cashout_provider.as_str().to_string(),
            beneficiary: tx.beneficiary.clone(),
            service_provider: tx.service_provider.clone(),
        }
    }
}

pub struct WebhookDispatcher {
    db: Arc<StateDb>,
    client: reqwest::Client,
    signing_key: Option<Arc<PlatformKeyPair>>,
    default_webhook_url: String,
}

impl WebhookDispatcher {
    pub fn new(
        db: Arc<StateDb>,
        client: reqwest::Client,
        signing_key: Option<Arc<PlatformKeyPair>>,
        default_webhook_url: String,
    ) -> Self {
        Self {
            db,
            client,
            signing_key,
            default_webhook_url,
        }
    }

    /// Deliver a notification for `tx`, persisting the attempt regardless
    /// of outcome. Returns `Err` only when the request could not even be
    /// sent or came back non-2xx — the caller decides whether that blocks
    /// an escrow release (see [`crate::escrow::EscrowCoordinator`]).
    #[instrument(skip(self, tx), fields(initiator_uuid = %tx.initiator_uuid, service_provider = %tx.service_provider))]
    pub async fn deliver(&self, tx: &EscrowTransaction) -> Result<(), LedgerError> {
        let webhook_url = match self.db.get_provider(&tx.service_provider)? {
            Some(provider) if !provider.webhook_url.is_empty() => provider.webhook_url,
            _ => self.default_webhook_url.clone(),
        };

        let payload = EscrowTransactionWebhookPayload::from_escrow_transaction(tx);
        let signed_uuid = match &self.signing_key {
            Some(key) => key.sign(tx.initiator_uuid.as_bytes()).ok(),
            None => None,
        };

        let mut request = self
            .client
            .post(&webhook_url)
            .header("Content-Type", "application/json")
            .json(&payload);
        if let Some(sig) = &signed_uuid {
            request = request.header(ledger_core::SIGNATURE_HEADER, sig);
        }

        let result = request.send().await;
        let (success, status_code, error) = match &result {
            Ok(resp) if resp.status().is_success() => (true, Some(resp.status().as_u16()), None),
            Ok(resp) => (
                false,
                Some(resp.status().as_u16()),
                Some(format!("non-2xx response: {}", resp.status())),
            ),
            Err(e) => (false, None, Some(e.to_string())),
        };

        let attempt = ServiceProviderTransaction {
            service_provider: tx.service_provider.clone(),
            transaction_date: unix_now(),
            transaction_id: tx.transaction_id.clone(),
            initiator_uuid: tx.initiator_uuid.clone(),
            url: webhook_url,
            status_code,
            success,
            error: error.clone(),
        };
        self.db.put_provider_transaction(&attempt)?;

        if !success {
            warn!(error = ?error, "webhook delivery failed");
            return Err(LedgerError::Other(
                error.unwrap_or_else(|| "webhook delivery failed".to_string()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_middle_of_long_account_numbers() {
        assert_eq!(mask_account("0965256869"), "096****6869");
    }

    #[test]
    fn leaves_short_account_numbers_unmasked() {
        assert_eq!(mask_account("12345"), "12345");
    }
}
