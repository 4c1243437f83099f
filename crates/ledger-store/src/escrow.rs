//! Escrow coordinator — spec.md §4.3.
//!
//! A two-phase pattern: funds are parked in a system-owned escrow account
//! synchronously inside [`EscrowCoordinator::escrow_request`], then released
//! toward the final beneficiary by an asynchronous worker that reacts to the
//! `InProgress` row it leaves behind. The release worker's real driver would
//! be change-data-capture on `EscrowTransactions` inserts (named out of
//! scope as an external collaborator by spec.md §1); here it is simulated
//! with an internal `tokio::mpsc` channel that `escrow_request` feeds and
//! `ledger-node`'s main loop drains, so the hand-off stays genuinely
//! asynchronous ("Phase 2 is NOT attempted synchronously") without needing
//! a real external broker to run standalone.

use std::sync::Arc;

use ledger_core::{
    normalize_tenant, round_amount, unix_now, Beneficiary, CashoutProvider, EscrowStatus,
    EscrowTransaction, InitiatorUuid, LedgerError,
};
use tracing::{info, instrument, warn};

use crate::db::StateDb;
use crate::transfer::{TransferEngine, TransferEntry};
use crate::webhook::WebhookDispatcher;

pub const ESCROW_ACCOUNT: &str = ledger_core::ESCROW_ACCOUNT;
pub const ESCROW_TENANT: &str = ledger_core::ESCROW_TENANT;

/// Caller-supplied request to move value between two tenants (or to an
/// external cash-out provider), via the escrow account.
#[derive(Clone, Debug)]
pub struct EscrowRequestEntry {
    pub from_account: String,
    pub from_tenant_id: String,
    pub to_account: String,
    pub to_tenant_id: String,
    pub amount: ledger_core::Amount,
    pub initiator_uuid: InitiatorUuid,
    pub cashout_provider: String,
    pub service_provider: String,
    pub beneficiary: Beneficiary,
    pub comment: Option<String>,
    pub signed_uuid: Option<String>,
}

/// Emitted once an `EscrowTransaction` is durably parked at `InProgress`, to
/// be picked up by whatever drives phase 2 (see module docs).
#[derive(Clone, Debug)]
pub struct ReleaseEvent {
    pub initiator_uuid: String,
    pub transaction_id: String,
}

pub struct EscrowCoordinator {
    db: Arc<StateDb>,
    transfer: TransferEngine,
    webhook: WebhookDispatcher,
    release_tx: Option<tokio::sync::mpsc::Sender<ReleaseEvent>>,
}

impl EscrowCoordinator {
    pub fn new(
        db: Arc<StateDb>,
        webhook: WebhookDispatcher,
        release_tx: Option<tokio::sync::mpsc::Sender<ReleaseEvent>>,
    ) -> Self {
        let transfer = TransferEngine::new(Arc::clone(&db));
        Self {
            db,
            transfer,
            webhook,
            release_tx,
        }
    }

    /// `IsDuplicateEscrowTransaction`: look up an existing row by
    /// `InitiatorUUID` — the idempotency key.
    pub fn is_duplicate(&self, initiator_uuid: &str) -> Result<Option<EscrowTransaction>, LedgerError> {
        self.db.find_escrow_by_initiator(initiator_uuid)
    }

    /// Phase 1 (park) + persist-intent. Phase 2 (release) is never invoked
    /// from here — only from [`EscrowCoordinator::release`].
    #[instrument(skip(self), fields(initiator_uuid = %entry.initiator_uuid))]
    pub async fn escrow_request(
        &self,
        entry: EscrowRequestEntry,
    ) -> Result<EscrowTransaction, LedgerError> {
        // ── 1. Idempotency check ─────────────────────────────────────────
        if let Some(existing) = self.is_duplicate(&entry.initiator_uuid)? {
            return Ok(existing);
        }

        let from_tenant = normalize_tenant(&entry.from_tenant_id);
        let to_tenant = normalize_tenant(&entry.to_tenant_id);
        let amount = round_amount(entry.amount);
        let now = unix_now();

        // ── 2. Phase 1 — park funds in the escrow account ────────────────
        let park = TransferEntry {
            from_tenant_id: from_tenant.clone(),
            from_account: entry.from_account.clone(),
            to_tenant_id: ESCROW_TENANT.to_string(),
            to_account: ESCROW_ACCOUNT.to_string(),
            amount,
            initiator_uuid: entry.initiator_uuid.clone(),
            signed_uuid: entry.signed_uuid.clone(),
            comment: Some("escrow park".to_string()),
        };
        let park_response = self.transfer.transfer(park)?;
        if park_response.data.is_none() {
            // No EscrowTransaction row is written on phase-1 failure
            // (spec.md §4.3 step 2): surface the underlying transfer error.
            return Err(LedgerError::Other(format!(
                "{}: {}",
                park_response.code, park_response.message
            )));
        }
        let transaction_id = park_response.data.unwrap().transaction_id;

        // ── 3. Persist intent ─────────────────────────────────────────────
        let escrow_tx = EscrowTransaction {
            initiator_uuid: entry.initiator_uuid.clone(),
            transaction_id: transaction_id.clone(),
            from_account: entry.from_account.clone(),
            from_tenant_id: from_tenant,
            to_account: entry.to_account.clone(),
            to_tenant_id: to_tenant,
            amount,
            transaction_date: now,
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: EscrowStatus::InProgress,
            transient_account: ESCROW_ACCOUNT.to_string(),
            transient_tenant: ESCROW_TENANT.to_string(),
            cashout_provider: CashoutProvider::from_str(&entry.cashout_provider),
            service_provider: entry.service_provider,
            beneficiary: entry.beneficiary,
            comment: entry.comment,
            signed_uuid: entry.signed_uuid,
        };
        self.db.put_escrow_transaction(&escrow_tx)?;

        if let Some(tx) = &self.release_tx {
            let _ = tx
                .send(ReleaseEvent {
                    initiator_uuid: escrow_tx.initiator_uuid.clone(),
                    transaction_id: escrow_tx.transaction_id.clone(),
                })
                .await;
        }

        Ok(escrow_tx)
    }

    /// Phase 2 (release), driven by [`ReleaseEvent`]. Idempotent against
    /// redelivery: rows already in a terminal state are skipped.
    #[instrument(skip(self), fields(initiator_uuid = %event.initiator_uuid))]
    pub async fn release(&self, event: ReleaseEvent) -> Result<(), LedgerError> {
        let mut escrow_tx = self
            .db
            .find_escrow_by_initiator(&event.initiator_uuid)?
            .ok_or_else(|| LedgerError::EscrowTransactionNotFound(event.initiator_uuid.clone()))?;

        if escrow_tx.is_terminal() {
            return Ok(());
        }

        let release_result = match &escrow_tx.cashout_provider {
            CashoutProvider::Local => {
                let release = TransferEntry {
                    from_tenant_id: escrow_tx.transient_tenant.clone(),
                    from_account: escrow_tx.transient_account.clone(),
                    to_tenant_id: escrow_tx.to_tenant_id.clone(),
                    to_account: escrow_tx.to_account.clone(),
                    amount: escrow_tx.amount,
                    initiator_uuid: format!("{}-release", escrow_tx.initiator_uuid),
                    signed_uuid: escrow_tx.signed_uuid.clone(),
                    comment: Some("escrow release".to_string()),
                };
                self.transfer
                    .transfer(release)
                    .map(|resp| resp.data.is_some())
            }
            CashoutProvider::External(provider) => {
                match self.webhook.deliver(&escrow_tx).await {
                    Ok(()) => {
                        info!(provider = %provider, "external cash-out acknowledged");
                        Ok(true)
                    }
                    Err(e) => Err(e),
                }
            }
        };

        match release_result {
            Ok(true) => {
                escrow_tx.status = EscrowStatus::Completed;
                self.db.put_escrow_transaction(&escrow_tx)?;
                if matches!(escrow_tx.cashout_provider, CashoutProvider::Local) {
                    // Local releases still get a completed-transaction
                    // webhook fan-out (spec.md §4.4 trigger: "a state
                    // transition of an EscrowTransaction to Completed").
                    if let Err(e) = self.webhook.deliver(&escrow_tx).await {
                        warn!(error = %e, "post-completion webhook notification failed");
                    }
                }
                Ok(())
            }
            Ok(false) | Err(_) => {
                let detail = match &release_result {
                    Err(e) => e.to_string(),
                    _ => "release transfer returned no data".to_string(),
                };
                warn!(error = %detail, "escrow release failed, reversing");
                self.reverse(&mut escrow_tx)
            }
        }
    }

    fn reverse(&self, escrow_tx: &mut EscrowTransaction) -> Result<(), LedgerError> {
        let reverse = TransferEntry {
            from_tenant_id: escrow_tx.transient_tenant.clone(),
            from_account: escrow_tx.transient_account.clone(),
            to_tenant_id: escrow_tx.from_tenant_id.clone(),
            to_account: escrow_tx.from_account.clone(),
            amount: escrow_tx.amount,
            initiator_uuid: format!("{}-reverse", escrow_tx.initiator_uuid),
            signed_uuid: escrow_tx.signed_uuid.clone(),
            comment: Some("escrow reversal".to_string()),
        };
        match self.transfer.transfer(reverse) {
            Ok(resp) if resp.data.is_some() => {
                escrow_tx.status = EscrowStatus::Failed;
                self.db.put_escrow_transaction(escrow_tx)?;
                Ok(())
            }
            Ok(resp) => {
                warn!(code = %resp.code, "reversal transfer failed, leaving escrow row InProgress for operator review");
                Ok(())
            }
            Err(e @ LedgerError::UnrecoverableInconsistency { .. }) => {
                warn!(error = %e, "reversal hit an unrecoverable inconsistency");
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "reversal transfer errored, leaving escrow row InProgress for operator review");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{new_id, Account, CURRENCY};
    use std::path::PathBuf;

    fn temp_db() -> (Arc<StateDb>, PathBuf) {
        let mut path = std::env::temp_dir();
        path.push(format!("ledger-store-escrow-test-{}", new_id()));
        let db = Arc::new(StateDb::open(&path).expect("open test db"));
        (db, path)
    }

    fn seed_account(db: &StateDb, tenant: &str, account: &str, amount: &str) {
        let acc = Account::new(
            tenant.to_string(),
            account.to_string(),
            amount.parse().unwrap(),
            CURRENCY.to_string(),
            unix_now(),
        );
        db.create_account(&acc).expect("seed account");
    }

    fn coordinator(db: Arc<StateDb>) -> EscrowCoordinator {
        let webhook = WebhookDispatcher::new(
            Arc::clone(&db),
            reqwest::Client::new(),
            None,
            "https://example.invalid/default-webhook".to_string(),
        );
        EscrowCoordinator::new(db, webhook, None)
    }

    #[tokio::test]
    async fn local_cashout_completes_and_conserves_value() {
        let (db, path) = temp_db();
        seed_account(&db, "nonil", "0111493885", "1");
        seed_account(&db, "nil", "0965256869", "0");
        seed_account(&db, ESCROW_TENANT, ESCROW_ACCOUNT, "0");

        let coord = coordinator(Arc::clone(&db));
        let entry = EscrowRequestEntry {
            from_account: "0111493885".to_string(),
            from_tenant_id: "nonil".to_string(),
            to_account: "0965256869".to_string(),
            to_tenant_id: "nil".to_string(),
            amount: "1".parse().unwrap(),
            initiator_uuid: "fff".to_string(),
            cashout_provider: "nil".to_string(),
            service_provider: "acme@example.com".to_string(),
            beneficiary: Beneficiary::default(),
            comment: None,
            signed_uuid: None,
        };
        let escrow_tx = coord.escrow_request(entry).await.expect("escrow request");
        assert_eq!(escrow_tx.status, EscrowStatus::InProgress);

        coord
            .release(ReleaseEvent {
                initiator_uuid: escrow_tx.initiator_uuid.clone(),
                transaction_id: escrow_tx.transaction_id.clone(),
            })
            .await
            .expect("release");

        let from = db.get_account("nonil", "0111493885").unwrap().unwrap();
        let to = db.get_account("nil", "0965256869").unwrap().unwrap();
        let escrow_acct = db.get_account(ESCROW_TENANT, ESCROW_ACCOUNT).unwrap().unwrap();
        assert_eq!(from.amount.to_string(), "0.00");
        assert_eq!(to.amount.to_string(), "1.00");
        assert_eq!(escrow_acct.amount.to_string(), "0.00");

        let completed = db.find_escrow_by_initiator("fff").unwrap().unwrap();
        assert_eq!(completed.status, EscrowStatus::Completed);

        let _ = std::fs::remove_dir_all(&path);
    }

    #[tokio::test]
    async fn duplicate_initiator_uuid_is_idempotent() {
        let (db, path) = temp_db();
        seed_account(&db, "nonil", "0111493885", "5");
        seed_account(&db, "nil", "0965256869", "0");
        seed_account(&db, ESCROW_TENANT, ESCROW_ACCOUNT, "0");
        let coord = coordinator(Arc::clone(&db));

        let entry = EscrowRequestEntry {
            from_account: "0111493885".to_string(),
            from_tenant_id: "nonil".to_string(),
            to_account: "0965256869".to_string(),
            to_tenant_id: "nil".to_string(),
            amount: "1".parse().unwrap(),
            initiator_uuid: "dup-uuid".to_string(),
            cashout_provider: "nil".to_string(),
            service_provider: "acme@example.com".to_string(),
            beneficiary: Beneficiary::default(),
            comment: None,
            signed_uuid: None,
        };
        let first = coord.escrow_request(entry.clone()).await.unwrap();
        let second = coord.escrow_request(entry).await.unwrap();
        assert_eq!(first.transaction_id, second.transaction_id);

        let from = db.get_account("nonil", "0111493885").unwrap().unwrap();
        // Only one phase-1 movement: 5 - 1 = 4, not 3.
        assert_eq!(from.amount.to_string(), "4.00");

        let _ = std::fs::remove_dir_all(&path);
    }

    #[tokio::test]
    async fn terminal_escrow_transaction_is_never_retransitioned() {
        let (db, path) = temp_db();
        seed_account(&db, "nonil", "A", "10");
        seed_account(&db, "nil", "B", "0");
        seed_account(&db, ESCROW_TENANT, ESCROW_ACCOUNT, "0");
        let coord = coordinator(Arc::clone(&db));

        let entry = EscrowRequestEntry {
            from_account: "A".to_string(),
            from_tenant_id: "nonil".to_string(),
            to_account: "B".to_string(),
            to_tenant_id: "nil".to_string(),
            amount: "1".parse().unwrap(),
            initiator_uuid: "term".to_string(),
            cashout_provider: "nil".to_string(),
            service_provider: "acme@example.com".to_string(),
            beneficiary: Beneficiary::default(),
            comment: None,
            signed_uuid: None,
        };
        let escrow_tx = coord.escrow_request(entry).await.unwrap();
        let event = ReleaseEvent {
            initiator_uuid: escrow_tx.initiator_uuid.clone(),
            transaction_id: escrow_tx.transaction_id.clone(),
        };
        coord.release(event.clone()).await.unwrap();
        let after_first = db.find_escrow_by_initiator("term").unwrap().unwrap();
        assert_eq!(after_first.status, EscrowStatus::Completed);

        // A second release call against an already-terminal row is a no-op.
        coord.release(event).await.unwrap();
        let after_second = db.find_escrow_by_initiator("term").unwrap().unwrap();
        assert_eq!(after_second.status, EscrowStatus::Completed);

        let _ = std::fs::remove_dir_all(&path);
    }
}
