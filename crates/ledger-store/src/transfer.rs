//! Two-phase transfer engine — spec.md §4.2.
//!
//! A transfer is two consecutive transactional writes, not one: the debit
//! leg (sender balance update + debit posting) and the credit leg (receiver
//! balance update + credit posting). This mirrors the source store
//! adapter's transactional-batch item limit, which cannot fit both legs
//! plus a `TransactionEntry` in a single transaction.

use std::sync::Arc;

use ledger_core::{
    normalize_tenant, round_amount, unix_now, Amount, InitiatorUuid, LedgerEntry, LedgerError,
    PostingType, TransactionEntry, TransactionStatus, TransferResponse, TransferResponseData,
    CURRENCY,
};
use tracing::{instrument, warn};

use crate::db::StateDb;

/// Internal cross-tenant transfer request. The public wire-level
/// `TransferRequest` (single `tenant_id` for both legs) is the common case;
/// the escrow coordinator builds a `TransferEntry` directly with distinct
/// `from_tenant_id`/`to_tenant_id` for park/release legs that cross a
/// tenant boundary (spec.md §4.3: "Transfer with `From = entry.FromAccount
/// / FromTenantID` and `To = ESCROW_ACCOUNT / ESCROW_TENANT`").
#[derive(Clone, Debug)]
pub struct TransferEntry {
    pub from_tenant_id: String,
    pub from_account: String,
    pub to_tenant_id: String,
    pub to_account: String,
    pub amount: Amount,
    pub initiator_uuid: InitiatorUuid,
    pub signed_uuid: Option<String>,
    pub comment: Option<String>,
}

impl TransferEntry {
    /// The common single-tenant case: both legs share one tenant.
    pub fn within_tenant(
        tenant_id: &str,
        from_account: String,
        to_account: String,
        amount: Amount,
        initiator_uuid: InitiatorUuid,
    ) -> Self {
        let tenant = normalize_tenant(tenant_id);
        Self {
            from_tenant_id: tenant.clone(),
            from_account,
            to_tenant_id: tenant,
            to_account,
            amount,
            initiator_uuid,
            signed_uuid: None,
            comment: None,
        }
    }
}

pub struct TransferEngine {
    db: Arc<StateDb>,
}

impl TransferEngine {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self { db }
    }

    /// Run a transfer to completion, returning a wire-shaped `TransferResponse`.
    ///
    /// `UnrecoverableInconsistency` — the one case where the compensating
    /// rollback itself failed — is propagated as an `Err` rather than folded
    /// into the response, since it is not one of the stable response codes
    /// spec.md §6 lists and requires an operator alert, not a client-facing
    /// error code.
    #[instrument(skip(self), fields(from = %entry.from_account, to = %entry.to_account, amount = %entry.amount))]
    pub fn transfer(&self, entry: TransferEntry) -> Result<TransferResponse, LedgerError> {
        match self.try_transfer(entry) {
            Ok(data) => Ok(TransferResponse::success(data)),
            Err(e @ LedgerError::UnrecoverableInconsistency { .. }) => Err(e),
            Err(e) => {
                let code = e
                    .response_code()
                    .expect("every non-fatal transfer error carries a response code");
                Ok(TransferResponse::error(code, e.to_string()))
            }
        }
    }

    fn try_transfer(&self, entry: TransferEntry) -> Result<TransferResponseData, LedgerError> {
        // ── 1. Input validation ──────────────────────────────────────────
        if entry.from_account.is_empty() || entry.to_account.is_empty() {
            return Err(LedgerError::MissingAccount);
        }
        if entry.amount <= Amount::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let amount = round_amount(entry.amount);

        let from_tenant = normalize_tenant(&entry.from_tenant_id);
        let to_tenant = normalize_tenant(&entry.to_tenant_id);
        let transaction_id = ledger_core::new_id();
        let now = unix_now();

        // ── 2. Sender resolution + balance check ─────────────────────────
        let sender = self
            .db
            .get_account(&from_tenant, &entry.from_account)?
            .ok_or_else(|| LedgerError::UserNotFound {
                tenant: from_tenant.clone(),
                account: entry.from_account.clone(),
            })?;

        if amount > sender.amount {
            return Err(LedgerError::InsufficientBalance {
                need: amount.to_string(),
                have: sender.amount.to_string(),
            });
        }

        // Written once with status=FailedOrPending at attempt start and
        // overwritten with Success on full completion (spec.md §3).
        let tx_entry_base = TransactionEntry {
            tenant_id: from_tenant.clone(),
            transaction_id: transaction_id.clone(),
            from_account: entry.from_account.clone(),
            to_account: entry.to_account.clone(),
            amount,
            transaction_date: now,
            status: TransactionStatus::FailedOrPending,
            initiator_uuid: entry.initiator_uuid.clone(),
            comment: entry.comment.clone(),
            signed_uuid: entry.signed_uuid.clone(),
        };

        // ── Phase A — debit leg ───────────────────────────────────────────
        let debit_posting = LedgerEntry {
            account_id: entry.from_account.clone(),
            transaction_id: transaction_id.clone(),
            amount,
            posting_type: PostingType::Debit,
            time: now,
            tenant_id: from_tenant.clone(),
            initiator_uuid: entry.initiator_uuid.clone(),
        };
        let new_sender_amount = round_amount(sender.amount - amount);
        let sender_after_debit = match self.db.apply_posting(
            &from_tenant,
            &entry.from_account,
            sender.version,
            new_sender_amount,
            now,
            &debit_posting,
        ) {
            Ok(acc) => acc,
            Err(e) => {
                self.db.put_transaction_entry(&tx_entry_base)?;
                return Err(LedgerError::DebitFailed {
                    transaction_id,
                    detail: e.to_string(),
                });
            }
        };

        // ── Phase B — credit leg ──────────────────────────────────────────
        let credit_posting = LedgerEntry {
            account_id: entry.to_account.clone(),
            transaction_id: transaction_id.clone(),
            amount,
            posting_type: PostingType::Credit,
            time: now,
            tenant_id: to_tenant.clone(),
            initiator_uuid: entry.initiator_uuid.clone(),
        };

        let credit_result = match self.db.get_account(&to_tenant, &entry.to_account)? {
            None => Err(LedgerError::UserNotFound {
                tenant: to_tenant.clone(),
                account: entry.to_account.clone(),
            }),
            Some(receiver) => {
                let new_receiver_amount = round_amount(receiver.amount + amount);
                self.db.apply_credit_posting(
                    &to_tenant,
                    &entry.to_account,
                    new_receiver_amount,
                    unix_now(),
                    &credit_posting,
                )
            }
        };

        if let Err(e) = credit_result {
            // ── Compensating rollback ─────────────────────────────────────
            // Uses the version phase A itself just established
            // (`sender_after_debit.version`), not a fresh re-read: a fresh
            // read would silently absorb any third-party interleave and
            // make the condition meaningless exactly when it matters most
            // (spec.md §4.2's "snapshot Version" note). The Go source
            // instead reused the *pre-phase-A* snapshot for this check
            // (`escrow.go` lines 213 and 282 both read `sender.Version`),
            // which is stale the moment phase A commits and makes the
            // rollback's condition fail unconditionally — a latent bug in
            // the source, not a design this reimplementation preserves.
            let restored_amount = round_amount(sender_after_debit.amount + amount);
            match self.db.compensate_balance(
                &from_tenant,
                &entry.from_account,
                sender_after_debit.version,
                restored_amount,
                unix_now(),
            ) {
                Ok(_) => {
                    self.db.put_transaction_entry(&tx_entry_base)?;
                    return Err(LedgerError::CreditFailed {
                        transaction_id,
                        detail: e.to_string(),
                    });
                }
                Err(rollback_err) => {
                    warn!(
                        transaction_id = %transaction_id,
                        initiator_uuid = %entry.initiator_uuid,
                        credit_error = %e,
                        rollback_error = %rollback_err,
                        "compensating rollback failed after failed credit leg"
                    );
                    self.db.put_transaction_entry(&tx_entry_base)?;
                    return Err(LedgerError::UnrecoverableInconsistency {
                        initiator_uuid: entry.initiator_uuid.clone(),
                        detail: format!(
                            "credit failed ({e}) and rollback of debit failed ({rollback_err})"
                        ),
                    });
                }
            }
        }

        // ── Full success ───────────────────────────────────────────────────
        let mut tx_entry = tx_entry_base;
        tx_entry.status = TransactionStatus::Success;
        self.db.put_transaction_entry(&tx_entry)?;

        Ok(TransferResponseData {
            transaction_id,
            amount,
            currency: CURRENCY.to_string(),
            uuid: entry.initiator_uuid,
            signed_uuid: entry.signed_uuid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{Account, ResponseCode};
    use std::path::PathBuf;

    fn temp_db() -> (Arc<StateDb>, PathBuf) {
        let mut path = std::env::temp_dir();
        path.push(format!("ledger-store-transfer-test-{}", ledger_core::new_id()));
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

    #[test]
    fn happy_path_transfer_moves_balance() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "249_ACCT_1", "121336038");
        seed_account(&db, "nil", "0111493888", "0");

        let engine = TransferEngine::new(Arc::clone(&db));
        let entry = TransferEntry::within_tenant(
            "nil",
            "249_ACCT_1".to_string(),
            "0111493888".to_string(),
            "10000".parse().unwrap(),
            ledger_core::new_id(),
        );
        let resp = engine.transfer(entry).expect("transfer result");
        assert_eq!(resp.code, ResponseCode::SuccessfulTransaction.as_str());

        let a = db.get_account("nil", "249_ACCT_1").unwrap().unwrap();
        let b = db.get_account("nil", "0111493888").unwrap().unwrap();
        assert_eq!(a.amount.to_string(), "121326038.00");
        assert_eq!(b.amount.to_string(), "10000.00");

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn insufficient_balance_leaves_both_accounts_unchanged() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "0111493888", "0");
        seed_account(&db, "nil", "0111498888", "0");

        let engine = TransferEngine::new(Arc::clone(&db));
        let entry = TransferEntry::within_tenant(
            "nil",
            "0111493888".to_string(),
            "0111498888".to_string(),
            "1".parse().unwrap(),
            ledger_core::new_id(),
        );
        let resp = engine.transfer(entry).expect("transfer result");
        assert_eq!(resp.code, ResponseCode::InsufficientBalance.as_str());

        let a = db.get_account("nil", "0111493888").unwrap().unwrap();
        let b = db.get_account("nil", "0111498888").unwrap().unwrap();
        assert_eq!(a.amount.to_string(), "0");
        assert_eq!(b.amount.to_string(), "0");

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn unknown_sender_fails_without_writing_ledger() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "0111498888", "0");

        let engine = TransferEngine::new(Arc::clone(&db));
        let entry = TransferEntry::within_tenant(
            "nil",
            "nonexistent".to_string(),
            "0111498888".to_string(),
            "1".parse().unwrap(),
            ledger_core::new_id(),
        );
        let resp = engine.transfer(entry).expect("transfer result");
        assert_eq!(resp.code, ResponseCode::UserNotFound.as_str());

        let (entries, _) = db.get_transactions_for_account("nonexistent", 10, None).unwrap();
        assert!(entries.is_empty());

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn zero_and_negative_amounts_are_rejected() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "249_ACCT_1", "121336038");
        seed_account(&db, "nil", "0111493888", "0");
        let engine = TransferEngine::new(Arc::clone(&db));

        for amount in ["0", "-100"] {
            let entry = TransferEntry::within_tenant(
                "nil",
                "249_ACCT_1".to_string(),
                "0111493888".to_string(),
                amount.parse().unwrap(),
                ledger_core::new_id(),
            );
            let resp = engine.transfer(entry).expect("transfer result");
            assert_eq!(resp.code, ResponseCode::InvalidAmount.as_str());
        }

        let a = db.get_account("nil", "249_ACCT_1").unwrap().unwrap();
        assert_eq!(a.amount.to_string(), "121336038");

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn fractional_amount_splits_to_the_cent() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "249_ACCT_1", "121336038");
        seed_account(&db, "nil", "0111493888", "0");
        let engine = TransferEngine::new(Arc::clone(&db));

        let entry = TransferEntry::within_tenant(
            "nil",
            "249_ACCT_1".to_string(),
            "0111493888".to_string(),
            "1234.56".parse().unwrap(),
            ledger_core::new_id(),
        );
        let resp = engine.transfer(entry).expect("transfer result");
        assert_eq!(resp.code, ResponseCode::SuccessfulTransaction.as_str());

        let a = db.get_account("nil", "249_ACCT_1").unwrap().unwrap();
        let b = db.get_account("nil", "0111493888").unwrap().unwrap();
        assert_eq!(a.amount.to_string(), "121334803.44");
        assert_eq!(b.amount.to_string(), "1234.56");

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn posting_duality_holds_for_every_transaction_id() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "A", "100");
        seed_account(&db, "nil", "B", "0");
        let engine = TransferEngine::new(Arc::clone(&db));

        let resp = engine
            .transfer(TransferEntry::within_tenant(
                "nil",
                "A".to_string(),
                "B".to_string(),
                "40".parse().unwrap(),
                ledger_core::new_id(),
            ))
            .unwrap();
        let data = resp.data.expect("success data");

        let (debit_side, _) = db.get_transactions_for_account("A", 10, None).unwrap();
        let (credit_side, _) = db.get_transactions_for_account("B", 10, None).unwrap();
        let debit = debit_side
            .iter()
            .find(|e| e.transaction_id == data.transaction_id)
            .expect("debit posting present");
        let credit = credit_side
            .iter()
            .find(|e| e.transaction_id == data.transaction_id)
            .expect("credit posting present");
        assert_eq!(debit.amount, credit.amount);
        assert!(matches!(debit.posting_type, PostingType::Debit));
        assert!(matches!(credit.posting_type, PostingType::Credit));

        let _ = std::fs::remove_dir_all(&path);
    }
}
