//! QR collection (pull-payment) flow — spec.md §4.5.
//!
//! A creator generates a `PENDING` payment request tied to their own
//! account; any payer can later settle it by initiating a transfer into
//! that account. Grounded on `qr.go`'s `PerformQRPayment`, which only
//! marks the row `COMPLETED` once the transfer call has returned
//! successfully (`qr.go:112-115` returns early on a non-nil error, and
//! `TransferCredits` returns a Go error on a business decline too — see
//! `escrow.go:169`'s `errors.New("insufficient balance")`). A declined
//! transfer therefore leaves the request `PENDING` for a retry.

use std::sync::Arc;

use ledger_core::{new_id, normalize_tenant, round_amount, unix_now, LedgerError, QrPaymentRequest, QrStatus};
use tracing::instrument;

use crate::db::StateDb;
use crate::transfer::{TransferEngine, TransferEntry};

pub struct QrFlow {
    db: Arc<StateDb>,
    transfer: TransferEngine,
}

impl QrFlow {
    pub fn new(db: Arc<StateDb>) -> Self {
        let transfer = TransferEngine::new(Arc::clone(&db));
        Self { db, transfer }
    }

    #[instrument(skip(self))]
    pub fn generate_qr_payment(
        &self,
        tenant_id: &str,
        account_id: &str,
        amount: ledger_core::Amount,
    ) -> Result<QrPaymentRequest, LedgerError> {
        if amount <= ledger_core::Amount::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let tenant = normalize_tenant(tenant_id);
        let request = QrPaymentRequest {
            tenant_id: tenant,
            payment_id: new_id(),
            account_id: account_id.to_string(),
            amount: round_amount(amount),
            status: QrStatus::Pending,
            uuid: new_id(),
            creation_date: unix_now(),
            to_account: account_id.to_string(),
        };
        self.db.put_qr_payment(&request)?;
        Ok(request)
    }

    #[instrument(skip(self))]
    pub fn inquire_qr_payment(
        &self,
        tenant_id: &str,
        payment_id: &str,
    ) -> Result<QrPaymentRequest, LedgerError> {
        let tenant = normalize_tenant(tenant_id);
        self.db
            .get_qr_payment(&tenant, payment_id)?
            .ok_or_else(|| LedgerError::PaymentNotFound {
                tenant,
                payment_id: payment_id.to_string(),
            })
    }

    /// Settle a pending QR payment by transferring `amount` from
    /// `payer_account` into the creator's account. The row only moves to
    /// `COMPLETED` once the transfer actually succeeded (spec.md §4.5 step
    /// 3, "**On success**..."); a business decline (insufficient balance,
    /// unknown account) leaves it `PENDING` for a retry.
    #[instrument(skip(self))]
    pub fn perform_qr_payment(
        &self,
        tenant_id: &str,
        payment_id: &str,
        payer_account: &str,
    ) -> Result<ledger_core::TransferResponse, LedgerError> {
        let tenant = normalize_tenant(tenant_id);
        let qr_payment = self.inquire_qr_payment(&tenant, payment_id)?;

        if qr_payment.status != QrStatus::Pending {
            return Err(LedgerError::InvalidState {
                payment_id: payment_id.to_string(),
                current: qr_payment.status.as_str().to_string(),
            });
        }

        let entry = TransferEntry::within_tenant(
            &tenant,
            payer_account.to_string(),
            qr_payment.to_account.clone(),
            qr_payment.amount,
            new_id(),
        );
        let response = self.transfer.transfer(entry)?;

        if response.data.is_some() {
            let mut updated = qr_payment;
            updated.status = QrStatus::Completed;
            self.db.put_qr_payment(&updated)?;
        }

        Ok(response)
    }

    #[instrument(skip(self))]
    pub fn get_all_qr_payments_for_user(
        &self,
        tenant_id: &str,
        creator_account_id: &str,
    ) -> Result<Vec<QrPaymentRequest>, LedgerError> {
        let tenant = normalize_tenant(tenant_id);
        self.db.get_qr_payments_for_creator(&tenant, creator_account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{Account, CURRENCY};
    use std::path::PathBuf;

    fn temp_db() -> (Arc<StateDb>, PathBuf) {
        let mut path = std::env::temp_dir();
        path.push(format!("ledger-store-qr-test-{}", new_id()));
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
    fn happy_path_settles_and_marks_completed() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "payer", "100");
        seed_account(&db, "nil", "creator", "0");
        let flow = QrFlow::new(Arc::clone(&db));

        let qr = flow
            .generate_qr_payment("nil", "creator", "25".parse().unwrap())
            .expect("generate");
        assert_eq!(qr.status, QrStatus::Pending);

        let resp = flow
            .perform_qr_payment("nil", &qr.payment_id, "payer")
            .expect("perform");
        assert_eq!(resp.status, "success");

        let updated = flow.inquire_qr_payment("nil", &qr.payment_id).unwrap();
        assert_eq!(updated.status, QrStatus::Completed);

        let payer = db.get_account("nil", "payer").unwrap().unwrap();
        let creator = db.get_account("nil", "creator").unwrap().unwrap();
        assert_eq!(payer.amount.to_string(), "75.00");
        assert_eq!(creator.amount.to_string(), "25.00");

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn declined_transfer_leaves_payment_pending() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "payer", "0");
        seed_account(&db, "nil", "creator", "0");
        let flow = QrFlow::new(Arc::clone(&db));

        let qr = flow
            .generate_qr_payment("nil", "creator", "25".parse().unwrap())
            .expect("generate");
        let resp = flow
            .perform_qr_payment("nil", &qr.payment_id, "payer")
            .expect("perform");
        assert_eq!(resp.status, "error");

        let updated = flow.inquire_qr_payment("nil", &qr.payment_id).unwrap();
        assert_eq!(updated.status, QrStatus::Pending);

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn declined_transfer_can_be_retried_until_it_succeeds() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "payer", "0");
        seed_account(&db, "nil", "creator", "0");
        let flow = QrFlow::new(Arc::clone(&db));

        let qr = flow
            .generate_qr_payment("nil", "creator", "25".parse().unwrap())
            .expect("generate");
        let declined = flow
            .perform_qr_payment("nil", &qr.payment_id, "payer")
            .expect("perform");
        assert_eq!(declined.status, "error");

        // Fund the payer and retry against the still-pending request.
        db.put_account(&{
            let mut acc = db.get_account("nil", "payer").unwrap().unwrap();
            acc.amount = "25".parse().unwrap();
            acc
        })
        .expect("fund payer");

        let settled = flow
            .perform_qr_payment("nil", &qr.payment_id, "payer")
            .expect("retry");
        assert_eq!(settled.status, "success");

        let updated = flow.inquire_qr_payment("nil", &qr.payment_id).unwrap();
        assert_eq!(updated.status, QrStatus::Completed);

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn already_completed_payment_cannot_be_performed_again() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "payer", "100");
        seed_account(&db, "nil", "creator", "0");
        let flow = QrFlow::new(Arc::clone(&db));

        let qr = flow
            .generate_qr_payment("nil", "creator", "25".parse().unwrap())
            .expect("generate");
        flow.perform_qr_payment("nil", &qr.payment_id, "payer")
            .expect("first attempt");

        let second = flow.perform_qr_payment("nil", &qr.payment_id, "payer");
        assert!(matches!(second, Err(LedgerError::InvalidState { .. })));

        let _ = std::fs::remove_dir_all(&path);
    }
}
