use std::path::Path;

use ledger_core::{
    Account, EscrowTransaction, LedgerEntry, LedgerError, QrPaymentRequest, ServiceProvider,
    ServiceProviderTransaction, TransactionEntry, Version,
};
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};

use ledger_core::{
    TABLE_ACCOUNTS, TABLE_ESCROW, TABLE_ESCROW_FROM_TENANT_INDEX, TABLE_LEDGER,
    TABLE_QR_PAYMENTS, TABLE_QR_PAYMENTS_CREATOR_INDEX, TABLE_SERVICE_PROVIDERS,
    TABLE_SERVICE_PROVIDER_TRANSACTIONS, TABLE_TRANSACTIONS, TABLE_TRANSACTIONS_FROM_INDEX,
    TABLE_TRANSACTIONS_TO_INDEX,
};

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees:
///   NilUsers                    — TenantID\0AccountID         → bincode(Account)
///   LedgerTable                 — AccountID\0TransactionID    → bincode(LedgerEntry)
///   TransactionsTable           — TenantID\0TransactionID     → bincode(TransactionEntry)
///   FromAccountIndex            — FromAccount\0Date\0TxID     → bincode(TransactionEntry)
///   ToAccountIndex              — ToAccount\0Date\0TxID       → bincode(TransactionEntry)
///   EscrowTransactions          — InitiatorUUID\0TxID         → bincode(EscrowTransaction)
///   FromTenantIDIndex           — FromTenantID\0UUID\0TxID    → bincode(EscrowTransaction)
///   ServiceProviders            — Email                       → bincode(ServiceProvider)
///   ServiceProviderTransactions — Provider\0Date\0seq         → bincode(ServiceProviderTransaction)
///   QRPaymentsTable             — TenantID\0PaymentID         → bincode(QrPaymentRequest)
///   CreatorAccountIDIndex       — TenantID\0Creator\0PaymentID→ bincode(QrPaymentRequest)
///
/// sled has no native secondary index or GSI; every "index" above is a
/// plain tree keyed so that the index's own prefix/range scan substitutes
/// for the GSI query the store layer used to issue.
pub struct StateDb {
    db: sled::Db,
    accounts: sled::Tree,
    ledger: sled::Tree,
    transactions: sled::Tree,
    tx_from_index: sled::Tree,
    tx_to_index: sled::Tree,
    escrow: sled::Tree,
    escrow_from_tenant_index: sled::Tree,
    providers: sled::Tree,
    provider_transactions: sled::Tree,
    qr_payments: sled::Tree,
    qr_creator_index: sled::Tree,
}

fn storage_err(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    bincode::serialize(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, LedgerError> {
    bincode::deserialize(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn compose(parts: &[&str]) -> Vec<u8> {
    parts.join("\0").into_bytes()
}

fn account_key(tenant: &str, account: &str) -> Vec<u8> {
    compose(&[tenant, account])
}

fn ledger_key(account: &str, tx_id: &str) -> Vec<u8> {
    compose(&[account, tx_id])
}

fn transaction_key(tenant: &str, tx_id: &str) -> Vec<u8> {
    compose(&[tenant, tx_id])
}

fn account_index_key(account: &str, date: i64, tx_id: &str) -> Vec<u8> {
    let mut k = account.as_bytes().to_vec();
    k.push(0);
    k.extend_from_slice(&date.to_be_bytes());
    k.push(0);
    k.extend_from_slice(tx_id.as_bytes());
    k
}

fn escrow_key(initiator_uuid: &str, tx_id: &str) -> Vec<u8> {
    compose(&[initiator_uuid, tx_id])
}

fn escrow_from_tenant_key(from_tenant: &str, initiator_uuid: &str, tx_id: &str) -> Vec<u8> {
    compose(&[from_tenant, initiator_uuid, tx_id])
}

fn provider_tx_key(provider: &str, date: i64, seq: u64) -> Vec<u8> {
    let mut k = provider.as_bytes().to_vec();
    k.push(0);
    k.extend_from_slice(&date.to_be_bytes());
    k.push(0);
    k.extend_from_slice(&seq.to_be_bytes());
    k
}

fn qr_key(tenant: &str, payment_id: &str) -> Vec<u8> {
    compose(&[tenant, payment_id])
}

fn qr_creator_key(tenant: &str, creator: &str, payment_id: &str) -> Vec<u8> {
    compose(&[tenant, creator, payment_id])
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let db = sled::open(path).map_err(storage_err)?;
        let accounts = db.open_tree(TABLE_ACCOUNTS).map_err(storage_err)?;
        let ledger = db.open_tree(TABLE_LEDGER).map_err(storage_err)?;
        let transactions = db.open_tree(TABLE_TRANSACTIONS).map_err(storage_err)?;
        let tx_from_index = db
            .open_tree(TABLE_TRANSACTIONS_FROM_INDEX)
            .map_err(storage_err)?;
        let tx_to_index = db
            .open_tree(TABLE_TRANSACTIONS_TO_INDEX)
            .map_err(storage_err)?;
        let escrow = db.open_tree(TABLE_ESCROW).map_err(storage_err)?;
        let escrow_from_tenant_index = db
            .open_tree(TABLE_ESCROW_FROM_TENANT_INDEX)
            .map_err(storage_err)?;
        let providers = db.open_tree(TABLE_SERVICE_PROVIDERS).map_err(storage_err)?;
        let provider_transactions = db
            .open_tree(TABLE_SERVICE_PROVIDER_TRANSACTIONS)
            .map_err(storage_err)?;
        let qr_payments = db.open_tree(TABLE_QR_PAYMENTS).map_err(storage_err)?;
        let qr_creator_index = db
            .open_tree(TABLE_QR_PAYMENTS_CREATOR_INDEX)
            .map_err(storage_err)?;
        Ok(Self {
            db,
            accounts,
            ledger,
            transactions,
            tx_from_index,
            tx_to_index,
            escrow,
            escrow_from_tenant_index,
            providers,
            provider_transactions,
            qr_payments,
            qr_creator_index,
        })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), LedgerError> {
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }

    /// Cluster-wide monotonic id, used to disambiguate same-second webhook
    /// delivery attempts against the same provider.
    pub fn next_id(&self) -> Result<u64, LedgerError> {
        self.db.generate_id().map_err(storage_err)
    }

    // ── Accounts ──────────────────────────────────────────────────────────────

    pub fn get_account(&self, tenant: &str, account: &str) -> Result<Option<Account>, LedgerError> {
        match self
            .accounts
            .get(account_key(tenant, account))
            .map_err(storage_err)?
        {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn account_exists(&self, tenant: &str, account: &str) -> bool {
        self.accounts
            .contains_key(account_key(tenant, account))
            .unwrap_or(false)
    }

    /// Insert a brand-new account. Fails with `AccountExists` if the
    /// `(TenantID, AccountID)` key is already present.
    pub fn create_account(&self, account: &Account) -> Result<(), LedgerError> {
        let key = account_key(&account.tenant_id, &account.account_id);
        let bytes = encode(account)?;
        let prev = self
            .accounts
            .compare_and_swap(key, None as Option<&[u8]>, Some(bytes))
            .map_err(storage_err)?;
        if prev.is_err() {
            return Err(LedgerError::AccountExists {
                tenant: account.tenant_id.clone(),
                account: account.account_id.clone(),
            });
        }
        Ok(())
    }

    /// Unconditional overwrite, used only by administrative flows (account
    /// deletion tests, escrow account seeding) — not by the transfer engine,
    /// which always goes through [`StateDb::apply_posting`].
    pub fn put_account(&self, account: &Account) -> Result<(), LedgerError> {
        let key = account_key(&account.tenant_id, &account.account_id);
        self.accounts
            .insert(key, encode(account)?)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn delete_account(&self, tenant: &str, account: &str) -> Result<(), LedgerError> {
        self.accounts
            .remove(account_key(tenant, account))
            .map_err(storage_err)?;
        Ok(())
    }

    /// Batch lookup; returns the subset of `accounts` NOT present. Non-atomic
    /// across items, matching the source's per-item existence scan.
    pub fn check_users_exist(&self, tenant: &str, accounts: &[String]) -> Vec<String> {
        accounts
            .iter()
            .filter(|acc| !self.account_exists(tenant, acc))
            .cloned()
            .collect()
    }

    /// Apply one conditional balance update plus one posting `insert` inside
    /// a single sled transaction — the atomic unit Phase A and Phase B are
    /// each built from. `expected_version` is the snapshot `Version` the
    /// caller read before composing the write; a mismatch means a concurrent
    /// update won the race and this attempt must fail (the caller surfaces
    /// `DebitFailed`/`CreditFailed` as appropriate).
    pub fn apply_posting(
        &self,
        tenant: &str,
        account_id: &str,
        expected_version: Version,
        new_amount: ledger_core::Amount,
        new_version: Version,
        posting: &LedgerEntry,
    ) -> Result<Account, LedgerError> {
        let acc_key = account_key(tenant, account_id);
        let post_key = ledger_key(&posting.account_id, &posting.transaction_id);
        let posting_bytes = encode(posting)?;

        let result = (&self.accounts, &self.ledger).transaction(move |(accounts_tt, ledger_tt)| {
            let current = accounts_tt.get(&acc_key)?.ok_or_else(|| {
                ConflictableTransactionError::Abort(LedgerError::UserNotFound {
                    tenant: tenant.to_string(),
                    account: account_id.to_string(),
                })
            })?;
            let mut account: Account = decode(&current)
                .map_err(|e| ConflictableTransactionError::Abort(e))?;
            if account.version != expected_version {
                return Err(ConflictableTransactionError::Abort(LedgerError::Other(
                    format!(
                        "version conflict on {}/{}: expected {}, found {}",
                        tenant, account_id, expected_version, account.version
                    ),
                )));
            }
            account.amount = new_amount;
            account.version = new_version;
            let new_bytes = encode(&account).map_err(|e| ConflictableTransactionError::Abort(e))?;
            accounts_tt.insert(acc_key.clone(), new_bytes)?;
            ledger_tt.insert(post_key.clone(), posting_bytes.clone())?;
            Ok(account)
        });

        match result {
            Ok(account) => Ok(account),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(storage_err(e)),
        }
    }

    /// Apply the credit leg of a transfer. Unlike [`StateDb::apply_posting`]'s
    /// debit leg, the source's condition here is existence-plus-tenant-match
    /// only (`attribute_exists(AccountID) AND TenantID = :tenant`) — no
    /// version-equality check (spec.md §4.2 Phase B). A concurrent credit
    /// landing on the same receiver between read and write is accepted as
    /// an existing limitation of the source design, not one this
    /// reimplementation hardens.
    pub fn apply_credit_posting(
        &self,
        tenant: &str,
        account_id: &str,
        new_amount: ledger_core::Amount,
        new_version: Version,
        posting: &LedgerEntry,
    ) -> Result<Account, LedgerError> {
        let acc_key = account_key(tenant, account_id);
        let post_key = ledger_key(&posting.account_id, &posting.transaction_id);
        let posting_bytes = encode(posting)?;
        let tenant_owned = tenant.to_string();
        let account_owned = account_id.to_string();

        let result = (&self.accounts, &self.ledger).transaction(move |(accounts_tt, ledger_tt)| {
            let current = accounts_tt.get(&acc_key)?.ok_or_else(|| {
                ConflictableTransactionError::Abort(LedgerError::UserNotFound {
                    tenant: tenant_owned.clone(),
                    account: account_owned.clone(),
                })
            })?;
            let mut account: Account =
                decode(&current).map_err(ConflictableTransactionError::Abort)?;
            if account.tenant_id != tenant_owned {
                return Err(ConflictableTransactionError::Abort(LedgerError::UserNotFound {
                    tenant: tenant_owned.clone(),
                    account: account_owned.clone(),
                }));
            }
            account.amount = new_amount;
            account.version = new_version;
            let new_bytes = encode(&account).map_err(ConflictableTransactionError::Abort)?;
            accounts_tt.insert(acc_key.clone(), new_bytes)?;
            ledger_tt.insert(post_key.clone(), posting_bytes.clone())?;
            Ok(account)
        });

        match result {
            Ok(account) => Ok(account),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(storage_err(e)),
        }
    }

    /// Non-transactional compensating update used only by Phase B's rollback
    /// path: the sender's balance is restored without a matching posting
    /// (the posting pair for this TransactionID was never completed).
    pub fn compensate_balance(
        &self,
        tenant: &str,
        account_id: &str,
        expected_version: Version,
        new_amount: ledger_core::Amount,
        new_version: Version,
    ) -> Result<Account, LedgerError> {
        let key = account_key(tenant, account_id);
        let current = self
            .accounts
            .get(&key)
            .map_err(storage_err)?
            .ok_or_else(|| LedgerError::UserNotFound {
                tenant: tenant.to_string(),
                account: account_id.to_string(),
            })?;
        let mut account: Account = decode(&current)?;
        if account.version != expected_version {
            return Err(LedgerError::Other(format!(
                "version conflict compensating {}/{}: expected {}, found {}",
                tenant, account_id, expected_version, account.version
            )));
        }
        account.amount = new_amount;
        account.version = new_version;
        let new_bytes = encode(&account)?;
        let swapped = self
            .accounts
            .compare_and_swap(key, Some(current.as_ref()), Some(new_bytes))
            .map_err(storage_err)?;
        if swapped.is_err() {
            return Err(LedgerError::Other(format!(
                "concurrent write raced the compensation for {}/{}",
                tenant, account_id
            )));
        }
        Ok(account)
    }

    // ── Ledger entries (postings) ────────────────────────────────────────────

    pub fn get_transactions_for_account(
        &self,
        account: &str,
        limit: u32,
        cursor: Option<Vec<u8>>,
    ) -> Result<(Vec<LedgerEntry>, Option<Vec<u8>>), LedgerError> {
        let prefix = account.as_bytes().to_vec();
        let mut iter: Box<dyn Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>> =
            match &cursor {
                Some(c) => Box::new(self.ledger.range((c.as_slice())..).skip(1)),
                None => Box::new(self.ledger.scan_prefix(&prefix)),
            };
        let mut out = Vec::new();
        let mut last_key = None;
        while let Some(item) = iter.next() {
            let (key, bytes) = item.map_err(storage_err)?;
            if !key.starts_with(&prefix) {
                break;
            }
            if out.len() as u32 >= limit {
                break;
            }
            out.push(decode(&bytes)?);
            last_key = Some(key.to_vec());
        }
        let next_cursor = if out.len() as u32 == limit { last_key } else { None };
        Ok((out, next_cursor))
    }

    // ── Transactions (audit) ──────────────────────────────────────────────────

    pub fn get_transaction_entry(
        &self,
        tenant: &str,
        tx_id: &str,
    ) -> Result<Option<TransactionEntry>, LedgerError> {
        match self
            .transactions
            .get(transaction_key(tenant, tx_id))
            .map_err(storage_err)?
        {
            Some(b) => Ok(Some(decode(&b)?)),
            None => Ok(None),
        }
    }

    /// Write the audit record and refresh its `FromAccountIndex`/`ToAccountIndex`
    /// entries. Called once with `status = 1` at attempt start and again with
    /// `status = 0` on success, matching the source's write-then-overwrite
    /// pattern.
    pub fn put_transaction_entry(&self, entry: &TransactionEntry) -> Result<(), LedgerError> {
        let key = transaction_key(&entry.tenant_id, &entry.transaction_id);
        let bytes = encode(entry)?;
        self.transactions.insert(key, bytes.clone()).map_err(storage_err)?;
        self.tx_from_index
            .insert(
                account_index_key(&entry.from_account, entry.transaction_date, &entry.transaction_id),
                bytes.clone(),
            )
            .map_err(storage_err)?;
        self.tx_to_index
            .insert(
                account_index_key(&entry.to_account, entry.transaction_date, &entry.transaction_id),
                bytes,
            )
            .map_err(storage_err)?;
        Ok(())
    }

    fn scan_index(tree: &sled::Tree, prefix: &[u8], limit: u32) -> Result<Vec<TransactionEntry>, LedgerError> {
        let mut out = Vec::new();
        for item in tree.scan_prefix(prefix) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(decode(&bytes)?);
            if out.len() as u32 >= limit {
                break;
            }
        }
        Ok(out)
    }

    pub fn get_transactions_from_account(&self, account: &str, limit: u32) -> Result<Vec<TransactionEntry>, LedgerError> {
        Self::scan_index(&self.tx_from_index, account.as_bytes(), limit)
    }

    pub fn get_transactions_to_account(&self, account: &str, limit: u32) -> Result<Vec<TransactionEntry>, LedgerError> {
        Self::scan_index(&self.tx_to_index, account.as_bytes(), limit)
    }

    /// Filtered scan over every `TransactionEntry` for `tenant`; applies
    /// `account`/`status`/date-range predicates in-process since sled has no
    /// query planner.
    pub fn get_all_transactions(
        &self,
        tenant: &str,
        account: Option<&str>,
        status: Option<i32>,
        from_date: Option<i64>,
        to_date: Option<i64>,
        limit: u32,
    ) -> Result<Vec<TransactionEntry>, LedgerError> {
        let prefix = format!("{}\0", tenant);
        let mut out = Vec::new();
        for item in self.transactions.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = item.map_err(storage_err)?;
            let entry: TransactionEntry = decode(&bytes)?;
            if let Some(acc) = account {
                if entry.from_account != acc && entry.to_account != acc {
                    continue;
                }
            }
            if let Some(s) = status {
                if entry.status.code() as i32 != s {
                    continue;
                }
            }
            if let Some(f) = from_date {
                if entry.transaction_date < f {
                    continue;
                }
            }
            if let Some(t) = to_date {
                if entry.transaction_date > t {
                    continue;
                }
            }
            out.push(entry);
            if out.len() as u32 >= limit {
                break;
            }
        }
        Ok(out)
    }

    /// Reconciliation sweep hook: every `TransactionEntry` still at
    /// `status = 1` (failed/in-flight), oldest first — the rows a
    /// crash-between-phases leaves behind for a caller to retry or
    /// compensate (spec's "reconciliation sweep over TransactionEntry rows
    /// with status=1").
    pub fn list_pending_transaction_entries(
        &self,
        tenant: &str,
        limit: u32,
    ) -> Result<Vec<TransactionEntry>, LedgerError> {
        self.get_all_transactions(tenant, None, Some(1), None, None, limit)
    }

    // ── Escrow ────────────────────────────────────────────────────────────────

    /// Idempotency check: an `EscrowTransaction` already exists for this
    /// `InitiatorUUID` if any key under its prefix is present.
    pub fn find_escrow_by_initiator(
        &self,
        initiator_uuid: &str,
    ) -> Result<Option<EscrowTransaction>, LedgerError> {
        let prefix = format!("{}\0", initiator_uuid);
        for item in self.escrow.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = item.map_err(storage_err)?;
            return Ok(Some(decode(&bytes)?));
        }
        Ok(None)
    }

    pub fn put_escrow_transaction(&self, tx: &EscrowTransaction) -> Result<(), LedgerError> {
        let key = escrow_key(&tx.initiator_uuid, &tx.transaction_id);
        let bytes = encode(tx)?;
        self.escrow.insert(key, bytes.clone()).map_err(storage_err)?;
        self.escrow_from_tenant_index
            .insert(
                escrow_from_tenant_key(&tx.from_tenant_id, &tx.initiator_uuid, &tx.transaction_id),
                bytes,
            )
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_escrow_transactions_by_from_tenant(
        &self,
        from_tenant: &str,
        limit: u32,
    ) -> Result<Vec<EscrowTransaction>, LedgerError> {
        let prefix = format!("{}\0", from_tenant);
        let mut out = Vec::new();
        for item in self.escrow_from_tenant_index.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(decode(&bytes)?);
            if out.len() as u32 >= limit {
                break;
            }
        }
        Ok(out)
    }

    // ── Service providers ────────────────────────────────────────────────────

    pub fn get_provider(&self, email: &str) -> Result<Option<ServiceProvider>, LedgerError> {
        match self.providers.get(email.as_bytes()).map_err(storage_err)? {
            Some(b) => Ok(Some(decode(&b)?)),
            None => Ok(None),
        }
    }

    pub fn create_provider(&self, provider: &ServiceProvider) -> Result<(), LedgerError> {
        let bytes = encode(provider)?;
        let prev = self
            .providers
            .compare_and_swap(provider.email.as_bytes(), None as Option<&[u8]>, Some(bytes))
            .map_err(storage_err)?;
        if prev.is_err() {
            return Err(LedgerError::ProviderAlreadyRegistered(provider.email.clone()));
        }
        Ok(())
    }

    pub fn put_provider(&self, provider: &ServiceProvider) -> Result<(), LedgerError> {
        self.providers
            .insert(provider.email.as_bytes(), encode(provider)?)
            .map_err(storage_err)?;
        Ok(())
    }

    /// `seq` comes from [`StateDb::next_id`] rather than a per-provider
    /// counter tree: two deliveries to the same provider landing in the
    /// same second are routine (retries), and `generate_id` is already
    /// cluster-wide monotonic.
    pub fn put_provider_transaction(&self, pt: &ServiceProviderTransaction) -> Result<(), LedgerError> {
        let seq = self.next_id()?;
        let key = provider_tx_key(&pt.service_provider, pt.transaction_date, seq);
        self.provider_transactions
            .insert(key, encode(pt)?)
            .map_err(storage_err)?;
        Ok(())
    }

    /// `(ServiceProvider, TransactionDate)` range query; `start`/`end` are
    /// inclusive Unix-seconds bounds, already resolved and ordered by the
    /// caller (see `ledger-store::query`).
    pub fn query_provider_transactions(
        &self,
        provider: &str,
        start: i64,
        end: i64,
        page_size: u32,
    ) -> Result<Vec<ServiceProviderTransaction>, LedgerError> {
        let lower = provider_tx_key(provider, start, 0);
        let upper = provider_tx_key(provider, end, u64::MAX);
        let mut out = Vec::new();
        for item in self.provider_transactions.range(lower..=upper) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(decode(&bytes)?);
            if out.len() as u32 >= page_size {
                break;
            }
        }
        Ok(out)
    }

    // ── QR payments ───────────────────────────────────────────────────────────

    pub fn get_qr_payment(
        &self,
        tenant: &str,
        payment_id: &str,
    ) -> Result<Option<QrPaymentRequest>, LedgerError> {
        match self.qr_payments.get(qr_key(tenant, payment_id)).map_err(storage_err)? {
            Some(b) => Ok(Some(decode(&b)?)),
            None => Ok(None),
        }
    }

    pub fn put_qr_payment(&self, req: &QrPaymentRequest) -> Result<(), LedgerError> {
        let key = qr_key(&req.tenant_id, &req.payment_id);
        let bytes = encode(req)?;
        self.qr_payments.insert(key, bytes.clone()).map_err(storage_err)?;
        self.qr_creator_index
            .insert(
                qr_creator_key(&req.tenant_id, &req.account_id, &req.payment_id),
                bytes,
            )
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_qr_payments_for_creator(
        &self,
        tenant: &str,
        creator: &str,
    ) -> Result<Vec<QrPaymentRequest>, LedgerError> {
        let prefix = format!("{}\0{}\0", tenant, creator);
        let mut out = Vec::new();
        for item in self.qr_creator_index.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }
}
