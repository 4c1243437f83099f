//! Read-side query surface — spec.md §4.6.
//!
//! Every method here is a scan or range-query over the `sled::Tree`s
//! `StateDb` already exposes; no method mutates state. Ordering and
//! default-window choices intentionally mirror the source store's GSI
//! query semantics rather than imposing an opinionated re-sort.

use ledger_core::{
    normalize_tenant, LedgerError, ServiceProviderTransaction, TransactionEntry, DEFAULT_QUERY_LIMIT,
    DEFAULT_WINDOW_DAYS,
};

use crate::db::StateDb;

/// Filters accepted by [`get_all_transactions`].
#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    pub account: Option<String>,
    pub status: Option<i32>,
    pub from_date: Option<i64>,
    pub to_date: Option<i64>,
    pub limit: Option<u32>,
}

/// Paginated scan of `LedgerEntry` rows for one account.
pub fn get_transactions(
    db: &StateDb,
    account: &str,
    limit: u32,
    cursor: Option<Vec<u8>>,
) -> Result<(Vec<ledger_core::LedgerEntry>, Option<Vec<u8>>), LedgerError> {
    db.get_transactions_for_account(account, limit, cursor)
}

/// Union of the `FromAccount` and `ToAccount` indexes. Deliberately **not**
/// re-sorted or deduplicated — spec.md §8 calls this out as unspecified
/// ordering downstream consumers must not rely on.
pub fn get_detailed_transactions(
    db: &StateDb,
    account: &str,
    limit: u32,
) -> Result<Vec<TransactionEntry>, LedgerError> {
    let mut out = db.get_transactions_from_account(account, limit)?;
    out.extend(db.get_transactions_to_account(account, limit)?);
    Ok(out)
}

/// Filtered scan over every `TransactionEntry` for `tenant`.
/// `filter.limit` defaults to [`DEFAULT_QUERY_LIMIT`] when unset.
pub fn get_all_transactions(
    db: &StateDb,
    tenant: &str,
    filter: TransactionFilter,
) -> Result<Vec<TransactionEntry>, LedgerError> {
    let tenant = normalize_tenant(tenant);
    db.get_all_transactions(
        &tenant,
        filter.account.as_deref(),
        filter.status,
        filter.from_date,
        filter.to_date,
        filter.limit.unwrap_or(DEFAULT_QUERY_LIMIT),
    )
}

/// Reconciliation sweep: every `TransactionEntry` still `FailedOrPending`.
pub fn list_pending_transaction_entries(
    db: &StateDb,
    tenant: &str,
    limit: u32,
) -> Result<Vec<TransactionEntry>, LedgerError> {
    db.list_pending_transaction_entries(&normalize_tenant(tenant), limit)
}

/// Parse a date argument that may be a Unix-seconds integer string or an
/// RFC-3339 timestamp. Returns `None` on parse failure so the caller can
/// fall back to its own default.
fn parse_date(raw: &str) -> Option<i64> {
    if let Ok(secs) = raw.parse::<i64>() {
        return Some(secs);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp())
}

/// `(ServiceProvider, TransactionDate)` range query. `start_date`/`end_date`
/// accept Unix-seconds or RFC-3339 strings; an unparseable or absent start
/// defaults to "30 days ago", an unparseable or absent end defaults to
/// "now". If the resolved bounds are reversed, they are swapped rather than
/// treated as an empty range.
pub fn query_service_provider_transactions(
    db: &StateDb,
    provider: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
    page_size: Option<u32>,
) -> Result<Vec<ServiceProviderTransaction>, LedgerError> {
    let now = ledger_core::unix_now();
    let default_start = now - DEFAULT_WINDOW_DAYS * 24 * 60 * 60;

    let mut start = start_date.and_then(parse_date).unwrap_or(default_start);
    let mut end = end_date.and_then(parse_date).unwrap_or(now);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }

    db.query_provider_transactions(provider, start, end, page_size.unwrap_or(DEFAULT_QUERY_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{new_id, Account, CURRENCY};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn temp_db() -> (Arc<StateDb>, PathBuf) {
        let mut path = std::env::temp_dir();
        path.push(format!("ledger-store-query-test-{}", new_id()));
        let db = Arc::new(StateDb::open(&path).expect("open test db"));
        (db, path)
    }

    fn seed_account(db: &StateDb, tenant: &str, account: &str, amount: &str) {
        let acc = Account::new(
            tenant.to_string(),
            account.to_string(),
            amount.parse().unwrap(),
            CURRENCY.to_string(),
            ledger_core::unix_now(),
        );
        db.create_account(&acc).expect("seed account");
    }

    #[test]
    fn unix_seconds_and_rfc3339_both_parse() {
        assert_eq!(parse_date("1723293636"), Some(1723293636));
        assert_eq!(
            parse_date("2024-08-10T12:40:36Z"),
            Some(1723293636)
        );
        assert_eq!(parse_date("not-a-date"), None);
    }

    #[test]
    fn default_all_transactions_window_applies_limit() {
        let (db, path) = temp_db();
        seed_account(&db, "nil", "A", "100");
        seed_account(&db, "nil", "B", "0");
        use crate::transfer::{TransferEngine, TransferEntry};
        let engine = TransferEngine::new(Arc::clone(&db));
        for _ in 0..3 {
            engine
                .transfer(TransferEntry::within_tenant(
                    "nil",
                    "A".to_string(),
                    "B".to_string(),
                    "1".parse().unwrap(),
                    new_id(),
                ))
                .unwrap();
        }
        let rows = get_all_transactions(&db, "nil", TransactionFilter::default()).unwrap();
        assert_eq!(rows.len(), 3);

        let limited = get_all_transactions(
            &db,
            "nil",
            TransactionFilter {
                limit: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(limited.len(), 2);

        let _ = std::fs::remove_dir_all(&path);
    }
}
