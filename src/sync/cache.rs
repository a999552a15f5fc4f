use crate::error::{AppError, Result};
use crate::models::{Pagination, Transaction, TransactionList};
use crate::storage;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Transactions fetched from Monzo, keyed by account id and persisted as JSON.
///
/// Every mutation is written straight back to disk. There is no locking, so
/// concurrent invocations race on the file.
#[derive(Debug)]
pub struct TransactionCache {
    path: PathBuf,
    accounts: BTreeMap<String, TransactionList>,
}

impl TransactionCache {
    /// Load the cache, treating a missing or unreadable file as empty
    #[instrument(name = "Loading transaction cache", skip_all)]
    pub fn load(path: PathBuf) -> Self {
        let accounts = match storage::read_json(&path) {
            Ok(Some(accounts)) => accounts,
            Ok(None) => {
                debug!(path = ?path, "No transaction cache found");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(path = ?path, "Ignoring unreadable transaction cache: {}", e);
                BTreeMap::new()
            }
        };

        Self { path, accounts }
    }

    /// Load a cache that must already exist
    pub fn load_existing(path: PathBuf) -> Result<Self> {
        let accounts = storage::read_json(&path)
            .map_err(|e| AppError::Cache(format!("Failed to read {:?}: {}", path, e)))?
            .ok_or_else(|| AppError::Cache(format!("No transaction cache at {:?}", path)))?;

        Ok(Self { path, accounts })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when no account has any cached transactions
    pub fn is_empty(&self) -> bool {
        self.accounts.values().all(|list| list.transactions.is_empty())
    }

    pub fn contains_account(&self, account_id: &str) -> bool {
        self.accounts
            .get(account_id)
            .is_some_and(|list| !list.transactions.is_empty())
    }

    /// Number of cached transactions per account
    pub fn accounts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.accounts
            .iter()
            .map(|(id, list)| (id.as_str(), list.transactions.len()))
    }

    /// Insert a transaction, replacing any existing one with the same id in place
    pub fn upsert(&mut self, account_id: &str, transaction: Transaction) -> Result<()> {
        let list = self.accounts.entry(account_id.to_string()).or_default();

        match list
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction.id)
        {
            Some(existing) => *existing = transaction,
            None => list.transactions.push(transaction),
        }

        self.save()
    }

    /// Upsert each transaction in turn. A failure part way through leaves the earlier ones saved.
    pub fn upsert_multi(
        &mut self,
        account_id: &str,
        transactions: impl IntoIterator<Item = Transaction>,
    ) -> Result<()> {
        for transaction in transactions {
            self.upsert(account_id, transaction)?;
        }

        Ok(())
    }

    /// Find a transaction by id, in one account or across all of them
    pub fn find(&self, account_id: Option<&str>, transaction_id: &str) -> Option<&Transaction> {
        match account_id.filter(|id| !id.is_empty()) {
            Some(account_id) => self
                .accounts
                .get(account_id)?
                .transactions
                .iter()
                .find(|t| t.id == transaction_id),
            None => self
                .accounts
                .values()
                .flat_map(|list| list.transactions.iter())
                .find(|t| t.id == transaction_id),
        }
    }

    /// Transactions for an account within `pagination`, in storage order.
    /// Without pagination the whole list is returned unfiltered.
    pub fn find_multi(&self, account_id: &str, pagination: Option<&Pagination>) -> Vec<Transaction> {
        self.find_multi_at(account_id, pagination, Utc::now())
    }

    fn find_multi_at(
        &self,
        account_id: &str,
        pagination: Option<&Pagination>,
        now: DateTime<Utc>,
    ) -> Vec<Transaction> {
        let Some(list) = self.accounts.get(account_id) else {
            return Vec::new();
        };

        let Some(pagination) = pagination else {
            return list.transactions.clone();
        };

        let matching = list
            .transactions
            .iter()
            .filter(|t| pagination.contains(t.created, now))
            .cloned();

        match pagination.max_results() {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }

    pub fn save(&self) -> Result<()> {
        storage::write_json(&self.path, &self.accounts)
            .map_err(|e| AppError::Cache(format!("Failed to write {:?}: {}", self.path, e)))
    }

    /// Delete the cache file
    pub fn clear(&mut self) -> Result<()> {
        self.accounts.clear();
        storage::remove_file(&self.path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::test_helpers::{mock_datetime, mock_transaction};
    use std::collections::HashSet;

    fn empty_cache(dir: &tempfile::TempDir) -> TransactionCache {
        TransactionCache::load(dir.path().join("transactions.json"))
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = empty_cache(&dir);

        assert!(cache.is_empty());
        assert_eq!(cache.accounts().count(), 0);
    }

    #[test]
    fn test_load_unreadable_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(TransactionCache::load(path.clone()).is_empty());
        assert!(matches!(
            TransactionCache::load_existing(path),
            Err(AppError::Cache(_))
        ));
    }

    #[test]
    fn test_load_existing_requires_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = TransactionCache::load_existing(dir.path().join("transactions.json"));

        assert!(matches!(result, Err(AppError::Cache(_))));
    }

    #[test]
    fn test_upsert_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = empty_cache(&dir);
        let tx = mock_transaction("tx_1", "acc_1", -100, mock_datetime(2025, 1, 1));

        cache.upsert("acc_1", tx.clone()).unwrap();

        let reloaded = TransactionCache::load_existing(cache.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.find(Some("acc_1"), "tx_1"), Some(&tx));
        assert!(reloaded.contains_account("acc_1"));
        assert!(!reloaded.contains_account("acc_2"));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = empty_cache(&dir);
        let tx = mock_transaction("tx_1", "acc_1", -100, mock_datetime(2025, 1, 1));
        let updated = Transaction {
            description: "Updated description".to_string(),
            ..tx.clone()
        };

        cache.upsert("acc_1", tx).unwrap();
        cache.upsert("acc_1", updated.clone()).unwrap();

        assert_eq!(
            cache.find_multi("acc_1", None),
            vec![updated],
            "duplicate ids should be replaced with the latest data"
        );
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = empty_cache(&dir);
        let tx_1 = mock_transaction("tx_1", "acc_1", -100, mock_datetime(2025, 1, 1));
        let tx_2 = mock_transaction("tx_2", "acc_1", -200, mock_datetime(2025, 1, 2));
        let tx_1_updated = Transaction {
            notes: "updated".to_string(),
            ..tx_1.clone()
        };

        cache
            .upsert_multi("acc_1", vec![tx_1, tx_2.clone()])
            .unwrap();
        cache.upsert("acc_1", tx_1_updated.clone()).unwrap();

        assert_eq!(cache.find_multi("acc_1", None), vec![tx_1_updated, tx_2]);
    }

    #[test]
    fn test_upsert_multi_twice_matches_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = empty_cache(&dir);
        let transactions: Vec<Transaction> = (1..=3)
            .map(|day| {
                mock_transaction(
                    &format!("tx_{day}"),
                    "acc_1",
                    -100 * day as i64,
                    mock_datetime(2025, 1, day),
                )
            })
            .collect();

        cache.upsert_multi("acc_1", transactions.clone()).unwrap();
        let once: HashSet<String> = cache
            .find_multi("acc_1", None)
            .into_iter()
            .map(|t| t.id)
            .collect();

        cache.upsert_multi("acc_1", transactions).unwrap();
        let twice = cache.find_multi("acc_1", None);

        assert_eq!(twice.len(), 3);
        assert_eq!(twice.into_iter().map(|t| t.id).collect::<HashSet<_>>(), once);
    }

    #[test]
    fn test_find_across_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = empty_cache(&dir);
        let tx_1 = mock_transaction("tx_1", "acc_1", -100, mock_datetime(2025, 1, 1));
        let tx_2 = mock_transaction("tx_2", "acc_2", -200, mock_datetime(2025, 1, 2));
        cache.upsert("acc_1", tx_1).unwrap();
        cache.upsert("acc_2", tx_2.clone()).unwrap();

        assert_eq!(cache.find(None, "tx_2"), Some(&tx_2));
        assert_eq!(cache.find(Some(""), "tx_2"), Some(&tx_2));
        assert_eq!(cache.find(Some("acc_2"), "tx_2"), Some(&tx_2));
        assert_eq!(cache.find(Some("acc_1"), "tx_2"), None);
        assert_eq!(cache.find(None, "tx_3"), None);
    }

    #[test]
    fn test_find_multi_window_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = empty_cache(&dir);
        let t1 = mock_datetime(2025, 1, 1);
        let t2 = mock_datetime(2025, 1, 2);
        let t3 = mock_datetime(2025, 1, 3);
        let tx_2 = mock_transaction("tx_2", "acc_1", -200, t2);
        cache
            .upsert_multi(
                "acc_1",
                vec![
                    mock_transaction("tx_1", "acc_1", -100, t1),
                    tx_2.clone(),
                    mock_transaction("tx_3", "acc_1", -300, t3),
                ],
            )
            .unwrap();
        let pagination = Pagination::new(None, Some(t1), Some(t3));

        assert_eq!(cache.find_multi("acc_1", pagination.as_ref()), vec![tx_2]);
    }

    #[test]
    fn test_find_multi_limit_keeps_storage_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = empty_cache(&dir);
        // Stored out of chronological order on purpose
        let transactions: Vec<Transaction> = [5, 3, 1, 4, 2]
            .into_iter()
            .map(|day| {
                mock_transaction(&format!("tx_{day}"), "acc_1", -100, mock_datetime(2025, 1, day))
            })
            .collect();
        cache.upsert_multi("acc_1", transactions.clone()).unwrap();
        let pagination = Pagination::new(Some(2), None, None);

        let found = cache.find_multi_at("acc_1", pagination.as_ref(), mock_datetime(2025, 6, 1));

        assert_eq!(found, transactions[..2].to_vec());
    }

    #[test]
    fn test_find_multi_before_defaults_to_now() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = empty_cache(&dir);
        let past = mock_transaction("tx_past", "acc_1", -100, mock_datetime(2025, 1, 1));
        let future = mock_transaction("tx_future", "acc_1", -100, mock_datetime(2025, 12, 1));
        cache
            .upsert_multi("acc_1", vec![past.clone(), future.clone()])
            .unwrap();
        let pagination = Pagination::new(Some(10), None, None);

        let found = cache.find_multi_at("acc_1", pagination.as_ref(), mock_datetime(2025, 6, 1));
        assert_eq!(found, vec![past.clone()]);

        let unfiltered = cache.find_multi_at("acc_1", None, mock_datetime(2025, 6, 1));
        assert_eq!(unfiltered, vec![past, future]);
    }

    #[test]
    fn test_find_multi_unknown_account() {
        let dir = tempfile::tempdir().unwrap();
        let cache = empty_cache(&dir);

        assert!(cache.find_multi("acc_1", None).is_empty());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = empty_cache(&dir);
        cache
            .upsert(
                "acc_1",
                mock_transaction("tx_1", "acc_1", -100, mock_datetime(2025, 1, 1)),
            )
            .unwrap();

        cache.clear().unwrap();

        assert!(cache.is_empty());
        assert!(!cache.path().exists());
    }
}
