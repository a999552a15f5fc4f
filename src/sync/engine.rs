use super::cache::TransactionCache;
use crate::error::Result;
use crate::models::{Pagination, Transaction};
use crate::monzo::MonzoOperations;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Skip the cache and call the API
    pub no_cache: bool,
    /// Ask the API for full merchant details
    pub expand_merchants: bool,
}

/// Serves transactions from the local cache, falling back to the Monzo API.
pub struct TransactionEngine<'a, C> {
    client: &'a C,
    cache: TransactionCache,
}

impl<'a, C> TransactionEngine<'a, C>
where
    C: MonzoOperations + Sync,
{
    pub fn new(client: &'a C, cache: TransactionCache) -> Self {
        Self { client, cache }
    }

    #[cfg(test)]
    pub fn cache(&self) -> &TransactionCache {
        &self.cache
    }

    /// List an account's transactions, fetching them first if the account
    /// isn't cached or `no_cache` is set.
    #[instrument(name = "Listing transactions", skip_all, fields(account_id))]
    pub async fn list(
        &mut self,
        account_id: &str,
        pagination: Option<&Pagination>,
        options: FetchOptions,
    ) -> Result<Vec<Transaction>> {
        if options.no_cache || !self.cache.contains_account(account_id) {
            let transactions = self
                .client
                .list_transactions(account_id, options.expand_merchants, pagination)
                .await?;
            info!(count = transactions.len(), "Fetched transactions");

            self.cache.upsert_multi(account_id, transactions)?;
        } else {
            debug!("Serving transactions from cache");
        }

        Ok(self.cache.find_multi(account_id, pagination))
    }

    /// Get a single transaction.
    ///
    /// With an empty cache or `no_cache` the transaction is fetched and cached
    /// under its own account. Otherwise only the cache is searched, within
    /// `account_id` if given.
    #[instrument(name = "Getting transaction", skip_all, fields(transaction_id))]
    pub async fn get(
        &mut self,
        transaction_id: &str,
        account_id: Option<&str>,
        options: FetchOptions,
    ) -> Result<Option<Transaction>> {
        if options.no_cache || self.cache.is_empty() {
            let transaction = self
                .client
                .get_transaction(transaction_id, options.expand_merchants)
                .await?;

            self.cache
                .upsert(&transaction.account_id, transaction.clone())?;

            return Ok(Some(transaction));
        }

        debug!("Serving transaction from cache");
        Ok(self.cache.find(account_id, transaction_id).cloned())
    }

    /// Annotate a transaction and cache the result.
    ///
    /// The API doesn't reliably apply annotations, so `metadata` is merged into
    /// the returned transaction before caching it.
    #[instrument(name = "Annotating transaction", skip_all, fields(transaction_id))]
    pub async fn annotate(
        &mut self,
        transaction_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Transaction> {
        let mut transaction = self
            .client
            .annotate_transaction(transaction_id, &metadata)
            .await?;
        transaction.metadata.extend(metadata);

        self.cache
            .upsert(&transaction.account_id, transaction.clone())?;

        Ok(transaction)
    }
}
