mod auth;
mod client;
#[cfg(test)]
pub(crate) mod fake;
mod token;
pub mod types;

pub use client::MonzoClient;
pub use token::{Token, TokenStore};
pub use types::ApiError;

use crate::error::Result;
use crate::models::{
    Account, AccountType, Balance, FeedItem, Pagination, Pot, PotTransfer, Transaction, Webhook,
    Whoami,
};

use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait MonzoOperations {
    async fn whoami(&self) -> Result<Whoami>;

    async fn list_accounts(&self, account_type: Option<AccountType>) -> Result<Vec<Account>>;

    async fn get_balance(&self, account_id: &str) -> Result<Balance>;

    async fn list_transactions(
        &self,
        account_id: &str,
        expand_merchant: bool,
        pagination: Option<&Pagination>,
    ) -> Result<Vec<Transaction>>;

    async fn get_transaction(&self, transaction_id: &str, expand_merchant: bool)
    -> Result<Transaction>;

    /// Note: Monzo doesn't reliably persist annotations, so the returned
    /// transaction may not reflect `metadata`.
    async fn annotate_transaction(
        &self,
        transaction_id: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<Transaction>;

    async fn list_pots(&self, account_id: &str) -> Result<Vec<Pot>>;

    async fn get_pot(&self, pot_id: &str) -> Result<Pot>;

    /// Move money from `transfer.account_id` into the pot
    async fn deposit_into_pot(&self, pot_id: &str, transfer: &PotTransfer) -> Result<Pot>;

    /// Move money from the pot into `transfer.account_id`
    async fn withdraw_from_pot(&self, pot_id: &str, transfer: &PotTransfer) -> Result<Pot>;

    async fn create_feed_item(&self, item: &FeedItem) -> Result<()>;

    async fn register_webhook(&self, account_id: &str, url: &str) -> Result<Webhook>;

    async fn list_webhooks(&self, account_id: &str) -> Result<Vec<Webhook>>;

    async fn delete_webhook(&self, webhook_id: &str) -> Result<()>;

    /// Revoke the access and refresh tokens
    async fn logout(&self) -> Result<()>;
}
