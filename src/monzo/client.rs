use super::MonzoOperations;
use super::auth::MonzoAuth;
use super::token::Token;
use super::types::{
    AccountsResponse, ApiError, PotsResponse, TransactionResponse, TransactionsResponse,
    WebhookResponse, WebhooksResponse,
};
use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use crate::models::{
    Account, AccountType, Balance, FeedItem, Pagination, Pot, PotTransfer, Transaction, Webhook,
    Whoami,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("monzo-cli/", env!("CARGO_PKG_VERSION"));

/// Authenticated Monzo API client.
///
/// Tokens with a refresh token (and the client credentials to redeem it) are
/// refreshed transparently once they expire. Static tokens are sent as-is.
pub struct MonzoClient {
    client: Client,
    api_base_url: String,
    token: Mutex<Token>,
    refresher: Option<MonzoAuth>,
}

impl MonzoClient {
    pub fn new(api: &ApiConfig, token: Token) -> Result<Self> {
        token.validate()?;

        let refresher = match (&token.refresh_token, &token.client_id, &token.client_secret) {
            (Some(_), Some(client_id), Some(client_secret)) => {
                Some(MonzoAuth::new(api, client_id, client_secret)?)
            }
            _ => None,
        };

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build reqwest client: {}", e)))?;

        Ok(Self {
            client,
            api_base_url: api.base_url.trim_end_matches('/').to_string(),
            token: Mutex::new(token),
            refresher,
        })
    }

    /// Run the interactive OAuth2 flow and return the resulting token
    #[instrument(name = "Authenticating to Monzo", skip_all)]
    pub async fn authenticate(api: &ApiConfig, client_id: &str, client_secret: &str) -> Result<Token> {
        MonzoAuth::new(api, client_id, client_secret)?
            .authenticate()
            .await
    }

    /// The token currently in use, which may have been refreshed since the client was built
    pub async fn token(&self) -> Token {
        self.token.lock().await.clone()
    }

    /// Expire the token so that the next request refreshes it
    pub async fn refresh_on_next_request(&self) {
        self.token.lock().await.invalidate();
    }

    /// Refresh the token now by expiring it and calling whoami
    #[instrument(name = "Refreshing token", skip_all)]
    pub async fn force_refresh(&self) -> Result<()> {
        self.refresh_on_next_request().await;
        self.whoami().await?;

        Ok(())
    }

    async fn access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;

        if let Some(refresher) = &self.refresher {
            if token.is_expired(Utc::now()) {
                debug!("Access token expired, refreshing...");
                *token = refresher.refresh(&token).await?;
                debug!("Token refresh successful");
            }
        }

        Ok(token.access_token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let access_token = self.access_token().await?;
        let response = request
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_body(status, &body).into());
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(self.send(request).await?.json().await?)
    }

    fn require(value: &str, name: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(AppError::Config(format!("{} cannot be empty", name)));
        }

        Ok(())
    }

    async fn transfer_pot(
        &self,
        pot_id: &str,
        action: &str,
        account_field: &'static str,
        transfer: &PotTransfer,
    ) -> Result<Pot> {
        Self::require(pot_id, "pot id")?;
        transfer.validate().map_err(AppError::Config)?;

        let form = [
            (account_field, transfer.account_id.clone()),
            ("amount", transfer.amount.to_string()),
            ("dedupe_id", transfer.dedupe_id.clone()),
        ];
        let request = self
            .client
            .put(self.url(&format!("/pots/{}/{}", pot_id, action)))
            .form(&form);

        self.send_json(request).await
    }

    fn expand_query(expand_merchant: bool) -> Vec<(&'static str, String)> {
        match expand_merchant {
            true => vec![("expand[]", "merchant".to_string())],
            false => Vec::new(),
        }
    }
}

#[async_trait]
impl MonzoOperations for MonzoClient {
    #[instrument(name = "Checking auth status", skip_all)]
    async fn whoami(&self) -> Result<Whoami> {
        self.send_json(self.client.get(self.url("/ping/whoami")))
            .await
    }

    #[instrument(name = "Fetching accounts", skip_all)]
    async fn list_accounts(&self, account_type: Option<AccountType>) -> Result<Vec<Account>> {
        let mut request = self.client.get(self.url("/accounts"));
        if let Some(account_type) = account_type {
            request = request.query(&[("account_type", account_type.as_str())]);
        }

        let accounts: AccountsResponse = self.send_json(request).await?;

        Ok(accounts.accounts)
    }

    #[instrument(name = "Fetching balance", skip_all, fields(account_id))]
    async fn get_balance(&self, account_id: &str) -> Result<Balance> {
        let request = self
            .client
            .get(self.url("/balance"))
            .query(&[("account_id", account_id)]);

        self.send_json(request).await
    }

    #[instrument(name = "Fetching transactions", skip_all, fields(account_id))]
    async fn list_transactions(
        &self,
        account_id: &str,
        expand_merchant: bool,
        pagination: Option<&Pagination>,
    ) -> Result<Vec<Transaction>> {
        let mut query = vec![("account_id", account_id.to_string())];
        query.extend(Self::expand_query(expand_merchant));
        if let Some(pagination) = pagination {
            query.extend(pagination.query_pairs());
        }

        let request = self.client.get(self.url("/transactions")).query(&query);
        let transactions: TransactionsResponse = self.send_json(request).await?;

        Ok(transactions
            .transactions
            .into_iter()
            .map(Into::into)
            .collect())
    }

    #[instrument(name = "Fetching transaction", skip_all, fields(transaction_id))]
    async fn get_transaction(
        &self,
        transaction_id: &str,
        expand_merchant: bool,
    ) -> Result<Transaction> {
        let request = self
            .client
            .get(self.url(&format!("/transactions/{}", transaction_id)))
            .query(&Self::expand_query(expand_merchant));
        let transaction: TransactionResponse = self.send_json(request).await?;

        Ok(transaction.transaction.into())
    }

    #[instrument(name = "Annotating transaction", skip_all, fields(transaction_id))]
    async fn annotate_transaction(
        &self,
        transaction_id: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<Transaction> {
        let mut form: Vec<(String, &str)> = metadata
            .iter()
            .map(|(key, value)| (format!("metadata[{}]", key), value.as_str()))
            .collect();
        form.sort();

        let request = self
            .client
            .patch(self.url(&format!("/transactions/{}", transaction_id)))
            .form(&form);
        let transaction: TransactionResponse = self.send_json(request).await?;

        Ok(transaction.transaction.into())
    }

    #[instrument(name = "Fetching pots", skip_all, fields(account_id))]
    async fn list_pots(&self, account_id: &str) -> Result<Vec<Pot>> {
        let request = self
            .client
            .get(self.url("/pots"))
            .query(&[("current_account_id", account_id)]);
        let pots: PotsResponse = self.send_json(request).await?;

        Ok(pots.pots)
    }

    #[instrument(name = "Fetching pot", skip_all, fields(pot_id))]
    async fn get_pot(&self, pot_id: &str) -> Result<Pot> {
        Self::require(pot_id, "pot id")?;

        self.send_json(self.client.get(self.url(&format!("/pots/{}", pot_id))))
            .await
    }

    #[instrument(name = "Depositing into pot", skip_all, fields(pot_id))]
    async fn deposit_into_pot(&self, pot_id: &str, transfer: &PotTransfer) -> Result<Pot> {
        self.transfer_pot(pot_id, "deposit", "source_account_id", transfer)
            .await
    }

    #[instrument(name = "Withdrawing from pot", skip_all, fields(pot_id))]
    async fn withdraw_from_pot(&self, pot_id: &str, transfer: &PotTransfer) -> Result<Pot> {
        self.transfer_pot(pot_id, "withdraw", "destination_account_id", transfer)
            .await
    }

    #[instrument(name = "Creating feed item", skip_all)]
    async fn create_feed_item(&self, item: &FeedItem) -> Result<()> {
        Self::require(&item.account_id, "account id")?;
        Self::require(&item.params.title, "title")?;
        Self::require(&item.params.image_url, "image url")?;

        self.send(self.client.post(self.url("/feed")).json(item))
            .await?;

        Ok(())
    }

    #[instrument(name = "Registering webhook", skip_all, fields(account_id))]
    async fn register_webhook(&self, account_id: &str, url: &str) -> Result<Webhook> {
        Self::require(account_id, "account id")?;
        Self::require(url, "url")?;

        let request = self
            .client
            .post(self.url("/webhooks"))
            .form(&[("account_id", account_id), ("url", url)]);
        let webhook: WebhookResponse = self.send_json(request).await?;

        Ok(webhook.webhook)
    }

    #[instrument(name = "Fetching webhooks", skip_all, fields(account_id))]
    async fn list_webhooks(&self, account_id: &str) -> Result<Vec<Webhook>> {
        let request = self
            .client
            .get(self.url("/webhooks"))
            .query(&[("account_id", account_id)]);
        let webhooks: WebhooksResponse = self.send_json(request).await?;

        Ok(webhooks.webhooks)
    }

    #[instrument(name = "Deleting webhook", skip_all, fields(webhook_id))]
    async fn delete_webhook(&self, webhook_id: &str) -> Result<()> {
        Self::require(webhook_id, "webhook id")?;

        self.send(self.client.delete(self.url(&format!("/webhooks/{}", webhook_id))))
            .await?;

        Ok(())
    }

    #[instrument(name = "Revoking token", skip_all)]
    async fn logout(&self) -> Result<()> {
        self.send(self.client.post(self.url("/oauth2/logout")))
            .await?;

        Ok(())
    }
}
