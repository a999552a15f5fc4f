use crate::models::{Account, Merchant, Pot, Transaction, Webhook};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

// https://docs.monzo.com/#errors
#[derive(Debug, Clone, Default, Deserialize, Error)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    #[serde(default)]
    pub retryable: Option<serde_json::Value>,
}

impl ApiError {
    /// Decode an error body, keeping the raw body as the message if it isn't a Monzo error.
    pub(super) fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiError>(body) {
            Ok(error) if !error.code.is_empty() || !error.message.is_empty() => {
                ApiError { status, ..error }
            }
            _ => ApiError {
                status,
                message: body.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        match &self.retryable {
            Some(serde_json::Value::Bool(retryable)) => *retryable,
            Some(serde_json::Value::Object(hint)) => !hint.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status, self.code, self.message)?;
        if self.is_retryable() {
            f.write_str(" (retryable)")?;
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AccountsResponse {
    pub(super) accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PotsResponse {
    pub(super) pots: Vec<Pot>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WebhookResponse {
    pub(super) webhook: Webhook,
}

#[derive(Debug, Deserialize)]
pub(super) struct WebhooksResponse {
    pub(super) webhooks: Vec<Webhook>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionsResponse {
    pub(super) transactions: Vec<MonzoTransaction>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionResponse {
    pub(super) transaction: MonzoTransaction,
}

/// The merchant as sent by the API: a full object with `expand[]=merchant`, otherwise its id.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MerchantField {
    Collapsed(String),
    Expanded(Merchant),
}

impl MerchantField {
    fn normalize(self) -> Option<Merchant> {
        match self {
            MerchantField::Collapsed(id) if id.is_empty() => None,
            MerchantField::Collapsed(id) => Some(Merchant::from_id(id)),
            MerchantField::Expanded(merchant) => Some(merchant),
        }
    }
}

// https://docs.monzo.com/#transactions
#[derive(Debug, Deserialize)]
pub struct MonzoTransaction {
    pub id: String,
    pub account_id: String,
    pub amount: i64,
    pub currency: String,
    pub created: DateTime<Utc>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub settled: Option<String>,
    pub updated: Option<String>,
    pub local_amount: Option<i64>,
    pub local_currency: Option<String>,
    pub amount_is_pending: Option<bool>,
    pub include_in_spending: Option<bool>,
    pub merchant: Option<MerchantField>,
    pub metadata: Option<HashMap<String, String>>,
}

impl From<MonzoTransaction> for Transaction {
    fn from(tx: MonzoTransaction) -> Self {
        Transaction {
            id: tx.id,
            account_id: tx.account_id,
            amount: tx.amount,
            currency: tx.currency,
            created: tx.created,
            description: tx.description.unwrap_or_default(),
            category: tx.category.unwrap_or_default(),
            notes: tx.notes.unwrap_or_default(),
            settled: tx.settled.unwrap_or_default(),
            updated: tx.updated.unwrap_or_default(),
            local_amount: tx.local_amount.unwrap_or_default(),
            local_currency: tx.local_currency.unwrap_or_default(),
            amount_is_pending: tx.amount_is_pending.unwrap_or_default(),
            include_in_spending: tx.include_in_spending.unwrap_or_default(),
            merchant: tx.merchant.and_then(MerchantField::normalize),
            metadata: tx.metadata.unwrap_or_default(),
        }
    }
}
