use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A movement of funds into or out of an account.
///
/// Negative amounts are debits (spending), positive amounts are credits. Amounts
/// are in minor units of `currency`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub amount: i64,
    pub currency: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub settled: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub local_amount: i64,
    #[serde(default)]
    pub local_currency: String,
    #[serde(default)]
    pub amount_is_pending: bool,
    #[serde(default)]
    pub include_in_spending: bool,
    #[serde(default)]
    pub merchant: Option<Merchant>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Transactions for a single account, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TransactionList {
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Merchant {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub logo: String,
    pub emoji: String,
    pub category: String,
    pub created: String,
    pub online: bool,
    pub atm: bool,
    pub address: MerchantAddress,
    pub disable_feedback: bool,
    pub suggested_tags: String,
    pub metadata: HashMap<String, String>,
}

impl Merchant {
    /// A merchant known only by its id, as returned when merchants aren't expanded.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MerchantAddress {
    pub short_formatted: String,
    pub formatted: String,
    pub address: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub postcode: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zoom_level: i64,
    pub approximate: bool,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_from_minimal_json() {
        let json = r#"{
            "id": "tx_123",
            "account_id": "acc_123",
            "amount": -510,
            "currency": "GBP",
            "created": "2024-11-23T10:00:00.000Z"
        }"#;

        let transaction: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(transaction.id, "tx_123");
        assert_eq!(transaction.created, test_helpers::mock_datetime(2024, 11, 23));
        assert_eq!(transaction.amount, -510);
        assert!(transaction.merchant.is_none());
        assert!(transaction.metadata.is_empty());
    }

    #[test]
    fn test_transaction_serialization() {
        let mut transaction = test_helpers::mock_transaction(
            "tx_123",
            "acc_123",
            1000,
            test_helpers::mock_datetime(2024, 11, 23),
        );
        transaction.merchant = Some(Merchant::from_id("merch_123"));
        transaction
            .metadata
            .insert("note".to_string(), "lunch".to_string());

        let json = serde_json::to_string(&transaction).unwrap();
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();

        assert_eq!(transaction, deserialized);
    }

    #[test]
    fn test_merchant_from_id() {
        let merchant = Merchant::from_id("merch_123");

        assert_eq!(merchant.id, "merch_123");
        assert_eq!(
            merchant,
            Merchant {
                id: "merch_123".to_string(),
                ..Default::default()
            }
        );
    }
}
