use serde::{Deserialize, Serialize};

// https://docs.monzo.com/#pots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pot {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default, rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub current_account_id: String,
    #[serde(default)]
    pub cover_image_url: String,
    #[serde(default)]
    pub isa_wrapper: String,
    #[serde(default)]
    pub round_up: bool,
    #[serde(default)]
    pub round_up_multiplier: Option<f64>,
    #[serde(default)]
    pub is_tax_pot: bool,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub available_for_bills: bool,
    #[serde(default)]
    pub has_virtual_cards: bool,
}

/// Money moved between an account and a pot.
///
/// `dedupe_id` makes the transfer idempotent: repeating a request with the
/// same id moves the money once.
#[derive(Debug, Clone, PartialEq)]
pub struct PotTransfer {
    pub account_id: String,
    pub amount: i64,
    pub dedupe_id: String,
}

impl PotTransfer {
    pub fn validate(&self) -> Result<(), String> {
        if self.account_id.trim().is_empty() {
            return Err("account id cannot be empty".to_string());
        }
        if self.amount <= 0 {
            return Err(format!("amount must be a positive number, got {}", self.amount));
        }
        if self.dedupe_id.trim().is_empty() {
            return Err("dedupe id must not be empty".to_string());
        }

        Ok(())
    }
}
