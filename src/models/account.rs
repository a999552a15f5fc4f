use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account types accepted by the `account_type` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    UkRetail,
    UkRetailJoint,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::UkRetail => "uk_retail",
            AccountType::UkRetailJoint => "uk_retail_joint",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uk_retail" => Ok(AccountType::UkRetail),
            "uk_retail_joint" => Ok(AccountType::UkRetailJoint),
            _ => Err(format!(
                "account type invalid. valid types [uk_retail, uk_retail_joint], got {s:?}"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub closed: bool,
    /// Kept as sent so that types newer than [`AccountType`] survive a round trip
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub owners: Vec<AccountOwner>,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub sort_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountOwner {
    pub user_id: String,
    #[serde(default)]
    pub preferred_name: String,
    #[serde(default)]
    pub preferred_first_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Balance {
    pub balance: i64,
    #[serde(default)]
    pub total_balance: i64,
    #[serde(default)]
    pub balance_including_flexible_savings: i64,
    pub currency: String,
    #[serde(default)]
    pub spend_today: i64,
    #[serde(default)]
    pub local_currency: String,
}

/// Information about the access token currently in use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Whoami {
    pub authenticated: bool,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub user_id: String,
}
