use serde::{Deserialize, Serialize};

// https://docs.monzo.com/#webhooks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Webhook {
    pub id: String,
    pub account_id: String,
    pub url: String,
}
