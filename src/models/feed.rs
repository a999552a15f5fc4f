use serde::{Deserialize, Serialize};

/// The only feed item type Monzo supports
pub const FEED_TYPE_BASIC: &str = "basic";

// https://docs.monzo.com/#feed-items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedItem {
    pub account_id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub params: FeedItemParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeedItemParams {
    pub title: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_color: Option<String>,
}

impl FeedItem {
    pub fn basic(account_id: impl Into<String>, params: FeedItemParams) -> Self {
        Self {
            account_id: account_id.into(),
            type_: FEED_TYPE_BASIC.to_string(),
            params,
            url: None,
        }
    }
}
