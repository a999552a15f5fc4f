use crate::error::{AppError, Result};
use crate::storage;
use chrono::{DateTime, TimeDelta, Utc};
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

// Refresh slightly early so a token doesn't expire mid-request
const EXPIRY_DELTA_SECS: i64 = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl Token {
    /// A long-lived access token with no way to refresh it
    pub fn from_static(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expiry: None,
            client_id: None,
            client_secret: None,
        }
    }

    /// Build a token from an OAuth2 token endpoint response.
    ///
    /// Refresh responses may omit the refresh token, in which case the one from
    /// `previous` is kept.
    pub(super) fn from_response(
        response: &BasicTokenResponse,
        previous: Option<&Token>,
        client_id: &str,
        client_secret: &str,
    ) -> Self {
        let refresh_token = response
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| previous.and_then(|p| p.refresh_token.clone()));

        let expiry = response.expires_in().and_then(|d| {
            TimeDelta::from_std(d)
                .ok()
                .map(|delta| Utc::now() + delta)
        });

        Self {
            access_token: response.access_token().secret().clone(),
            refresh_token,
            expiry,
            client_id: Some(client_id.to_string()),
            client_secret: Some(client_secret.to_string()),
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }

    /// A refresh token is useless without the client credentials to redeem it
    pub fn validate(&self) -> Result<()> {
        if self.refresh_token.is_some() && !self.can_refresh() {
            return Err(AppError::Auth(
                "token has a refresh token but is missing client id or client secret".to_string(),
            ));
        }

        Ok(())
    }

    /// Tokens without an expiry never expire
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| expiry - TimeDelta::seconds(EXPIRY_DELTA_SECS) <= now)
    }

    /// Mark the token as expired so that the next request refreshes it
    pub fn invalidate(&mut self) {
        self.expiry = Some(DateTime::UNIX_EPOCH + TimeDelta::seconds(1));
    }
}

/// Persists the token between invocations.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Token>> {
        let token: Option<Token> = storage::read_json(&self.path)
            .map_err(|e| AppError::Auth(format!("Failed to read token file: {}", e)))?;

        if let Some(token) = &token {
            token.validate()?;
        }

        Ok(token)
    }

    /// Load the token for a command that needs to be authenticated
    pub fn load_required(&self) -> Result<Token> {
        self.load()?.ok_or_else(|| {
            AppError::Auth("not authenticated, try running `monzo login`".to_string())
        })
    }

    pub fn save(&self, token: &Token) -> Result<()> {
        token.validate()?;
        storage::write_json(&self.path, token)
            .map_err(|e| AppError::Auth(format!("Failed to write token file: {}", e)))?;
        debug!(path = ?self.path, "Saved token");

        Ok(())
    }

    /// Clear the cached token by deleting the token file
    #[instrument(name = "Clearing auth token", skip_all)]
    pub fn clear(&self) -> Result<()> {
        if storage::remove_file(&self.path)? {
            info!("Cleared cached token");
        } else {
            debug!("No token to clear");
        }

        Ok(())
    }
}
