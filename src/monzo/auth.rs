use super::token::Token;
use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, RefreshToken, StandardRevocableToken, TokenResponse,
    TokenUrl,
    basic::{
        BasicClient, BasicErrorResponse, BasicRevocationErrorResponse,
        BasicTokenIntrospectionResponse, BasicTokenResponse,
    },
};
use indicatif::ProgressStyle;
use reqwest::redirect::Policy;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tiny_http::{Request, Response, Server};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{Span, debug, info, instrument, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use url::Url;

pub(crate) const CALLBACK_ADDR: &str = "127.0.0.1:54092";
const AUTH_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

// Type alias for the client when Auth and Token URLs are set
type ConfiguredClient = Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,    // HasAuthUrl
    EndpointNotSet, // HasDeviceAuthUrl
    EndpointNotSet, // HasIntrospectionUrl
    EndpointNotSet, // HasRevocationUrl
    EndpointSet,    // HasTokenUrl
>;

/// OAuth2 client for the Monzo authorization server.
pub(crate) struct MonzoAuth {
    client: ConfiguredClient,
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl MonzoAuth {
    pub(crate) fn new(api: &ApiConfig, client_id: &str, client_secret: &str) -> Result<Self> {
        let auth_url = AuthUrl::new(api.auth_url.clone())
            .map_err(|e| AppError::Auth(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(api.token_url.clone())
            .map_err(|e| AppError::Auth(format!("Invalid token URL: {}", e)))?;

        let redirect_url = format!("http://{}/callback", CALLBACK_ADDR);
        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_client_secret(ClientSecret::new(client_secret.to_string()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            // Monzo expects the client credentials in the request body
            .set_auth_type(AuthType::RequestBody)
            .set_redirect_uri(
                RedirectUrl::new(redirect_url)
                    .map_err(|e| AppError::Auth(format!("Invalid redirect URL: {}", e)))?,
            );

        let http_client = reqwest::ClientBuilder::new()
            .redirect(Policy::none())
            .build()
            .map_err(|e| AppError::Auth(format!("Failed to build reqwest client: {}", e)))?;

        Ok(Self {
            client,
            http_client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    /// Run the interactive authorization code flow
    pub(crate) async fn authenticate(&self) -> Result<Token> {
        let listener = CallbackListener::bind(CALLBACK_ADDR)?;
        let state = CsrfToken::new_random();

        launch_browser(&self.authorize_url(state.clone()));

        self.complete(listener, state, AUTH_TIMEOUT).await
    }

    fn authorize_url(&self, state: CsrfToken) -> Url {
        let (auth_url, _) = self
            .client
            .authorize_url(|| state)
            .add_extra_param("access_type", "offline")
            .url();

        auth_url
    }

    /// Wait for the callback carrying `state` and exchange its code, all within `timeout`.
    ///
    /// The browser is answered with 200 once the token is obtained, or 500 if the exchange fails.
    async fn complete(
        &self,
        listener: CallbackListener,
        state: CsrfToken,
        timeout: Duration,
    ) -> Result<Token> {
        let deadline = Instant::now() + timeout;
        let callback = listener
            .wait_for_code(state.secret().clone(), timeout)
            .await?;

        let exchanged = tokio::time::timeout_at(deadline, self.exchange_code(callback.code.clone()))
            .await
            .unwrap_or_else(|_| {
                Err(AppError::Auth(format!(
                    "timed out after {}s exchanging authorization code",
                    timeout.as_secs()
                )))
            });

        match exchanged {
            Ok(token) => {
                callback.respond(200, "authentication successful");
                info!("Authorization code exchanged");
                Ok(token)
            }
            Err(e) => {
                callback.respond(500, "authentication failure");
                Err(e)
            }
        }
    }

    async fn exchange_code(&self, code: String) -> Result<Token> {
        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .add_extra_param("access_type", "offline")
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to exchange code: {:?}", e)))?;

        if token_result.refresh_token().is_none() {
            warn!("No refresh token received, the token will not be refreshed when it expires");
        }

        Ok(Token::from_response(
            &token_result,
            None,
            &self.client_id,
            &self.client_secret,
        ))
    }

    /// Exchange the refresh token of `token` for a new access token
    pub(crate) async fn refresh(&self, token: &Token) -> Result<Token> {
        let refresh_token = token
            .refresh_token
            .as_ref()
            .ok_or_else(|| AppError::Auth("No refresh token available".to_string()))?;

        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to refresh token: {:?}", e)))?;

        Ok(Token::from_response(
            &token_result,
            Some(token),
            &self.client_id,
            &self.client_secret,
        ))
    }
}

fn launch_browser(auth_url: &Url) {
    if let Err(e) = open::that(auth_url.as_str()) {
        debug!("Failed to launch browser: {}", e);
        println!(
            "Failed to launch browser. Please copy and paste auth URL into browser:\n\n\t{}\n",
            auth_url
        );
    }
}

/// A callback carrying a valid authorization code, still waiting for its HTTP response.
pub(crate) struct AuthorizedCallback {
    pub(crate) code: String,
    request: Request,
}

impl AuthorizedCallback {
    fn respond(self, status: u16, body: &str) {
        let response = Response::from_string(body).with_status_code(status);
        if let Err(e) = self.request.respond(response) {
            warn!("Failed to respond to callback: {}", e);
        }
    }
}

#[derive(Debug, PartialEq)]
enum CallbackOutcome {
    Authorized(String),
    Rejected(&'static str),
}

fn parse_callback(request_url: &str, expected_state: &str) -> CallbackOutcome {
    let Ok(url) = Url::parse(&format!("http://{}{}", CALLBACK_ADDR, request_url)) else {
        return CallbackOutcome::Rejected("bad request - invalid callback URL");
    };

    let query_value = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    };

    let (Some(code), Some(state)) = (query_value("code"), query_value("state")) else {
        return CallbackOutcome::Rejected("bad request - query parameters should contain code and state");
    };

    if state != expected_state {
        return CallbackOutcome::Rejected("bad request - state mismatch");
    }

    CallbackOutcome::Authorized(code)
}

/// Local HTTP listener receiving the OAuth2 redirect.
pub(crate) struct CallbackListener {
    server: Arc<Server>,
}

impl CallbackListener {
    pub(crate) fn bind(addr: &str) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| AppError::Auth(format!("Failed to bind to {}: {}", addr, e)))?;

        Ok(Self {
            server: Arc::new(server),
        })
    }

    #[cfg(test)]
    fn port(&self) -> u16 {
        self.server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap_or_default()
    }

    /// Serve callbacks until one carries a code for `state`, or `timeout` elapses.
    ///
    /// Callbacks with a missing or mismatched state are answered with a 400 and
    /// the listener keeps waiting. The listener is shut down before returning.
    #[instrument(name = "Waiting for authorization", skip_all)]
    pub(crate) async fn wait_for_code(
        self,
        state: String,
        timeout: Duration,
    ) -> Result<AuthorizedCallback> {
        let span = Span::current();
        span.pb_set_style(
            &ProgressStyle::with_template("{spinner} [{elapsed}] {msg}")
                .map_err(|e| AppError::Other(e.into()))?,
        );
        span.pb_set_message("Waiting for browser callback");

        let (tx, rx) = oneshot::channel();
        let shutdown = Arc::new(AtomicBool::new(false));

        let server = self.server.clone();
        let stop = shutdown.clone();
        let handle = tokio::task::spawn_blocking(move || {
            while !stop.load(Ordering::Relaxed) {
                let request = match server.recv_timeout(POLL_INTERVAL) {
                    Ok(Some(request)) => request,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("Callback listener failed: {}", e);
                        return;
                    }
                };

                match parse_callback(request.url(), &state) {
                    CallbackOutcome::Authorized(code) => {
                        let _ = tx.send(AuthorizedCallback { code, request });
                        return;
                    }
                    CallbackOutcome::Rejected(reason) => {
                        debug!(reason, "Rejected callback");
                        let response = Response::from_string(reason).with_status_code(400);
                        if let Err(e) = request.respond(response) {
                            warn!("Failed to respond to callback: {}", e);
                        }
                    }
                }
            }
        });

        let result = tokio::time::timeout(timeout, rx).await;

        shutdown.store(true, Ordering::Relaxed);
        if let Err(e) = handle.await {
            warn!("Callback listener task failed: {}", e);
        }

        match result {
            Ok(Ok(callback)) => Ok(callback),
            Ok(Err(_)) => Err(AppError::Auth(
                "callback listener stopped before receiving a code".to_string(),
            )),
            Err(_) => Err(AppError::Auth(format!(
                "timed out after {}s waiting for authorization",
                timeout.as_secs()
            ))),
        }
    }
}
