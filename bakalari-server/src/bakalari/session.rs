//! Authenticated Bakaláři session.
//!
//! A [`Session`] owns the account credentials and the current token pair,
//! performs the password-grant and refresh-grant exchanges against
//! `/api/login`, and provides the authorized-request primitive every
//! endpoint method routes through. A request rejected with 401 triggers
//! exactly one refresh followed by one retry; any further failure
//! propagates to the caller.

use std::fmt;
use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::{Method, StatusCode, header};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use super::error::{ApiError, AuthError};
use super::types::TokenResponse;

/// Client id the official mobile app presents on both grant types.
const CLIENT_ID: &str = "ANDR";

/// Default connect/read timeout for every HTTP call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Account credentials and backend location. Immutable for the process
/// lifetime.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub base_url: String,
}

impl Credentials {
    /// Create credentials, normalizing a trailing slash off the base URL.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            username: username.into(),
            password: password.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

// The password must never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Access/refresh token pair from a grant exchange.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Current tokens plus the derived `Authorization` header.
///
/// The header is a cached projection of the access token; it is rebuilt
/// whenever the pair is replaced and never mutated independently.
struct TokenState {
    tokens: TokenPair,
    auth_header: HeaderValue,
}

impl TokenState {
    fn new(tokens: TokenPair) -> Result<Self, AuthError> {
        let auth_header = HeaderValue::from_str(&format!("Bearer {}", tokens.access_token))
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(Self {
            tokens,
            auth_header,
        })
    }
}

/// An authenticated session against one Bakaláři account.
///
/// Cheap to share behind an `Arc`; concurrent calls read the cached header
/// without contention, and refreshes are serialized so simultaneous 401s
/// coalesce into a single exchange.
pub struct Session {
    credentials: Credentials,
    http: reqwest::Client,
    state: RwLock<TokenState>,
    refresh_gate: Mutex<()>,
}

// Tokens must never end up in logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session by performing the password-grant exchange.
    ///
    /// Fails if the exchange is rejected or the response omits either
    /// token field; an incomplete pair is never accepted.
    pub async fn open(credentials: Credentials) -> Result<Self, AuthError> {
        Self::open_with_timeout(credentials, DEFAULT_TIMEOUT).await
    }

    /// Open a session with a custom per-request timeout.
    pub async fn open_with_timeout(
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        let tokens = token_exchange(
            &http,
            &credentials.base_url,
            &[
                ("client_id", CLIENT_ID),
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ],
        )
        .await?;

        Ok(Self {
            state: RwLock::new(TokenState::new(tokens)?),
            refresh_gate: Mutex::new(()),
            http,
            credentials,
        })
    }

    /// Replace the token pair via the refresh-token grant.
    ///
    /// There is no fallback to a password login here: a rejected refresh
    /// token is terminal and the session must be re-opened.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _gate = self.refresh_gate.lock().await;
        self.exchange_refresh_token().await
    }

    /// Send an authorized request to `{base_url}/api/3/{path}`.
    ///
    /// On 401 the token pair is refreshed and the original request is
    /// re-sent exactly once with the new header; a second failure of any
    /// kind propagates. Non-401 error statuses propagate immediately, and
    /// transport errors (including timeouts) never trigger a refresh.
    pub async fn authorized_call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let sent_with = self.auth_header().await;
        let response = self
            .request(method.clone(), path, query, body, &sent_with)
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        tracing::info!(path, "access token rejected, refreshing");
        self.refresh_after(&sent_with).await?;

        let header = self.auth_header().await;
        let retry = self.request(method, path, query, body, &header).await?;
        check_status(retry).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        auth: &HeaderValue,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/api/3/{}", self.credentials.base_url, path);

        let mut request = self
            .http
            .request(method, &url)
            .header(header::AUTHORIZATION, auth.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Refresh unless another caller already replaced the pair that
    /// `observed` was derived from. A caller that loses the race reuses
    /// the winner's tokens instead of issuing a redundant exchange.
    async fn refresh_after(&self, observed: &HeaderValue) -> Result<(), AuthError> {
        let _gate = self.refresh_gate.lock().await;

        if *observed != self.state.read().await.auth_header {
            return Ok(());
        }
        self.exchange_refresh_token().await
    }

    /// Must be called with `refresh_gate` held.
    async fn exchange_refresh_token(&self) -> Result<(), AuthError> {
        let refresh_token = self.state.read().await.tokens.refresh_token.clone();

        let tokens = token_exchange(
            &self.http,
            &self.credentials.base_url,
            &[
                ("client_id", CLIENT_ID),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ],
        )
        .await?;

        *self.state.write().await = TokenState::new(tokens)?;
        Ok(())
    }

    async fn auth_header(&self) -> HeaderValue {
        self.state.read().await.auth_header.clone()
    }

    #[cfg(test)]
    pub(crate) async fn token_pair(&self) -> TokenPair {
        self.state.read().await.tokens.clone()
    }
}

/// Perform a grant exchange against `{base_url}/api/login`.
async fn token_exchange(
    http: &reqwest::Client,
    base_url: &str,
    form: &[(&str, &str)],
) -> Result<TokenPair, AuthError> {
    let url = format!("{base_url}/api/login");

    let response = http.post(&url).form(form).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Exchange {
            status: status.as_u16(),
            body,
        });
    }

    let tokens: TokenResponse = response.json().await?;
    let access_token = tokens
        .access_token
        .ok_or(AuthError::MissingToken("access_token"))?;
    let refresh_token = tokens
        .refresh_token
        .ok_or(AuthError::MissingToken("refresh_token"))?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Pass success statuses through; turn everything else into `ApiError`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Api {
        status: status.as_u16(),
        body,
    })
}
