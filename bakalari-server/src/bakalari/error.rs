//! Bakaláři client error types.

/// Errors from the token exchanges (password grant and refresh grant).
///
/// These are fatal for the call chain that hit them: a failed password
/// grant means the session could not be opened, and a failed refresh
/// grant means the session must be re-opened.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// HTTP request to the login endpoint failed
    #[error("HTTP error during token exchange: {0}")]
    Http(#[from] reqwest::Error),

    /// The login endpoint rejected the exchange
    #[error("token exchange failed with status {status}: {body}")]
    Exchange { status: u16, body: String },

    /// The exchange succeeded but the response omitted a token field
    #[error("login response missing {0}")]
    MissingToken(&'static str),

    /// The returned access token cannot be used as a header value
    #[error("access token is not a valid header value")]
    InvalidToken,
}

/// Errors from authenticated resource calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP request failed (network error, DNS, connection reset, etc.)
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The request timed out before a response arrived.
    ///
    /// Timeouts never trigger a token refresh; the token may still be
    /// perfectly valid.
    #[error("request timed out")]
    Timeout,

    /// Token refresh failed while recovering from a rejected access token
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// API returned a non-success status code
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body was not valid JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Http(err)
        }
    }
}
