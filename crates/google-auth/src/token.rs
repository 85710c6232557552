//! Token exchange and refresh
//!
//! Both operations POST a form to the token endpoint with different grant
//! types. Google answers failures with `{"error": "...", "error_description": "..."}`;
//! `invalid_grant` is surfaced separately because it means the code or
//! refresh token is dead and a retry cannot succeed.

use common::Secret;
use serde::Deserialize;
use tracing::debug;

use crate::authorize::OAuthClient;
use crate::constants::EXPIRY_SKEW_MILLIS;
use crate::error::{Error, Result};

/// Response body from the token endpoint for both exchange and refresh.
///
/// `expires_in` is a delta in seconds. A refresh response normally omits
/// `refresh_token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Secret<String>,
    #[serde(default)]
    pub refresh_token: Option<Secret<String>>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Tokens held for one session.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: Secret<String>,
    pub refresh_token: Option<Secret<String>>,
    /// Absolute expiry as unix milliseconds, if the provider reported one
    pub expires_at: Option<u64>,
    pub scopes: Vec<String>,
    pub token_type: String,
}

impl TokenSet {
    /// Build a token set from an exchange response received at `now`.
    pub fn from_response(response: TokenResponse, now: u64) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: response.expires_in.map(|secs| expiry_at(now, secs)),
            scopes: split_scopes(response.scope.as_deref()),
            token_type: response.token_type.unwrap_or_else(|| "Bearer".into()),
        }
    }

    /// Whether the access token is expired, or will be within the skew window.
    ///
    /// A set without an expiry is never considered expired.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at
            .is_some_and(|expires| now.saturating_add(EXPIRY_SKEW_MILLIS) >= expires)
    }

    /// Merge a refresh response into this set.
    ///
    /// Google keeps the existing refresh token valid and usually leaves it
    /// out of the response, so the old one is kept unless a new one arrives.
    pub fn apply_refresh(&mut self, response: TokenResponse, now: u64) {
        self.access_token = response.access_token;
        if let Some(refresh) = response.refresh_token {
            self.refresh_token = Some(refresh);
        }
        self.expires_at = response.expires_in.map(|secs| expiry_at(now, secs));
        if response.scope.is_some() {
            self.scopes = split_scopes(response.scope.as_deref());
        }
        if let Some(token_type) = response.token_type {
            self.token_type = token_type;
        }
    }
}

/// Current time as unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Absolute expiry for an `expires_in` delta, clamped instead of overflowing.
fn expiry_at(now: u64, expires_in_secs: u64) -> u64 {
    now.saturating_add(expires_in_secs.saturating_mul(1000))
}

fn split_scopes(scope: Option<&str>) -> Vec<String> {
    scope
        .map(|s| s.split_whitespace().map(String::from).collect())
        .unwrap_or_default()
}

/// Exchange an authorization code for tokens.
///
/// `verifier` is the PKCE verifier recorded when the authorization URL was
/// built, if any.
pub async fn exchange_code(
    http: &reqwest::Client,
    client: &OAuthClient,
    code: &str,
    verifier: Option<&str>,
) -> Result<TokenResponse> {
    if code.trim().is_empty() {
        return Err(Error::TokenExchange("authorization code is empty".into()));
    }

    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", client.client_id.as_str()),
        ("client_secret", client.client_secret.expose_str()),
        ("redirect_uri", client.redirect_uri.as_str()),
    ];
    if let Some(verifier) = verifier {
        form.push(("code_verifier", verifier));
    }

    let response = http
        .post(client.token_endpoint.clone())
        .form(&form)
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    read_token_response(response, "token exchange").await
}

/// Obtain a new access token using a refresh token.
pub async fn refresh_token(
    http: &reqwest::Client,
    client: &OAuthClient,
    refresh: &str,
) -> Result<TokenResponse> {
    let response = http
        .post(client.token_endpoint.clone())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.expose_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    read_token_response(response, "token refresh").await
}

async fn read_token_response(response: reqwest::Response, operation: &str) -> Result<TokenResponse> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Http(format!("reading {operation} response: {e}")))?;

    if !status.is_success() {
        debug!(%status, operation, "token endpoint returned an error");
        return Err(match serde_json::from_str::<ErrorBody>(&body) {
            Ok(err) if err.error == "invalid_grant" => Error::InvalidGrant(
                err.error_description.unwrap_or(err.error),
            ),
            Ok(err) => Error::TokenExchange(format!(
                "{operation} returned {status}: {}{}",
                err.error,
                err.error_description
                    .map(|d| format!(" ({d})"))
                    .unwrap_or_default()
            )),
            Err(_) => Error::TokenExchange(format!("{operation} returned {status}: {body}")),
        });
    }

    serde_json::from_str::<TokenResponse>(&body)
        .map_err(|e| Error::InvalidResponse(format!("{operation}: {e}")))
}
