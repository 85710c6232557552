//! Authorization gateway
//!
//! Ties the OAuth flow to browser sessions and fronts the Drive calls that
//! need a token. One `Gateway` is shared by every request; each operation
//! takes the caller's session id.
//!
//! Locks are never held across a call to Google. Token state is read out,
//! the network call happens, and the result is written back.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::Secret;
use drive_api::{DriveApi, DriveFile, ListQuery, NewPermission, Permission};
use google_auth::{OAuthClient, SessionStore, TokenSet};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, Result, Rollback};
use crate::metrics;

/// Maximum age of a pending authorization before the callback is refused.
const PENDING_EXPIRY: Duration = Duration::from_secs(600);

/// Upper bound on authorizations awaiting their callback. `/` is public, so
/// the map must not grow with request volume.
const MAX_PENDING: usize = 10_000;

/// Authorization started by `/` and not yet completed by the callback.
struct PendingAuthorization {
    state: String,
    verifier: String,
    created_at: Instant,
}

impl PendingAuthorization {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > PENDING_EXPIRY
    }
}

pub struct Gateway {
    oauth: OAuthClient,
    http: reqwest::Client,
    sessions: SessionStore,
    pending: Mutex<HashMap<String, PendingAuthorization>>,
    drive: Arc<dyn DriveApi>,
}

impl Gateway {
    pub fn new(oauth: OAuthClient, http: reqwest::Client, drive: Arc<dyn DriveApi>) -> Self {
        Self {
            oauth,
            http,
            sessions: SessionStore::new(),
            pending: Mutex::new(HashMap::new()),
            drive,
        }
    }

    /// Consent URL for this session.
    ///
    /// Records a fresh state and PKCE verifier for the session, replacing any
    /// earlier pending authorization: the most recently opened consent page
    /// is the one whose callback succeeds.
    pub async fn build_authorization_url(&self, session_id: &str) -> String {
        let state = google_auth::generate_state();
        let verifier = google_auth::generate_verifier();
        let challenge = google_auth::compute_challenge(&verifier);
        let url = google_auth::build_authorization_url(&self.oauth, &state, &challenge);

        let mut pending = self.pending.lock().await;
        if !pending.contains_key(session_id) && pending.len() >= MAX_PENDING {
            make_room(&mut pending);
        }
        pending.insert(
            session_id.to_string(),
            PendingAuthorization {
                state,
                verifier,
                created_at: Instant::now(),
            },
        );
        debug!(pending = pending.len(), "authorization started");

        url
    }

    /// Complete the callback: check state, redeem the code, store the tokens.
    ///
    /// The session's token set is only touched on success.
    pub async fn exchange_code_for_tokens(
        &self,
        session_id: &str,
        code: &str,
        state: Option<&str>,
    ) -> Result<()> {
        if code.trim().is_empty() {
            return Err(GatewayError::AuthExchange("authorization code is empty".into()));
        }

        let pending = self.pending.lock().await.remove(session_id);
        let pending = pending.ok_or_else(|| {
            GatewayError::AuthExchange("no authorization in progress for this session".into())
        })?;
        if pending.is_expired() {
            return Err(GatewayError::AuthExchange(
                "authorization request expired, start again".into(),
            ));
        }
        if state != Some(pending.state.as_str()) {
            warn!("callback state does not match the pending authorization");
            return Err(GatewayError::AuthExchange("state mismatch".into()));
        }

        let response = timed_token_call(
            "authorization_code",
            google_auth::exchange_code(&self.http, &self.oauth, code, Some(&pending.verifier)),
        )
        .await?;

        let tokens = TokenSet::from_response(response, google_auth::now_millis());
        info!(
            scopes = %tokens.scopes.join(" "),
            has_refresh_token = tokens.refresh_token.is_some(),
            expires_at = ?tokens.expires_at,
            "session authenticated"
        );
        self.sessions.insert(session_id.to_string(), tokens).await;
        Ok(())
    }

    /// Access token for the session, refreshed first if it has expired.
    ///
    /// An expired token without a refresh token is still handed out; Drive
    /// will reject it and the caller reports that failure.
    pub async fn require_authenticated(&self, session_id: &str) -> Result<Secret<String>> {
        let tokens = self
            .sessions
            .get(session_id)
            .await
            .ok_or(GatewayError::Unauthenticated)?;

        if !tokens.is_expired(google_auth::now_millis()) {
            return Ok(tokens.access_token);
        }
        let Some(refresh) = tokens.refresh_token.clone() else {
            debug!("access token expired and no refresh token is stored");
            return Ok(tokens.access_token);
        };

        let response = timed_token_call(
            "refresh_token",
            google_auth::refresh_token(&self.http, &self.oauth, refresh.expose_str()),
        )
        .await?;

        let mut refreshed = tokens.clone();
        refreshed.apply_refresh(response, google_auth::now_millis());
        let access_token = refreshed.access_token.clone();

        let swapped = self
            .sessions
            .replace_if_current(session_id, tokens.access_token.expose_str(), refreshed)
            .await;
        if !swapped {
            // A newer exchange landed meanwhile; prefer its token
            if let Some(current) = self.sessions.get(session_id).await {
                return Ok(current.access_token);
            }
        }
        info!("access token refreshed");
        Ok(access_token)
    }

    pub async fn is_authenticated(&self, session_id: &str) -> bool {
        self.sessions.get(session_id).await.is_some()
    }

    /// Files visible to the session's user, in Drive's order.
    pub async fn list_files(&self, session_id: &str, query: &ListQuery) -> Result<Vec<DriveFile>> {
        let token = self.require_authenticated(session_id).await?;
        let files = timed_drive_call(
            "files.list",
            self.drive.list_files(token.expose_str(), query),
        )
        .await?;
        debug!(files = files.len(), "files listed");
        Ok(files)
    }

    /// Grant `new_owner` writer access, then promote that grant to owner.
    ///
    /// The writer grant is never retried. If promotion fails the grant is
    /// deleted again and the promotion error is returned with the outcome of
    /// that cleanup.
    pub async fn transfer_ownership(
        &self,
        session_id: &str,
        file_id: &str,
        new_owner: &str,
    ) -> Result<Permission> {
        let token = self.require_authenticated(session_id).await?;
        let token = token.expose_str();

        let grant = NewPermission::user_writer(new_owner);
        let permission = timed_drive_call(
            "permissions.create",
            self.drive.create_permission(token, file_id, &grant),
        )
        .await?;
        debug!(file_id, permission_id = %permission.id, "writer permission created");

        let promoted = timed_drive_call(
            "permissions.update",
            self.drive.transfer_ownership(token, file_id, &permission.id),
        )
        .await;

        match promoted {
            Ok(owner) => {
                info!(file_id, "ownership transferred");
                Ok(owner)
            }
            Err(error) => {
                warn!(file_id, error = %error, "promotion to owner failed, revoking writer permission");
                let rollback = match timed_drive_call(
                    "permissions.delete",
                    self.drive.delete_permission(token, file_id, &permission.id),
                )
                .await
                {
                    Ok(()) => Rollback::Revoked,
                    Err(e) => {
                        warn!(file_id, permission_id = %permission.id, error = %e, "failed to revoke writer permission");
                        Rollback::Failed(e)
                    }
                };
                Err(GatewayError::OwnershipPromotion { error, rollback })
            }
        }
    }

    /// Number of authenticated sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }
}

/// Drop expired entries; if the map is still full, evict the oldest one.
///
/// Only runs when the map is at capacity, so a scan costs at most
/// `MAX_PENDING` steps.
fn make_room(pending: &mut HashMap<String, PendingAuthorization>) {
    pending.retain(|_, p| !p.is_expired());
    if pending.len() < MAX_PENDING {
        return;
    }
    let oldest = pending
        .iter()
        .min_by_key(|(_, p)| p.created_at)
        .map(|(id, _)| id.clone());
    if let Some(id) = oldest {
        pending.remove(&id);
        debug!("pending authorizations full, evicted the oldest");
    }
}

async fn timed_drive_call<T>(
    operation: &'static str,
    call: impl Future<Output = drive_api::Result<T>>,
) -> drive_api::Result<T> {
    let start = Instant::now();
    let result = call.await;
    metrics::record_remote_duration(operation, start.elapsed().as_secs_f64());
    if let Err(e) = &result {
        warn!(operation, error = %e, "Drive API call failed");
        metrics::record_remote_error(operation, e.kind());
    }
    result
}

async fn timed_token_call<T>(
    grant: &'static str,
    call: impl Future<Output = google_auth::Result<T>>,
) -> google_auth::Result<T> {
    let start = Instant::now();
    let result = call.await;
    metrics::record_remote_duration("oauth.token", start.elapsed().as_secs_f64());
    match &result {
        Ok(_) => metrics::record_token_exchange(grant, "ok"),
        Err(e) => {
            warn!(grant, error = %e, "token endpoint call failed");
            let outcome = match e {
                google_auth::Error::InvalidGrant(_) => "invalid_grant",
                _ => "error",
            };
            metrics::record_token_exchange(grant, outcome);
        }
    }
    result
}
