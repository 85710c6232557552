//! Per-session token storage
//!
//! Maps an opaque session id to the token set obtained by that browser. The
//! store lives in process memory only; a restart logs everyone out.
//!
//! A tokio Mutex serializes every operation. Callers never hold the lock
//! across a network call: they clone the token set out, talk to Google, then
//! write back. Concurrent exchanges for the same session resolve last-write-wins;
//! refreshes use `replace_if_current` so a slow refresh cannot clobber a token
//! set installed by a newer exchange.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::debug;

use crate::token::TokenSet;

#[derive(Default)]
pub struct SessionStore {
    state: Mutex<HashMap<String, TokenSet>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the token set for a session, if it has authenticated.
    pub async fn get(&self, session_id: &str) -> Option<TokenSet> {
        let state = self.state.lock().await;
        state.get(session_id).cloned()
    }

    /// Store a token set, replacing any previous one for the session.
    ///
    /// Returns the replaced set.
    pub async fn insert(&self, session_id: String, tokens: TokenSet) -> Option<TokenSet> {
        let mut state = self.state.lock().await;
        debug!(sessions = state.len(), "storing token set");
        state.insert(session_id, tokens)
    }

    /// Replace the session's token set only if its access token still equals
    /// `expected_access`.
    ///
    /// Returns whether the swap happened.
    pub async fn replace_if_current(
        &self,
        session_id: &str,
        expected_access: &str,
        tokens: TokenSet,
    ) -> bool {
        let mut state = self.state.lock().await;
        match state.get_mut(session_id) {
            Some(current) if current.access_token.expose_str() == expected_access => {
                *current = tokens;
                true
            }
            _ => {
                debug!("token set changed underneath refresh, keeping newer one");
                false
            }
        }
    }

    /// Number of authenticated sessions.
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
