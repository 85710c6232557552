//! Google OAuth2 authorization-code flow
//!
//! Builds consent URLs, exchanges authorization codes, refreshes access
//! tokens and keeps the resulting token sets per browser session. The crate
//! does no HTTP serving of its own; the gateway binary drives it.
//!
//! Flow:
//! 1. Gateway calls `pkce::generate_state()` + `pkce::generate_verifier()`
//! 2. User consents via `authorize::build_authorization_url()`
//! 3. Callback hands the code to `token::exchange_code()`
//! 4. Token set stored via `session::SessionStore::insert()`
//! 5. Expired access tokens are renewed with `token::refresh_token()`

pub mod authorize;
pub mod constants;
pub mod error;
pub mod pkce;
pub mod session;
pub mod token;

pub use authorize::{OAuthClient, build_authorization_url};
pub use constants::*;
pub use error::{Error, Result};
pub use pkce::{compute_challenge, generate_state, generate_verifier};
pub use session::SessionStore;
pub use token::{TokenResponse, TokenSet, exchange_code, now_millis, refresh_token};
