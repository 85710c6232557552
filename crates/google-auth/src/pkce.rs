//! PKCE (RFC 7636) and CSRF state generation
//!
//! The verifier stays server-side until the code exchange; only its S256
//! challenge goes into the authorization URL. The `state` value ties the
//! callback to the session that started the flow.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};

/// Generate a random PKCE code verifier.
///
/// 64 random bytes encode to 86 URL-safe base64 characters, inside the
/// 43..=128 range RFC 7636 allows (Google rejects anything longer).
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 64];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `challenge = BASE64URL(SHA256(verifier))`
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate an opaque `state` value for CSRF protection.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
