//! Google OAuth endpoints and scopes
//!
//! Defaults for the public Google identity endpoints. Both endpoints can be
//! overridden through `OAuthClient` so tests can point at a local server.

/// Authorization endpoint the browser is redirected to
pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Token endpoint for code exchange and refresh
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Full read/write access to the user's Drive.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Access tokens are treated as expired this long before Google says they are,
/// so a token never lapses between the check and the Drive call.
pub const EXPIRY_SKEW_MILLIS: u64 = 60_000;
