//! Authorization URL construction

use common::Secret;
use url::Url;

use crate::constants::DRIVE_SCOPE;

/// Registered OAuth client plus the endpoints it talks to.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
    pub auth_endpoint: Url,
    pub token_endpoint: Url,
}

/// Build the consent URL the user is sent to.
///
/// Always asks for offline access (so Google issues a refresh token) and
/// forces the consent prompt, which is the only way to get a fresh refresh
/// token for a user who already granted access once.
pub fn build_authorization_url(client: &OAuthClient, state: &str, challenge: &str) -> String {
    let mut url = client.auth_endpoint.clone();
    url.query_pairs_mut()
        .append_pair("client_id", &client.client_id)
        .append_pair("redirect_uri", &client.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", DRIVE_SCOPE)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("include_granted_scopes", "true")
        .append_pair("state", state)
        .append_pair("code_challenge", challenge)
        .append_pair("code_challenge_method", "S256");
    url.into()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::constants::{GOOGLE_AUTH_ENDPOINT, GOOGLE_TOKEN_ENDPOINT};
    use std::collections::HashMap;

    pub(crate) fn test_client() -> OAuthClient {
        OAuthClient {
            client_id: "1234.apps.googleusercontent.com".into(),
            client_secret: Secret::new("GOCSPX-test".into()),
            redirect_uri: "http://localhost:3000/oauth2callback".into(),
            auth_endpoint: Url::parse(GOOGLE_AUTH_ENDPOINT).unwrap(),
            token_endpoint: Url::parse(GOOGLE_TOKEN_ENDPOINT).unwrap(),
        }
    }

    fn query_of(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn url_requests_offline_access_and_forced_consent() {
        let url = build_authorization_url(&test_client(), "st", "ch");
        assert!(url.starts_with(GOOGLE_AUTH_ENDPOINT));
        assert!(url.contains("access_type=offline"), "got: {url}");
        assert!(url.contains("prompt=consent"), "got: {url}");
    }

    #[test]
    fn url_carries_all_flow_parameters() {
        let url = build_authorization_url(&test_client(), "state-123", "challenge-abc");
        let query = query_of(&url);

        assert_eq!(query["client_id"], "1234.apps.googleusercontent.com");
        assert_eq!(query["redirect_uri"], "http://localhost:3000/oauth2callback");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["scope"], DRIVE_SCOPE);
        assert_eq!(query["include_granted_scopes"], "true");
        assert_eq!(query["state"], "state-123");
        assert_eq!(query["code_challenge"], "challenge-abc");
        assert_eq!(query["code_challenge_method"], "S256");
    }

    #[test]
    fn client_secret_never_appears_in_url() {
        let url = build_authorization_url(&test_client(), "st", "ch");
        assert!(!url.contains("GOCSPX"), "secret leaked into URL: {url}");
    }
}
