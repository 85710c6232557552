//! Test doubles shared by the gateway and route tests

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use axum::Form;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use common::Secret;
use drive_api::{DriveApi, DriveFile, ListQuery, NewPermission, Permission};
use google_auth::OAuthClient;
use tokio::net::TcpListener;
use url::Url;

use crate::gateway::Gateway;

/// Code the fake token endpoint accepts.
pub const GOOD_CODE: &str = "4/good-code";

/// In-process Drive that records every call as `"<op> <token> <args...>"`.
#[derive(Default)]
pub struct FakeDrive {
    pub files: Vec<DriveFile>,
    pub fail_list: bool,
    pub fail_create: bool,
    pub fail_promote: bool,
    pub fail_delete: bool,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeDrive {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(id, name)| DriveFile {
                    id: id.to_string(),
                    name: name.to_string(),
                    owners: vec![],
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn api_error(status: u16, message: &str) -> drive_api::Error {
    drive_api::Error::Api {
        status,
        message: message.into(),
    }
}

impl DriveApi for FakeDrive {
    fn list_files<'a>(
        &'a self,
        access_token: &'a str,
        query: &'a ListQuery,
    ) -> Pin<Box<dyn Future<Output = drive_api::Result<Vec<DriveFile>>> + Send + 'a>> {
        Box::pin(async move {
            self.record(format!("list {access_token} {}", query.page_size));
            if self.fail_list {
                return Err(api_error(401, "Invalid Credentials"));
            }
            Ok(self.files.clone())
        })
    }

    fn create_permission<'a>(
        &'a self,
        access_token: &'a str,
        file_id: &'a str,
        permission: &'a NewPermission,
    ) -> Pin<Box<dyn Future<Output = drive_api::Result<Permission>> + Send + 'a>> {
        Box::pin(async move {
            self.record(format!(
                "create {access_token} {file_id} {} {}",
                permission.role, permission.email_address
            ));
            if self.fail_create {
                return Err(api_error(404, "File not found"));
            }
            Ok(Permission {
                id: "perm-1".into(),
                role: Some(permission.role.clone()),
            })
        })
    }

    fn transfer_ownership<'a>(
        &'a self,
        access_token: &'a str,
        file_id: &'a str,
        permission_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = drive_api::Result<Permission>> + Send + 'a>> {
        Box::pin(async move {
            self.record(format!("promote {access_token} {file_id} {permission_id}"));
            if self.fail_promote {
                return Err(api_error(403, "Consent is required to transfer ownership"));
            }
            Ok(Permission {
                id: permission_id.to_string(),
                role: Some("owner".into()),
            })
        })
    }

    fn delete_permission<'a>(
        &'a self,
        access_token: &'a str,
        file_id: &'a str,
        permission_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = drive_api::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.record(format!("delete {access_token} {file_id} {permission_id}"));
            if self.fail_delete {
                return Err(drive_api::Error::Http("connection reset".into()));
            }
            Ok(())
        })
    }
}

/// Token endpoint double.
///
/// Accepts `GOOD_CODE` (with a PKCE verifier) and the refresh token `rt_1`;
/// everything else gets `invalid_grant`.
async fn token_endpoint(Form(form): Form<HashMap<String, String>>) -> impl IntoResponse {
    let field = |k: &str| form.get(k).map(String::as_str);
    match (field("grant_type"), field("code"), field("refresh_token")) {
        (Some("authorization_code"), Some(GOOD_CODE), _) if field("code_verifier").is_some() => (
            StatusCode::OK,
            axum::Json(serde_json::json!({
                "access_token": "at_1",
                "refresh_token": "rt_1",
                "expires_in": 3599,
                "scope": google_auth::DRIVE_SCOPE,
                "token_type": "Bearer",
            })),
        ),
        (Some("refresh_token"), _, Some("rt_1")) => (
            StatusCode::OK,
            axum::Json(serde_json::json!({
                "access_token": "at_refreshed",
                "expires_in": 3599,
                "token_type": "Bearer",
            })),
        ),
        _ => (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Bad Request",
            })),
        ),
    }
}

/// Serve the token endpoint double on an ephemeral port.
pub async fn start_token_server() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().route("/token", post(token_endpoint));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/token")).unwrap()
}

/// OAuth client pointed at `token_endpoint`, or at a closed port.
pub fn oauth_client(token_endpoint: Option<Url>) -> OAuthClient {
    OAuthClient {
        client_id: "1234.apps.googleusercontent.com".into(),
        client_secret: Secret::new("GOCSPX-test".into()),
        redirect_uri: "http://localhost:3000/oauth2callback".into(),
        auth_endpoint: Url::parse(google_auth::GOOGLE_AUTH_ENDPOINT).unwrap(),
        token_endpoint: token_endpoint
            .unwrap_or_else(|| Url::parse("http://127.0.0.1:1/token").unwrap()),
    }
}

pub fn test_gateway(drive: Arc<FakeDrive>, token_endpoint: Option<Url>) -> Gateway {
    Gateway::new(oauth_client(token_endpoint), reqwest::Client::new(), drive)
}

/// `state` query parameter of an authorization URL.
pub fn state_param(auth_url: &str) -> String {
    Url::parse(auth_url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}
