//! Configuration types and loading
//!
//! Precedence: env vars > config file > defaults. The client secret comes
//! from GOOGLE_CLIENT_SECRET or `client_secret_file`, never from the TOML
//! itself, so the config file can be committed.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use common::Secret;
use google_auth::{GOOGLE_AUTH_ENDPOINT, GOOGLE_TOKEN_ENDPOINT, OAuthClient};
use serde::Deserialize;
use url::Url;

/// Default config file looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "drive-gateway.toml";

/// Fully resolved configuration.
#[derive(Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub oauth: OAuthClient,
    pub drive_api_base: Url,
    /// File and recipient for `/transfer-ownership`. `None` leaves the route
    /// answering with a configuration error.
    pub transfer: Option<TransferTarget>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Timeout for each outbound call to Google
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_connections: default_max_connections(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub file_id: String,
    pub new_owner: String,
}

/// On-disk shape. Everything optional so env vars alone are enough.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    google: GoogleSection,
    #[serde(default)]
    transfer: TransferSection,
}

#[derive(Debug, Deserialize)]
struct GoogleSection {
    client_id: Option<String>,
    redirect_uri: Option<String>,
    client_secret_file: Option<PathBuf>,
    #[serde(default = "default_auth_endpoint")]
    auth_endpoint: String,
    #[serde(default = "default_token_endpoint")]
    token_endpoint: String,
    #[serde(default = "default_drive_api_base")]
    drive_api_base: String,
}

impl Default for GoogleSection {
    fn default() -> Self {
        Self {
            client_id: None,
            redirect_uri: None,
            client_secret_file: None,
            auth_endpoint: default_auth_endpoint(),
            token_endpoint: default_token_endpoint(),
            drive_api_base: default_drive_api_base(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TransferSection {
    file_id: Option<String>,
    new_owner: Option<String>,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_max_connections() -> usize {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_auth_endpoint() -> String {
    GOOGLE_AUTH_ENDPOINT.into()
}

fn default_token_endpoint() -> String {
    GOOGLE_TOKEN_ENDPOINT.into()
}

fn default_drive_api_base() -> String {
    drive_api::DRIVE_API_BASE.into()
}

impl Config {
    /// Load from an optional TOML file, then overlay process env vars.
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an injectable env lookup.
    ///
    /// Empty env values are treated as unset.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> common::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let mut file = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str::<FileConfig>(&contents)?
            }
            None => FileConfig::default(),
        };

        if let Some(addr) = env("LISTEN_ADDR") {
            file.server.listen_addr = addr.parse().map_err(|e| {
                common::Error::Config(format!("LISTEN_ADDR is not a socket address ({addr}): {e}"))
            })?;
        }

        if file.server.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if file.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        let google = file.google;
        let client_id = env("GOOGLE_CLIENT_ID")
            .or(google.client_id)
            .ok_or(common::Error::MissingSetting {
                setting: "google.client_id",
                env_var: "GOOGLE_CLIENT_ID",
            })?;

        let redirect_uri = env("REDIRECT_URI")
            .or(google.redirect_uri)
            .ok_or(common::Error::MissingSetting {
                setting: "google.redirect_uri",
                env_var: "REDIRECT_URI",
            })?;
        parse_http_url("redirect_uri", &redirect_uri)?;

        // Secret resolution: env var takes precedence over file
        let client_secret = match env("GOOGLE_CLIENT_SECRET") {
            Some(secret) => Secret::new(secret),
            None => {
                let key_file = google.client_secret_file.ok_or(common::Error::MissingSetting {
                    setting: "google.client_secret_file",
                    env_var: "GOOGLE_CLIENT_SECRET",
                })?;
                let secret = std::fs::read_to_string(&key_file).map_err(|e| {
                    common::Error::Config(format!(
                        "failed to read client_secret_file {}: {e}",
                        key_file.display()
                    ))
                })?;
                let secret = secret.trim().to_owned();
                if secret.is_empty() {
                    return Err(common::Error::Config(format!(
                        "client_secret_file {} is empty",
                        key_file.display()
                    )));
                }
                Secret::new(secret)
            }
        };

        let oauth = OAuthClient {
            client_id,
            client_secret,
            redirect_uri,
            auth_endpoint: parse_http_url("auth_endpoint", &google.auth_endpoint)?,
            token_endpoint: parse_http_url("token_endpoint", &google.token_endpoint)?,
        };
        let drive_api_base = parse_http_url("drive_api_base", &google.drive_api_base)?;

        let file_id = env("TRANSFER_FILE_ID").or(file.transfer.file_id);
        let new_owner = env("TRANSFER_NEW_OWNER").or(file.transfer.new_owner);
        let transfer = match (file_id, new_owner) {
            (Some(file_id), Some(new_owner)) => Some(TransferTarget { file_id, new_owner }),
            (None, None) => None,
            _ => {
                return Err(common::Error::Config(
                    "transfer.file_id and transfer.new_owner must be set together".into(),
                ));
            }
        };

        Ok(Self {
            server: file.server,
            oauth,
            drive_api_base,
            transfer,
        })
    }

    /// Resolve the config file path from CLI arg, CONFIG_PATH, or the default.
    ///
    /// An explicit path is returned even if it doesn't exist so loading fails
    /// loudly. The default file is optional.
    pub fn resolve_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return Some(PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }
}

fn parse_http_url(field: &str, value: &str) -> common::Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| common::Error::Config(format!("{field} is not a valid URL ({value}): {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(common::Error::Config(format!(
            "{field} must start with http:// or https://, got: {value}"
        )));
    }
    Ok(url)
}
