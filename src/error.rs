//! Error types for the proxy.
//!
//! Construction problems surface as [`ConfigError`] and fail fast. Token
//! refresh problems surface as [`AuthError`] and are propagated out of
//! `fetch`. Transport failures on the data request are not retried.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no credential file given and TDX_CREDENTIALS_FILE is not set")]
    MissingCredentialPath,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed credential file {}: {source}", path.display())]
    MalformedCredentials {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid settings file {}: {source}", path.display())]
    MalformedSettings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token request rejected with status {status}")]
    Rejected { status: StatusCode },

    #[error("malformed token response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("token request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("token cannot be used as a header value")]
    InvalidToken,
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProxyError {
    pub fn is_config(&self) -> bool {
        matches!(self, ProxyError::Config(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ProxyError::Auth(_))
    }
}

pub type Result<T, E = ProxyError> = std::result::Result<T, E>;
