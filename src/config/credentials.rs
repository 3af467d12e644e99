use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::utils::constants::CREDENTIALS_FILE_ENV;

/// OAuth2 client credentials. Both halves absent means anonymous access.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// On-disk credential file: `{"app_id": "...", "app_key": "..."}`
#[derive(Debug, Deserialize)]
pub struct CredentialFile {
    pub app_id: String,
    pub app_key: String,
}

impl Credentials {
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Self {
        Self { client_id, client_secret }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.client_id.is_none() && self.client_secret.is_none()
    }

    /// Load credentials from `path`, or from the file named by
    /// `TDX_CREDENTIALS_FILE` when no path is given.
    pub fn from_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_credentials_path(path)?;
        debug!(path = %path.display(), "loading credentials");

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let file: CredentialFile = serde_json::from_str(&content)
            .map_err(|source| ConfigError::MalformedCredentials { path, source })?;

        Ok(file.into())
    }
}

impl From<CredentialFile> for Credentials {
    fn from(file: CredentialFile) -> Self {
        Self::new(Some(file.app_id), Some(file.app_key))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

fn resolve_credentials_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => std::env::var_os(CREDENTIALS_FILE_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingCredentialPath),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn anonymous_only_when_both_halves_absent() {
        assert!(Credentials::anonymous().is_anonymous());
        assert!(!Credentials::new(Some("id".into()), None).is_anonymous());
        assert!(!Credentials::new(None, Some("secret".into())).is_anonymous());
    }

    #[test]
    fn debug_hides_secret() {
        let creds = Credentials::new(Some("id".into()), Some("hunter2".into()));
        let printed = format!("{:?}", creds);
        assert!(printed.contains("id"));
        assert!(!printed.contains("hunter2"));
    }
}
