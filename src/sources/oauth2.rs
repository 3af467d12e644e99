use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::cache::token::Token;
use crate::config::credentials::Credentials;
use crate::error::AuthError;
use crate::helpers::time::expires_at;
use crate::utils::constants::GRANT_TYPE_CLIENT_CREDENTIALS;

/// Client-credentials token endpoint.
#[derive(Debug, Clone)]
pub struct OAuth2Source {
    pub auth_url: String,
    pub credentials: Credentials,
    pub safety_margin_seconds: i64,
    pub client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl OAuth2Source {
    pub fn new(
        auth_url: impl Into<String>,
        credentials: Credentials,
        safety_margin_seconds: i64,
        client: Client,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            credentials,
            safety_margin_seconds,
            client,
        }
    }

    /// Form fields for the token request. A missing credential half is left out.
    pub fn form(&self) -> Vec<(&'static str, &str)> {
        let mut form = vec![("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS)];
        if let Some(client_id) = self.credentials.client_id.as_deref() {
            form.push(("client_id", client_id));
        }
        if let Some(client_secret) = self.credentials.client_secret.as_deref() {
            form.push(("client_secret", client_secret));
        }
        form
    }

    /// `timeout` bounds the whole token request; the token cache lock is
    /// held while it runs.
    pub async fn fetch_token(&self, timeout: Duration) -> Result<Token, AuthError> {
        let response = self
            .client
            .post(&self.auth_url)
            .form(&self.form())
            .timeout(timeout)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, url = %self.auth_url, "token request rejected");
            return Err(AuthError::Rejected { status });
        }

        let body = response.text().await.map_err(AuthError::Transport)?;
        let token = parse_token_response(&body, self.safety_margin_seconds)?;
        debug!(expires_at = token.expires_at, "bearer token acquired");
        Ok(token)
    }
}

fn parse_token_response(body: &str, safety_margin_seconds: i64) -> Result<Token, AuthError> {
    let parsed: TokenResponse =
        serde_json::from_str(body).map_err(AuthError::MalformedResponse)?;
    Ok(Token::new(
        parsed.access_token,
        expires_at(parsed.expires_in, safety_margin_seconds),
    ))
}
