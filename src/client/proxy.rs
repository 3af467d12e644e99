use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use tracing::{error, info, info_span, warn, Instrument, Span};

use crate::cache::token::Token;
use crate::cache::token_cache::TokenCache;
use crate::client::request::{merge_headers, FetchRequest};
use crate::config::credentials::Credentials;
use crate::config::settings::ProxySettings;
use crate::error::{AuthError, ConfigError, Result};
use crate::resilience::retry::{RetryPolicy, Step};
use crate::sources::oauth2::OAuth2Source;
use crate::utils::constants::ANONYMOUS_USER_AGENT;

/// Authenticated GET client for the TDX data API.
///
/// Clones share the same token cache, so one proxy can be handed to many
/// tasks and they will refresh the bearer token at most once between them.
#[derive(Debug, Clone)]
pub struct TdxProxy {
    credentials: Credentials,
    settings: ProxySettings,
    retry: RetryPolicy,
    client: Client,
    auth: OAuth2Source,
    tokens: TokenCache,
    span: Span,
}

impl TdxProxy {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_settings(credentials, ProxySettings::default())
    }

    pub fn with_settings(credentials: Credentials, settings: ProxySettings) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(ConfigError::HttpClient)?;
        let auth = OAuth2Source::new(
            settings.auth_url.clone(),
            credentials.clone(),
            settings.safety_margin_seconds,
            client.clone(),
        );

        Ok(Self {
            retry: RetryPolicy::from(&settings.retry),
            credentials,
            settings,
            client,
            auth,
            tokens: TokenCache::new(),
            span: info_span!("tdx_proxy"),
        })
    }

    /// Client without credentials. Requests go out with a browser user agent
    /// and 401/429 responses are handed back untouched.
    pub fn no_auth() -> Result<Self> {
        Self::new(Credentials::anonymous())
    }

    /// Credentials from a JSON `app_id`/`app_key` file. Without an explicit
    /// path, `TDX_CREDENTIALS_FILE` names the file.
    pub fn from_credential_file(path: Option<&Path>) -> Result<Self> {
        Self::from_credential_file_with_settings(path, ProxySettings::default())
    }

    pub fn from_credential_file_with_settings(
        path: Option<&Path>,
        settings: ProxySettings,
    ) -> Result<Self> {
        let path = path.or(settings.credentials_file.as_deref());
        let credentials = Credentials::from_file(path)?;
        Self::with_settings(credentials, settings)
    }

    /// Start from a token obtained elsewhere instead of an empty cache.
    pub fn with_token(mut self, token: Token) -> Self {
        self.tokens = TokenCache::with_token(token);
        self
    }

    /// Events emitted by this client are recorded inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        !self.credentials.is_anonymous()
    }

    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    /// Cached token, if one has been fetched or seeded.
    pub async fn token(&self) -> Option<Token> {
        self.tokens.peek().await
    }

    /// GET `path` with the default `$format=JSON` query.
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.fetch(&FetchRequest::new(path)).await
    }

    /// Authenticated GET with transparent token refresh.
    ///
    /// A 401 forces a new token and a 429 waits before sending again, up to
    /// the retry bound; after that the last response is returned as is. Any
    /// other status is returned immediately. Only token refresh failures and
    /// transport errors are reported as `Err`.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Response> {
        let url = request.url(&self.settings.base_url);
        let span = self.span.clone();
        self.fetch_with_retry(request, &url)
            .instrument(info_span!(parent: &span, "fetch", path = %request.path))
            .await
    }

    async fn fetch_with_retry(&self, request: &FetchRequest, url: &str) -> Result<Response> {
        let timeout = request.timeout.unwrap_or_else(|| self.settings.timeout());
        let query = request.query();
        let mut retries = 0;
        let mut rejected: Option<String> = None;

        loop {
            let (auth_headers, sent_token) = self.auth_header(rejected.take(), timeout).await?;
            let headers = merge_headers(auth_headers, &request.headers);

            let response = self
                .client
                .get(url)
                .query(&query)
                .headers(headers)
                .timeout(timeout)
                .send()
                .await?;
            let status = response.status();

            match self.retry.next_step(status, self.is_authenticated(), retries) {
                Step::Success => {
                    info!(%status, attempt = retries + 1, "TDX proxy get {}", request.path);
                    return Ok(response);
                }
                Step::RefreshAndRetry if request.headers.contains_key(AUTHORIZATION) => {
                    // the server never saw the cached token, refreshing it cannot help
                    error!(%status, "caller supplied authorization was rejected");
                    return Ok(response);
                }
                Step::RefreshAndRetry => {
                    warn!(%status, attempt = retries + 1, "token rejected, refreshing");
                    rejected = sent_token;
                }
                Step::WaitAndRetry(delay) => {
                    warn!(%status, attempt = retries + 1, ?delay, "rate limited, backing off");
                    tokio::time::sleep(delay).await;
                }
                Step::GiveUpAnonymous => {
                    warn!(%status, "no credentials configured, returning response as is");
                    return Ok(response);
                }
                Step::GiveUpExhausted => {
                    error!(%status, attempts = retries + 1, "TDX proxy get {} failed after retries", request.path);
                    return Ok(response);
                }
                Step::Fail => {
                    error!(%status, "TDX proxy get {}", request.path);
                    return Ok(response);
                }
            }
            retries += 1;
        }
    }

    /// Headers identifying this client, plus the bearer value that was used
    /// so a 401 can name the token it rejected.
    async fn auth_header(
        &self,
        rejected: Option<String>,
        timeout: Duration,
    ) -> Result<(HeaderMap, Option<String>)> {
        let mut headers = HeaderMap::new();

        if !self.is_authenticated() {
            headers.insert(USER_AGENT, HeaderValue::from_static(ANONYMOUS_USER_AGENT));
            return Ok((headers, None));
        }

        let token = self
            .tokens
            .get_valid_token(rejected.as_deref(), || self.auth.fetch_token(timeout))
            .await?;

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.value))
            .map_err(|_| AuthError::InvalidToken)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        Ok((headers, Some(token.value)))
    }
}
