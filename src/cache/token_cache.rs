use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::token::Token;
use crate::error::AuthError;

/// Bearer token state shared by every clone of a proxy.
///
/// The lock is held across a refresh, so concurrent callers wait for the
/// in-flight request instead of issuing their own.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    inner: Arc<Mutex<Option<Token>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Token) -> Self {
        Self { inner: Arc::new(Mutex::new(Some(token))) }
    }

    /// Return a usable token, calling `refresh` when none is cached, the
    /// cached one has expired, or it is the `rejected` value the server
    /// just answered 401 to.
    ///
    /// If another caller already replaced the rejected token, the
    /// replacement is returned without a second refresh.
    pub async fn get_valid_token<F, Fut>(
        &self,
        rejected: Option<&str>,
        refresh: F,
    ) -> Result<Token, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token, AuthError>>,
    {
        let mut slot = self.inner.lock().await;

        let reusable = slot
            .as_ref()
            .filter(|token| !token.is_expired())
            .filter(|token| rejected != Some(token.value.as_str()));

        if let Some(token) = reusable {
            return Ok(token.clone());
        }

        debug!(
            cached = slot.is_some(),
            rejected = rejected.is_some(),
            "refreshing bearer token"
        );
        let token = refresh().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Current token, expired or not.
    pub async fn peek(&self) -> Option<Token> {
        self.inner.lock().await.clone()
    }
}
