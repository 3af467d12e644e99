use std::time::Duration;

use reqwest::StatusCode;

use crate::config::settings::RetryConfig;

/// Bounds the recovery loop around a single GET.
///
/// Only 401 and 429 are ever retried. `max_retries` counts attempts after
/// the first one, so the default of 2 means at most 3 requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetryConfig::default())
    }
}

/// What to do with the response of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// 2xx or 304.
    Success,
    /// Discard the current token, fetch a new one and send again.
    RefreshAndRetry,
    /// Sleep, then send again with the same token.
    WaitAndRetry(Duration),
    /// 401/429 that cannot be recovered: no credentials to refresh with.
    GiveUpAnonymous,
    /// 401/429 after the retry bound was reached.
    GiveUpExhausted,
    /// Any other status. Never retried.
    Fail,
}

impl RetryPolicy {
    /// `retries` is the number of retries already performed for this request.
    pub fn next_step(&self, status: StatusCode, authenticated: bool, retries: u32) -> Step {
        if status.is_success() || status == StatusCode::NOT_MODIFIED {
            return Step::Success;
        }

        let recovery = match status {
            StatusCode::UNAUTHORIZED => Step::RefreshAndRetry,
            StatusCode::TOO_MANY_REQUESTS => Step::WaitAndRetry(self.rate_limit_delay),
            _ => return Step::Fail,
        };

        if !authenticated {
            Step::GiveUpAnonymous
        } else if retries >= self.max_retries {
            Step::GiveUpExhausted
        } else {
            recovery
        }
    }
}
