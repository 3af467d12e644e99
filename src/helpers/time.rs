use chrono::Utc;

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

/// Absolute expiration for a token declared valid for `expires_in` seconds,
/// pulled forward by `safety_margin_seconds`.
pub fn expires_at(expires_in: i64, safety_margin_seconds: i64) -> i64 {
    now_i64()
        .saturating_add(expires_in)
        .saturating_sub(safety_margin_seconds)
}
