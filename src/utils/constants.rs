//! Shared constants and invariants

pub const TDX_URL_BASE: &str = "https://tdx.transportdata.tw/api/basic/";
pub const TDX_AUTH_URL: &str =
    "https://tdx.transportdata.tw/auth/realms/TDXConnect/protocol/openid-connect/token";

/// Environment variable naming the credential file when no path is given.
pub const CREDENTIALS_FILE_ENV: &str = "TDX_CREDENTIALS_FILE";

pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 60;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 1_000;

pub const FORMAT_PARAM: &str = "$format";
pub const FORMAT_JSON: &str = "JSON";

pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

// sent instead of a bearer token when running without credentials
pub const ANONYMOUS_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
