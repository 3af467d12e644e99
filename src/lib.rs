//! # TDX Proxy Library
//!
//! Authenticated GET access to the TDX transport open-data API.
//! Handles OAuth2 client-credentials token acquisition, transparent
//! token refresh and bounded retry on 401/429, so callers only deal
//! with paths and query parameters.
//!
//! Modules:
//! - `client` — the proxy itself and per-call request context
//! - `config` — credentials, settings and settings file loading
//! - `cache` — shared bearer token state
//! - `sources` — OAuth2 client-credentials token endpoint
//! - `resilience` — retry policy for a single GET

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod helpers;
pub mod resilience;
pub mod sources;
pub mod utils;
#[cfg(test)]
mod tests;


pub use crate::cache::token::Token;
pub use crate::client::proxy::TdxProxy;
pub use crate::client::request::FetchRequest;
pub use crate::config::credentials::Credentials;
pub use crate::config::settings::ProxySettings;
pub use crate::error::{AuthError, ConfigError, ProxyError};
