use std::fs;
use std::path::Path;

use regex::{Captures, Regex};
use tracing::{debug, error};

use crate::config::settings::ProxySettings;
use crate::error::ConfigError;

/// Load proxy settings from a YAML file, expanding `${VAR}` and
/// `${VAR:default}` from the environment first. Missing keys keep their defaults.
pub fn file_to_settings(path: &Path) -> Result<ProxySettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let expanded = expand_env_vars(&content);
    parse_settings(&expanded).map_err(|source| {
        error!("parse settings error: {}", source);
        ConfigError::MalformedSettings { path: path.to_path_buf(), source }
    })
}

pub fn parse_settings(content: &str) -> Result<ProxySettings, serde_yaml::Error> {
    // an empty document means "all defaults"
    if content.trim().is_empty() {
        return Ok(ProxySettings::default());
    }
    let settings: ProxySettings = serde_yaml::from_str(content)?;
    debug!(?settings, "settings loaded");
    Ok(settings)
}

fn expand_env_vars(input: &str) -> String {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("static regex");
    re.replace_all(input, |caps: &Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}
