use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::ConfigError;
use crate::utils::constants::{FORMAT_JSON, FORMAT_PARAM};

/// One GET against the data API. Built fresh per call; nothing here is
/// shared between requests.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub path: String,
    /// overrides the proxy's base url for this call
    pub base_url: Option<String>,
    /// replaces the default `$format=JSON` set entirely when given
    pub params: Option<Vec<(String, String)>>,
    pub headers: HeaderMap,
    /// per attempt, not across retries
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            base_url: None,
            params: None,
            headers: HeaderMap::new(),
            timeout: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn params<K, V, I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params = Some(params.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidHeader {
            name: name.to_owned(),
            reason,
        };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        self.headers.append(header_name, header_value);
        Ok(self)
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn url(&self, default_base: &str) -> String {
        format!("{}{}", self.base_url.as_deref().unwrap_or(default_base), self.path)
    }

    pub fn query(&self) -> Vec<(String, String)> {
        match &self.params {
            Some(params) => params.clone(),
            None => default_query(),
        }
    }
}

fn default_query() -> Vec<(String, String)> {
    vec![(FORMAT_PARAM.to_owned(), FORMAT_JSON.to_owned())]
}

/// Overlay `extra` on `base`. A name present in `extra` replaces every value
/// `base` had for it; header names compare case-insensitively.
pub fn merge_headers(mut base: HeaderMap, extra: &HeaderMap) -> HeaderMap {
    for name in extra.keys() {
        base.remove(name);
    }
    for (name, value) in extra {
        base.append(name.clone(), value.clone());
    }
    base
}

#[cfg(test)]
mod test {
    use super::*;
    use reqwest::header::{AUTHORIZATION, USER_AGENT};

    #[test]
    fn default_query_is_json_format() {
        let request = FetchRequest::new("v2/Bus/Alert/City/Taichung");
        assert_eq!(request.query(), vec![("$format".to_owned(), "JSON".to_owned())]);
    }

    #[test]
    fn caller_params_replace_defaults() {
        let request = FetchRequest::new("v2/Bus/Alert/City/Taichung")
            .param("$filter", "Scope/Routes/Any(route: route/RouteID eq '309')");
        assert_eq!(request.query().len(), 1);
        assert_eq!(request.query()[0].0, "$filter");
    }

    #[test]
    fn url_joins_base_and_path() {
        let request = FetchRequest::new("v2/Rail/TRA/Station");
        assert_eq!(
            request.url("https://tdx.transportdata.tw/api/basic/"),
            "https://tdx.transportdata.tw/api/basic/v2/Rail/TRA/Station"
        );
        let request = request.base_url("http://localhost:8080/api/");
        assert_eq!(request.url("ignored"), "http://localhost:8080/api/v2/Rail/TRA/Station");
    }

    #[test]
    fn caller_headers_win_on_collision() {
        let mut base = HeaderMap::new();
        base.insert(AUTHORIZATION, HeaderValue::from_static("Bearer cached"));
        base.insert(USER_AGENT, HeaderValue::from_static("tdx-proxy"));

        let request = FetchRequest::new("x")
            .header("Authorization", "Bearer override")
            .unwrap();
        let merged = merge_headers(base, &request.headers);

        assert_eq!(merged.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(merged[AUTHORIZATION], "Bearer override");
        assert_eq!(merged[USER_AGENT], "tdx-proxy");
    }

    #[test]
    fn invalid_header_is_a_config_error() {
        let err = FetchRequest::new("x").header("bad header", "v").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeader { .. }));
    }
}
