use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use reqwest::StatusCode;
use tdx_proxy::config::loader::file_to_settings;
use tdx_proxy::config::settings::ProxySettings;
use tdx_proxy::utils::logging::{self, LogLevel};
use tdx_proxy::{Credentials, FetchRequest, TdxProxy};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path relative to the base url, e.g. v2/Bus/Alert/City/Taichung
    path: String,
    /// JSON file with app_id and app_key
    #[arg(short, long, env = "TDX_CREDENTIALS_FILE")]
    credentials: Option<PathBuf>,
    /// Send requests without a bearer token
    #[arg(long)]
    no_auth: bool,
    /// YAML settings file
    #[arg(long, env = "TDX_PROXY_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
    /// Query parameter as KEY=VALUE, replaces the default $format=JSON
    #[arg(short, long = "param", value_parser = parse_pair::<'='>)]
    params: Vec<(String, String)>,
    /// Extra header as NAME:VALUE
    #[arg(short = 'H', long = "header", value_parser = parse_pair::<':'>)]
    headers: Vec<(String, String)>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

fn parse_pair<const SEP: char>(raw: &str) -> Result<(String, String)> {
    raw.split_once(SEP)
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .ok_or_else(|| anyhow!("expected KEY{}VALUE, got '{}'", SEP, raw))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // -------------------------------
    // 1. Settings and logging
    // -------------------------------

    let mut settings = match &args.config {
        Some(path) => file_to_settings(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ProxySettings::default(),
    };
    if let Some(timeout_ms) = args.timeout_ms {
        settings.timeout_ms = timeout_ms;
    }
    logging::init_logging(&logging::resolve(&settings.logging, args.log_level));

    // -------------------------------
    // 2. Build proxy
    // -------------------------------

    let proxy = if args.no_auth {
        TdxProxy::with_settings(Credentials::anonymous(), settings)?
    } else {
        TdxProxy::from_credential_file_with_settings(args.credentials.as_deref(), settings)
            .context("loading credentials (use --no-auth for anonymous access)")?
    };

    // -------------------------------
    // 3. Fetch
    // -------------------------------

    let mut request = FetchRequest::new(&args.path);
    if let Some(base_url) = args.base_url {
        request = request.base_url(base_url);
    }
    if !args.params.is_empty() {
        request = request.params(args.params);
    }
    for (name, value) in &args.headers {
        request = request.header(name, value)?;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        request = request.timeout(Duration::from_millis(timeout_ms));
    }

    let response = proxy.fetch(&request).await?;
    let status = response.status();
    let body = response.text().await.context("reading response body")?;

    info!(%status, bytes = body.len(), "done");
    eprintln!("{}", status);
    println!("{}", body);

    if is_success(status) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn is_success(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::NOT_MODIFIED
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn query_param_pairs_split_on_first_equals() {
        assert_eq!(
            parse_pair::<'='>("$filter=RouteID eq '309'").unwrap(),
            ("$filter".to_owned(), "RouteID eq '309'".to_owned())
        );
        assert_eq!(
            parse_pair::<'='>("$select=a=b").unwrap(),
            ("$select".to_owned(), "a=b".to_owned())
        );
        assert!(parse_pair::<'='>("$top").is_err());
    }

    #[test]
    fn header_pairs_split_on_first_colon_and_trim() {
        assert_eq!(
            parse_pair::<':'>("If-Modified-Since: Tue, 01 Oct 2024 00:00:00 GMT").unwrap(),
            ("If-Modified-Since".to_owned(), "Tue, 01 Oct 2024 00:00:00 GMT".to_owned())
        );
        assert!(parse_pair::<':'>("X-Trace").is_err());
    }

    #[test]
    fn only_success_and_not_modified_exit_cleanly() {
        assert!(is_success(StatusCode::OK));
        assert!(is_success(StatusCode::NOT_MODIFIED));
        assert!(!is_success(StatusCode::UNAUTHORIZED));
        assert!(!is_success(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_success(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn args_collect_repeated_params_and_headers() {
        let args = Args::try_parse_from([
            "tdx-proxy",
            "v2/Bus/Alert/City/Taichung",
            "--no-auth",
            "-p",
            "$format=JSON",
            "--param",
            "$top=5",
            "-H",
            "X-Trace: abc",
        ])
        .unwrap();

        assert!(args.no_auth);
        assert_eq!(args.params.len(), 2);
        assert_eq!(args.headers, vec![("X-Trace".to_owned(), "abc".to_owned())]);
    }
}
