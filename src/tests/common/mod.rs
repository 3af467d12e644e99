// tests/common/mod.rs
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::extract::RawQuery;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::json;
use tokio::task::JoinHandle;

use crate::config::credentials::Credentials;
use crate::config::settings::ProxySettings;

pub const DATA_PATH: &str = "v2/Bus/Alert/City/Taichung";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn credentials() -> Credentials {
    Credentials::new(Some("app-id".to_owned()), Some("app-key".to_owned()))
}

pub fn settings_for(auth_url: String, base_url: String) -> ProxySettings {
    ProxySettings {
        base_url,
        auth_url,
        timeout_ms: 5_000,
        ..ProxySettings::default()
    }
}

/// Token endpoint issuing `token-1`, `token-2`, ... and remembering each form body.
pub struct AuthServer {
    pub handle: JoinHandle<()>,
    pub addr: SocketAddr,
    pub forms: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl AuthServer {
    pub fn url(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.forms.lock().unwrap().len()
    }
}

pub async fn spawn_auth_server(expires_in: i64) -> AuthServer {
    let forms: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
    let recorded = forms.clone();
    let router = Router::new().route(
        "/token",
        post(move |Form(form): Form<HashMap<String, String>>| {
            let recorded = recorded.clone();
            async move {
                let mut forms = recorded.lock().unwrap();
                forms.push(form);
                Json(json!({
                    "access_token": format!("token-{}", forms.len()),
                    "expires_in": expires_in,
                    "token_type": "Bearer",
                }))
            }
        }),
    );
    let (handle, addr) = spawn_axum(router).await;
    AuthServer { handle, addr, forms }
}

/// What the data endpoint saw for one request.
#[derive(Debug, Clone)]
pub struct Seen {
    pub at: Instant,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub query: Option<String>,
    pub custom: Option<String>,
}

/// Data endpoint answering the scripted statuses in order, repeating the last one.
pub struct DataServer {
    pub handle: JoinHandle<()>,
    pub addr: SocketAddr,
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

impl DataServer {
    pub fn base_url(&self) -> String {
        format!("http://{}/api/basic/", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

pub async fn spawn_data_server(statuses: Vec<u16>) -> DataServer {
    let seen: Arc<Mutex<Vec<Seen>>> = Arc::default();
    let recorded = seen.clone();
    let counter = Arc::new(AtomicUsize::new(0));
    let statuses = Arc::new(statuses);

    let router = Router::new().route(
        &format!("/api/basic/{}", DATA_PATH),
        get(move |RawQuery(query): RawQuery, headers: HeaderMap| {
            let recorded = recorded.clone();
            let counter = counter.clone();
            let statuses = statuses.clone();
            async move {
                recorded.lock().unwrap().push(Seen {
                    at: Instant::now(),
                    authorization: header_str(&headers, header::AUTHORIZATION.as_str()),
                    user_agent: header_str(&headers, header::USER_AGENT.as_str()),
                    query,
                    custom: header_str(&headers, "x-trace"),
                });
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let code = statuses[n.min(statuses.len() - 1)];
                (StatusCode::from_u16(code).unwrap(), format!("{{\"attempt\":{}}}", n + 1))
            }
        }),
    );
    let (handle, addr) = spawn_axum(router).await;
    DataServer { handle, addr, seen }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

/// Token endpoint that accepts the request and never answers.
pub async fn spawn_stalled_auth_server() -> (JoinHandle<()>, String) {
    let router = Router::new().route(
        "/token",
        post(|| async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            "too late"
        }),
    );
    let (handle, addr) = spawn_axum(router).await;
    (handle, format!("http://{}/token", addr))
}
