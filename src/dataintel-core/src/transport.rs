use crate::{ClientError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

pub use reqwest::Method;

/// Low-level failure of a single HTTP attempt (no response was received).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl TransportError {
    /// Network conditions worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Connect(_) | TransportError::Timeout(_) | TransportError::Io(_)
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Io(err.to_string())
        }
    }
}

/// Transport-specific settings forwarded to the HTTP client builder.
///
/// Nothing here is validated up front; a bad proxy URL or unreadable CA file
/// surfaces as [`TransportError::Build`] when the handle is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportOptions {
    /// Verify server certificates. Unset means verification is disabled.
    #[serde(default)]
    pub verify: Option<bool>,
    /// Extra PEM root certificate to trust
    #[serde(default)]
    pub ca_cert_path: Option<String>,
    /// Proxy URL applied to every scheme
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl TransportOptions {
    pub fn verify_certificates(&self) -> bool {
        self.verify.unwrap_or(false)
    }
}

/// Mutable per-handle settings applied to every outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub headers: HashMap<String, String>,
    pub timeout: Duration,
}

/// One outgoing HTTP request, relative to the handle's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_json(self, value: &serde_json::Value) -> Self {
        self.with_header("content-type", "application/json")
            .with_body(value.to_string())
    }

    /// Header names are stored lowercase.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `Retry-After` given in whole seconds; HTTP-date values are ignored.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Decode the body into a validated record.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::InvalidResponse {
            record: std::any::type_name::<T>().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Merge `extra` over `headers`. Names compare case-insensitively; an entry
/// from `extra` replaces any existing spelling of the same name.
pub fn merge_headers<'a, I>(headers: &mut HashMap<String, String>, extra: I)
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    for (name, value) in extra {
        headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        headers.insert(name.clone(), value.clone());
    }
}

/// A live client handle owned by a [`crate::Session`].
///
/// Headers and timeout are interior-mutable so that every holder of the
/// handle observes updates made through the session.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;

    fn base_url(&self) -> &str;

    fn headers(&self) -> HashMap<String, String>;

    /// Merge `headers` into the handle's default headers.
    fn update_headers(&self, headers: &HashMap<String, String>);

    fn timeout(&self) -> Duration;

    fn set_timeout(&self, timeout: Duration);
}

/// reqwest-backed client handle.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    base_url: String,
    verify_certificates: bool,
    settings: RwLock<TransportSettings>,
}

impl ReqwestTransport {
    pub fn new(
        base_url: impl Into<String>,
        headers: HashMap<String, String>,
        timeout: Duration,
        options: &TransportOptions,
    ) -> std::result::Result<Self, TransportError> {
        let verify_certificates = options.verify_certificates();
        let mut builder =
            ReqwestClient::builder().danger_accept_invalid_certs(!verify_certificates);

        if let Some(path) = &options.ca_cert_path {
            let pem = std::fs::read(path)
                .map_err(|e| TransportError::Build(format!("reading {}: {}", path, e)))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| TransportError::Build(e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }
        if let Some(proxy) = &options.proxy {
            let proxy =
                reqwest::Proxy::all(proxy).map_err(|e| TransportError::Build(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        if let Some(secs) = options.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            verify_certificates,
            settings: RwLock::new(TransportSettings { headers, timeout }),
        })
    }

    pub fn verifies_certificates(&self) -> bool {
        self.verify_certificates
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn snapshot(&self) -> TransportSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let TransportSettings { headers, timeout } = self.snapshot();

        // Request headers override handle defaults of the same name.
        let mut header_map = HeaderMap::new();
        for (name, value) in headers.iter().chain(request.headers.iter()) {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header {}: {}", name, e)))?;
            header_map.insert(name, value);
        }

        let mut builder = self
            .client
            .request(request.method, self.url_for(&request.path))
            .timeout(timeout)
            .headers(header_map);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> HashMap<String, String> {
        self.snapshot().headers
    }

    fn update_headers(&self, headers: &HashMap<String, String>) {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        merge_headers(&mut settings.headers, headers);
    }

    fn timeout(&self) -> Duration {
        self.snapshot().timeout
    }

    fn set_timeout(&self, timeout: Duration) {
        self.settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .timeout = timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Item {
        id: String,
    }

    #[test]
    fn test_json_reports_record_name_on_failure() {
        let response = HttpResponse::new(200).with_json(&serde_json::json!([{"name": "x"}]));
        let err = response.json::<Vec<Item>>().unwrap_err();
        match err {
            ClientError::InvalidResponse { record, reason } => {
                assert!(record.starts_with("alloc::vec::Vec<"));
                assert!(record.ends_with("::Item>"));
                assert!(reason.contains("missing field `id`"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_retry_after_seconds() {
        let response = HttpResponse::new(429).with_header("Retry-After", "7");
        assert_eq!(response.retry_after(), Some(Duration::from_secs(7)));

        let response =
            HttpResponse::new(503).with_header("Retry-After", "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(response.retry_after(), None);
    }

    #[test]
    fn test_transport_error_retryability() {
        assert!(TransportError::Connect("refused".into()).is_retryable());
        assert!(TransportError::Timeout("slow".into()).is_retryable());
        assert!(!TransportError::InvalidRequest("bad header".into()).is_retryable());
        assert!(!TransportError::Build("bad proxy".into()).is_retryable());
    }

    #[test]
    fn test_reqwest_transport_defaults_to_no_verification() {
        let transport = ReqwestTransport::new(
            "https://di.example.com/",
            HashMap::new(),
            Duration::from_secs(300),
            &TransportOptions::default(),
        )
        .unwrap();
        assert!(!transport.verifies_certificates());
        assert_eq!(
            transport.url_for("/api/v1/collections"),
            "https://di.example.com/api/v1/collections"
        );
    }

    #[test]
    fn test_reqwest_transport_settings_are_mutable() {
        let transport = ReqwestTransport::new(
            "http://example.com",
            HashMap::from([("a".to_string(), "b".to_string())]),
            Duration::from_secs(10),
            &TransportOptions {
                verify: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(transport.verifies_certificates());

        transport.update_headers(&HashMap::from([("c".to_string(), "d".to_string())]));
        transport.set_timeout(Duration::from_secs(20));

        assert_eq!(transport.headers().get("a").map(String::as_str), Some("b"));
        assert_eq!(transport.headers().get("c").map(String::as_str), Some("d"));
        assert_eq!(transport.timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_merge_headers_ignores_name_case() {
        let mut headers = HashMap::from([
            ("X-Tenant".to_string(), "a".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ]);
        let extra = HashMap::from([("x-tenant".to_string(), "b".to_string())]);

        merge_headers(&mut headers, &extra);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("x-tenant").map(String::as_str), Some("b"));
        assert!(!headers.contains_key("X-Tenant"));
    }

    mod wire {
        use super::*;
        use crate::executor::{execute_with_retry, RequestOptions};
        use crate::retry::RetryPolicy;
        use crate::Session;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::sync::mpsc;

        /// Serves `replies` one connection each and forwards every raw request head.
        async fn serve(replies: Vec<String>) -> (String, mpsc::UnboundedReceiver<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(async move {
                for reply in replies {
                    let (mut stream, _) = listener.accept().await.unwrap();
                    let head = read_head(&mut stream).await;
                    tx.send(head).ok();
                    stream.write_all(reply.as_bytes()).await.unwrap();
                    stream.shutdown().await.ok();
                }
            });
            (url, rx)
        }

        async fn read_head(stream: &mut TcpStream) -> String {
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            String::from_utf8_lossy(&raw).into_owned()
        }

        fn reply(status: &str, extra_headers: &str, body: &str) -> String {
            format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n{}\r\n{}",
                status,
                body.len(),
                extra_headers,
                body
            )
        }

        fn header_lines<'a>(head: &'a str, name: &str) -> Vec<&'a str> {
            head.lines()
                .filter(|line| {
                    line.split(':')
                        .next()
                        .is_some_and(|key| key.eq_ignore_ascii_case(name))
                })
                .collect()
        }

        fn transport(url: &str, headers: HashMap<String, String>) -> ReqwestTransport {
            ReqwestTransport::new(url, headers, Duration::from_secs(5), &TransportOptions::default())
                .unwrap()
        }

        #[tokio::test]
        async fn test_request_header_replaces_handle_header_of_any_case() {
            let (url, mut heads) = serve(vec![reply("200 OK", "", "")]).await;
            let transport = transport(
                &url,
                HashMap::from([("authorization".to_string(), "Bearer stale".to_string())]),
            );
            let mut request = HttpRequest::new(Method::GET, "/api/v1/collections");
            request
                .headers
                .insert("Authorization".to_string(), "Bearer fresh".to_string());

            transport.send(request).await.unwrap();

            let head = heads.recv().await.unwrap();
            assert!(head.starts_with("GET /api/v1/collections HTTP/1.1"));
            let lines = header_lines(&head, "authorization");
            assert_eq!(lines.len(), 1, "{head}");
            assert!(lines[0].ends_with("Bearer fresh"));
        }

        #[tokio::test]
        async fn test_live_handle_sends_headers_updated_through_session() {
            let (url, mut heads) = serve(vec![reply("200 OK", "", ""), reply("200 OK", "", "")]).await;
            let session = Session::with_options(
                url,
                HashMap::from([("X-Tenant".to_string(), "a".to_string())]),
                Duration::from_secs(5),
                TransportOptions::default(),
            );
            let handle = session.get_client().unwrap();

            handle.send(HttpRequest::new(Method::GET, "/first")).await.unwrap();
            let _derived =
                session.with_headers(HashMap::from([("x-tenant".to_string(), "b".to_string())]));
            handle.send(HttpRequest::new(Method::GET, "/second")).await.unwrap();

            let first = heads.recv().await.unwrap();
            assert!(header_lines(&first, "x-tenant")[0].ends_with('a'));
            let second = heads.recv().await.unwrap();
            let lines = header_lines(&second, "x-tenant");
            assert_eq!(lines.len(), 1, "{second}");
            assert!(lines[0].ends_with('b'));
        }

        #[tokio::test]
        async fn test_response_status_headers_and_body_are_captured() {
            let (url, _heads) =
                serve(vec![reply("404 Not Found", "Retry-After: 3\r\n", "no such collection")]).await;
            let transport = transport(&url, HashMap::new());

            let response = transport
                .send(HttpRequest::new(Method::GET, "/api/v1/collections/missing"))
                .await
                .unwrap();

            assert_eq!(response.status(), 404);
            assert!(!response.is_success());
            assert_eq!(response.text(), "no such collection");
            assert_eq!(response.retry_after(), Some(Duration::from_secs(3)));
        }

        #[tokio::test]
        async fn test_json_body_and_query_reach_the_server() {
            let (url, mut heads) = serve(vec![reply("201 Created", "", "{}")]).await;
            let transport = transport(&url, HashMap::new());
            let mut request = HttpRequest::new(Method::POST, "/api/v1/pipelines");
            request.query.push(("dry_run".to_string(), "true".to_string()));
            request.body = Some(serde_json::json!({"name": "p"}));

            let response = transport.send(request).await.unwrap();

            assert_eq!(response.status(), 201);
            let head = heads.recv().await.unwrap();
            assert!(head.starts_with("POST /api/v1/pipelines?dry_run=true HTTP/1.1"));
            assert!(header_lines(&head, "content-type")[0].contains("application/json"));
        }

        #[tokio::test]
        async fn test_slow_server_maps_to_timeout() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            tokio::spawn(async move {
                let (_stream, _) = listener.accept().await.unwrap();
                tokio::time::sleep(Duration::from_secs(5)).await;
            });
            let transport = transport(&url, HashMap::new());
            transport.set_timeout(Duration::from_millis(100));

            let err = transport
                .send(HttpRequest::new(Method::GET, "/slow"))
                .await
                .unwrap_err();

            assert!(matches!(err, TransportError::Timeout(_)), "{err:?}");
            assert!(err.is_retryable());
        }

        #[tokio::test]
        async fn test_refused_connection_maps_to_connect() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            drop(listener);
            let transport = transport(&url, HashMap::new());

            let err = transport
                .send(HttpRequest::new(Method::GET, "/"))
                .await
                .unwrap_err();

            assert!(matches!(err, TransportError::Connect(_)), "{err:?}");
        }

        #[tokio::test]
        async fn test_refused_connection_is_retried_until_server_is_up() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let listener = TcpListener::bind(addr).await.unwrap();
                let (mut stream, _) = listener.accept().await.unwrap();
                read_head(&mut stream).await;
                stream
                    .write_all(reply("200 OK", "", "up").as_bytes())
                    .await
                    .unwrap();
                stream.shutdown().await.ok();
            });
            let session = Session::new(format!("http://{}", addr)).with_retry_policy(
                RetryPolicy::default()
                    .with_max_attempts(5)
                    .with_initial_backoff(Duration::from_millis(200))
                    .with_max_backoff(Duration::from_millis(200)),
            );

            let response =
                execute_with_retry(&session, Method::GET, "/health", RequestOptions::new())
                    .await
                    .unwrap();

            assert_eq!(response.status(), 200);
            assert_eq!(response.text(), "up");
        }
    }
}
