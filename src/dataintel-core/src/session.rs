use crate::config::ClientConfig;
use crate::retry::RetryPolicy;
use crate::transport::{merge_headers, HttpTransport, ReqwestTransport, TransportOptions};
use crate::Result;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection configuration plus a lazily created client handle.
///
/// The handle is shared: once [`Session::get_client`] has handed it out,
/// [`Session::with_headers`] and [`Session::with_timeout`] update it in place
/// so that code already holding it sees the new settings. Derived sessions
/// start without a handle and build their own from the merged settings.
#[derive(Debug)]
pub struct Session {
    uri: String,
    headers: HashMap<String, String>,
    timeout: Duration,
    transport_options: TransportOptions,
    retry_policy: RetryPolicy,
    client: Mutex<Option<Arc<dyn HttpTransport>>>,
}

impl Session {
    pub fn new(uri: impl Into<String>) -> Self {
        Self::with_options(uri, HashMap::new(), DEFAULT_TIMEOUT, TransportOptions::default())
    }

    pub fn with_options(
        uri: impl Into<String>,
        headers: HashMap<String, String>,
        timeout: Duration,
        transport_options: TransportOptions,
    ) -> Self {
        Self {
            uri: uri.into(),
            headers,
            timeout,
            transport_options,
            retry_policy: RetryPolicy::default(),
            client: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_options(
            config.uri.clone(),
            config.headers.clone(),
            config.timeout(),
            config.transport.clone(),
        )
        .with_retry_policy(config.retry.clone())
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// New session with `extra` merged over this session's headers.
    ///
    /// Side effect: a live handle on `self` receives the merged headers.
    pub fn with_headers(&self, extra: HashMap<String, String>) -> Session {
        let mut headers = self.headers.clone();
        merge_headers(&mut headers, &extra);

        if let Some(client) = self.live_client() {
            client.update_headers(&headers);
        }

        self.derive(headers, self.timeout)
    }

    /// New session with a different timeout.
    ///
    /// Side effect: a live handle on `self` switches to `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Session {
        if let Some(client) = self.live_client() {
            client.set_timeout(timeout);
        }

        self.derive(self.headers.clone(), timeout)
    }

    /// Install an externally built handle, replacing any existing one.
    pub fn set_client(&self, client: Arc<dyn HttpTransport>) -> &Self {
        *self.slot() = Some(client);
        self
    }

    pub fn has_client(&self) -> bool {
        self.slot().is_some()
    }

    /// The session's handle, built on first use and reused afterwards.
    pub fn get_client(&self) -> Result<Arc<dyn HttpTransport>> {
        let mut slot = self.slot();
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        tracing::debug!(uri = %self.uri, timeout = ?self.timeout, "creating HTTP client");
        let client: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(
            self.uri.clone(),
            self.headers.clone(),
            self.timeout,
            &self.transport_options,
        )?);
        *slot = Some(client.clone());
        Ok(client)
    }

    fn derive(&self, headers: HashMap<String, String>, timeout: Duration) -> Session {
        Session {
            uri: self.uri.clone(),
            headers,
            timeout,
            transport_options: self.transport_options.clone(),
            retry_policy: self.retry_policy.clone(),
            client: Mutex::new(None),
        }
    }

    fn live_client(&self) -> Option<Arc<dyn HttpTransport>> {
        self.slot().clone()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<dyn HttpTransport>>> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A [`Session`] that carries a bearer token and the credentials used to
/// obtain it, so the token can be refreshed.
pub struct AuthenticatedSession {
    session: Session,
    token: String,
    username: String,
    password: String,
}

impl AuthenticatedSession {
    pub fn new(
        session: Session,
        token: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            session,
            token: token.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// `"Bearer <jwt>"`, ready for the `Authorization` header.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn with_headers(&self, extra: HashMap<String, String>) -> AuthenticatedSession {
        self.rewrap(self.session.with_headers(extra))
    }

    pub fn with_timeout(&self, timeout: Duration) -> AuthenticatedSession {
        self.rewrap(self.session.with_timeout(timeout))
    }

    fn rewrap(&self, session: Session) -> AuthenticatedSession {
        AuthenticatedSession::new(
            session,
            self.token.clone(),
            self.username.clone(),
            self.password.clone(),
        )
    }
}

impl Deref for AuthenticatedSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl fmt::Debug for AuthenticatedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedSession")
            .field("session", &self.session)
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What resource APIs need from a session.
pub trait ApiSession: Send + Sync {
    fn session(&self) -> &Session;

    /// Value for the `Authorization` header, when the session has one.
    fn authorization(&self) -> Option<&str> {
        None
    }
}

impl ApiSession for Session {
    fn session(&self) -> &Session {
        self
    }
}

impl ApiSession for AuthenticatedSession {
    fn session(&self) -> &Session {
        &self.session
    }

    fn authorization(&self) -> Option<&str> {
        Some(&self.token)
    }
}

impl<T: ApiSession + ?Sized> ApiSession for &T {
    fn session(&self) -> &Session {
        (**self).session()
    }

    fn authorization(&self) -> Option<&str> {
        (**self).authorization()
    }
}

impl<T: ApiSession + ?Sized> ApiSession for Arc<T> {
    fn session(&self) -> &Session {
        (**self).session()
    }

    fn authorization(&self) -> Option<&str> {
        (**self).authorization()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_session_defaults() {
        let s = Session::new("http://example.com");
        assert_eq!(s.uri(), "http://example.com");
        assert!(s.headers().is_empty());
        assert_eq!(s.timeout(), Duration::from_secs(300));
        assert!(!s.has_client());
        assert_eq!(s.transport_options(), &TransportOptions::default());
    }

    #[test]
    fn test_session_custom_options() {
        let options = TransportOptions {
            verify: Some(true),
            ..Default::default()
        };
        let s = Session::with_options(
            "http://example.com",
            headers(&[("a", "b")]),
            Duration::from_secs(10),
            options.clone(),
        );
        assert_eq!(s.headers(), &headers(&[("a", "b")]));
        assert_eq!(s.timeout(), Duration::from_secs(10));
        assert_eq!(s.transport_options(), &options);
    }

    #[test]
    fn test_with_headers_without_client() {
        let s = Session::with_options(
            "http://example.com",
            headers(&[("a", "b")]),
            DEFAULT_TIMEOUT,
            TransportOptions::default(),
        );
        let s2 = s.with_headers(headers(&[("c", "d")]));

        assert_eq!(s2.headers(), &headers(&[("a", "b"), ("c", "d")]));
        assert_eq!(s.headers(), &headers(&[("a", "b")]));
        assert!(!s2.has_client());
    }

    #[test]
    fn test_with_headers_extra_wins_on_collision() {
        let s = Session::with_options(
            "http://example.com",
            headers(&[("a", "b"), ("x", "old")]),
            DEFAULT_TIMEOUT,
            TransportOptions::default(),
        );
        let s2 = s.with_headers(headers(&[("x", "new")]));
        assert_eq!(s2.headers(), &headers(&[("a", "b"), ("x", "new")]));
        assert_eq!(s.headers().get("x").map(String::as_str), Some("old"));
    }

    #[test]
    fn test_with_headers_updates_live_client() {
        let s = Session::with_options(
            "http://example.com",
            headers(&[("a", "b")]),
            DEFAULT_TIMEOUT,
            TransportOptions::default(),
        );
        let mock = Arc::new(MockTransport::new("http://example.com").with_headers(headers(&[("a", "b")])));
        s.set_client(mock.clone());

        let s2 = s.with_headers(headers(&[("c", "d")]));

        assert_eq!(mock.headers().get("c").map(String::as_str), Some("d"));
        assert_eq!(s2.headers(), &headers(&[("a", "b"), ("c", "d")]));
        assert_eq!(s.headers(), &headers(&[("a", "b")]));
    }

    #[test]
    fn test_with_timeout_without_client() {
        let s = Session::new("http://example.com").with_timeout(Duration::from_secs(10));
        let s2 = s.with_timeout(Duration::from_secs(20));
        assert_eq!(s2.timeout(), Duration::from_secs(20));
        assert_eq!(s.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_with_timeout_updates_live_client() {
        let s = Session::new("http://example.com").with_timeout(Duration::from_secs(10));
        let mock = Arc::new(MockTransport::new("http://example.com").with_timeout(Duration::from_secs(10)));
        s.set_client(mock.clone());

        let s2 = s.with_timeout(Duration::from_secs(20));

        assert_eq!(mock.timeout(), Duration::from_secs(20));
        assert_eq!(s2.timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_set_client_returns_self() {
        let s = Session::new("http://example.com");
        let mock: Arc<dyn HttpTransport> = Arc::new(MockTransport::new("http://example.com"));

        let returned = s.set_client(mock.clone());

        assert!(std::ptr::eq(returned, &s));
        assert!(Arc::ptr_eq(&s.get_client().unwrap(), &mock));
    }

    #[test]
    fn test_get_client_creates_client_from_settings() {
        let s = Session::with_options(
            "http://example.com",
            headers(&[("x", "y")]),
            Duration::from_secs(123),
            TransportOptions {
                user_agent: Some("dataintel-test".to_string()),
                ..Default::default()
            },
        );

        let client = s.get_client().unwrap();

        assert_eq!(client.base_url(), "http://example.com");
        assert_eq!(client.headers(), headers(&[("x", "y")]));
        assert_eq!(client.timeout(), Duration::from_secs(123));
        assert!(s.has_client());
    }

    #[test]
    fn test_get_client_is_memoized() {
        let s = Session::new("http://example.com");
        let first = s.get_client().unwrap();
        let second = s.get_client().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_get_client_returns_existing_client() {
        let s = Session::new("http://example.com");
        let mock: Arc<dyn HttpTransport> = Arc::new(MockTransport::new("http://example.com"));
        s.set_client(mock.clone());
        assert!(Arc::ptr_eq(&s.get_client().unwrap(), &mock));
    }

    #[test]
    fn test_get_client_reports_unreadable_ca_cert() {
        let s = Session::with_options(
            "http://example.com",
            HashMap::new(),
            DEFAULT_TIMEOUT,
            TransportOptions {
                ca_cert_path: Some("/nonexistent/dataintel-ca.pem".to_string()),
                ..Default::default()
            },
        );
        let err = s.get_client().unwrap_err();
        assert!(matches!(
            err,
            crate::ClientError::Transport(crate::TransportError::Build(_))
        ));
        assert!(!s.has_client());
    }

    #[test]
    fn test_authenticated_session_derivation_keeps_credentials() {
        let auth = AuthenticatedSession::new(
            Session::new("http://example.com"),
            "Bearer abc",
            "user",
            "pass",
        );
        let derived = auth.with_headers(headers(&[("k", "v")]));

        assert_eq!(derived.token(), "Bearer abc");
        assert_eq!(derived.username(), "user");
        assert_eq!(derived.password(), "pass");
        assert_eq!(derived.uri(), "http://example.com");
        assert_eq!(derived.headers(), &headers(&[("k", "v")]));
        assert_eq!(ApiSession::authorization(&derived), Some("Bearer abc"));
    }

    #[test]
    fn test_authenticated_session_debug_redacts_secrets() {
        let auth = AuthenticatedSession::new(
            Session::new("http://example.com"),
            "Bearer secret-token",
            "user",
            "hunter2",
        );
        let debug = format!("{auth:?}");
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("user"));
    }

    #[test]
    fn test_plain_session_has_no_authorization() {
        let s = Session::new("http://example.com");
        assert_eq!(ApiSession::authorization(&s), None);
        assert!(std::ptr::eq(ApiSession::session(&s), &s));
    }
}
