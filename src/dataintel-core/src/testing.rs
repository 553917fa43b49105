//! In-memory client handle for tests.
//!
//! Install it on a session with [`crate::Session::set_client`]; every request
//! is recorded and answered from a script, then from a fallback response.

use crate::session::DEFAULT_TIMEOUT;
use crate::transport::{
    merge_headers, HttpRequest, HttpResponse, HttpTransport, TransportError, TransportSettings,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

type Reply = Result<HttpResponse, TransportError>;

#[derive(Debug)]
pub struct MockTransport {
    base_url: String,
    settings: RwLock<TransportSettings>,
    script: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Option<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            settings: RwLock::new(TransportSettings {
                headers: HashMap::new(),
                timeout: DEFAULT_TIMEOUT,
            }),
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_headers(self, headers: HashMap<String, String>) -> Self {
        write(&self.settings).headers = headers;
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        write(&self.settings).timeout = timeout;
        self
    }

    /// Answer every unscripted request with `response`.
    pub fn respond_with(self, response: HttpResponse) -> Self {
        *lock(&self.fallback) = Some(Ok(response));
        self
    }

    /// Fail every unscripted request with `error`.
    pub fn fail_with(self, error: TransportError) -> Self {
        *lock(&self.fallback) = Some(Err(error));
        self
    }

    /// Answer the next unanswered request with `response`.
    pub fn then_respond(self, response: HttpResponse) -> Self {
        lock(&self.script).push_back(Ok(response));
        self
    }

    /// Fail the next unanswered request with `error`.
    pub fn then_fail(self, error: TransportError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request);

        if let Some(reply) = lock(&self.script).pop_front() {
            return reply;
        }
        lock(&self.fallback)
            .clone()
            .unwrap_or_else(|| Err(TransportError::Connect("no scripted response".to_string())))
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> HashMap<String, String> {
        read(&self.settings).headers.clone()
    }

    fn update_headers(&self, headers: &HashMap<String, String>) {
        merge_headers(&mut write(&self.settings).headers, headers);
    }

    fn timeout(&self) -> Duration {
        read(&self.settings).timeout
    }

    fn set_timeout(&self, timeout: Duration) {
        write(&self.settings).timeout = timeout;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
