use crate::session::Session;
use crate::transport::{HttpRequest, HttpResponse, Method};
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn, Instrument};

/// Correlates every attempt of one logical request in server logs.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Per-request headers, query parameters and JSON body.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: HashMap<String, String>,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    fn into_request(self, method: Method, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: path.to_string(),
            headers: self.headers,
            query: self.query,
            body: self.body,
        }
    }
}

/// Perform one logical HTTP exchange through the session's client handle.
///
/// Transport failures and statuses listed in the session's
/// [`crate::RetryPolicy`] are retried with exponential backoff until the
/// attempt budget runs out. Any HTTP response that ends the loop is returned
/// unclassified, including the last retryable one; only transport failures
/// become errors.
///
/// Retries apply to every method. A POST that reached the server before a
/// 5xx or a dropped connection may be applied twice; pass a session with
/// [`crate::RetryPolicy::no_retry`] where that matters.
pub async fn execute_with_retry(
    session: &Session,
    method: Method,
    path: &str,
    options: RequestOptions,
) -> Result<HttpResponse> {
    let client = session.get_client()?;
    let policy = session.retry_policy();
    let attempts = policy.attempts();

    let mut request = options.into_request(method, path);
    let request_id = match request.header(REQUEST_ID_HEADER) {
        Some(id) => id.to_string(),
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            request
                .headers
                .insert(REQUEST_ID_HEADER.to_string(), id.clone());
            id
        }
    };

    let span = tracing::debug_span!(
        "http_request",
        method = %request.method,
        path = %request.path,
        request_id = %request_id,
    );

    async move {
        let mut attempt = 1;
        loop {
            debug!(attempt, "sending request");
            let retry = attempt - 1;

            match client.send(request.clone()).await {
                Ok(response) => {
                    let status = response.status();
                    if !policy.is_retryable_status(status) {
                        debug!(status, attempt, "request completed");
                        return Ok(response);
                    }
                    if attempt >= attempts {
                        warn!(status, attempt, "retries exhausted, returning last response");
                        return Ok(response);
                    }
                    let delay = policy.delay_for(retry, Some(&response));
                    warn!(status, attempt, ?delay, "retryable status, backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    if !err.is_retryable() || attempt >= attempts {
                        warn!(attempt, error = %err, "request failed");
                        return Err(err.into());
                    }
                    let delay = policy.delay_for(retry, None);
                    warn!(attempt, ?delay, error = %err, "transport error, backing off");
                    tokio::time::sleep(delay).await;
                }
            }

            attempt += 1;
        }
    }
    .instrument(span)
    .await
}
