//! DataIntel Client Core
//!
//! The request layer shared by every DataIntel resource API:
//! - Sessions with a lazily created, shared HTTP client handle
//! - Retry executor with bounded exponential backoff
//! - Status classification into typed errors
//! - Validated domain records and client configuration

pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod retry;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use classify::{check_search_status, check_status, not_implemented, parse_json};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use executor::{execute_with_retry, RequestOptions, REQUEST_ID_HEADER};
pub use models::*;
pub use retry::RetryPolicy;
pub use session::{ApiSession, AuthenticatedSession, Session, DEFAULT_TIMEOUT};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, TransportError,
    TransportOptions,
};
