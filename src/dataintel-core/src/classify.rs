//! Maps HTTP statuses returned by [`crate::execute_with_retry`] onto
//! [`ClientError`] variants.

use crate::transport::HttpResponse;
use crate::{ClientError, Result};
use serde::de::DeserializeOwned;

/// Pass 2xx responses through; 401 becomes `Unauthorized`, everything else
/// `UnexpectedStatus`.
pub fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }

    match response.status() {
        401 => Err(ClientError::Unauthorized {
            body: response.text(),
        }),
        status => Err(ClientError::UnexpectedStatus {
            status,
            body: response.text(),
        }),
    }
}

/// Similarity search reports every non-2xx status as its own failure kind.
pub fn check_search_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClientError::SimilaritySearchFailure {
            status: response.status(),
            text: response.text(),
        })
    }
}

/// Classify, then decode the body into `T`.
pub fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    check_status(response)?.json()
}

pub fn not_implemented(operation: &str) -> ClientError {
    ClientError::NotImplemented(format!("{} not implemented", operation))
}
