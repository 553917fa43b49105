//! One module per resource. Every operation is a single call to
//! [`execute_with_retry`](dataintel_core::execute_with_retry) followed by
//! status classification and record decoding.

mod auth;
mod collection;
mod embedding_model;
mod pipeline;
mod schema;
mod search;

pub use auth::AuthApi;
pub use collection::CollectionApi;
pub use embedding_model::EmbeddingModelApi;
pub use pipeline::PipelineApi;
pub use schema::SchemaApi;
pub use search::SimilaritySearchApi;

use dataintel_core::{ApiSession, RequestOptions};

pub(crate) const API_PREFIX: &str = "/api/v1";

/// Base options for a request, carrying the session's bearer token if any.
pub(crate) fn request_options<S: ApiSession + ?Sized>(session: &S) -> RequestOptions {
    match session.authorization() {
        Some(token) => RequestOptions::new().header("Authorization", token),
        None => RequestOptions::new(),
    }
}

/// `/api/v1/{resource}/{name}` with `name` percent-encoded.
pub(crate) fn item_path(resource: &str, name: &str) -> String {
    format!("{}/{}/{}", API_PREFIX, resource, urlencoding::encode(name))
}
