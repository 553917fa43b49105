//! DataIntel Client Library
//!
//! Typed access to the DataIntel REST API: authentication, collections,
//! pipelines, schemas, embedding models and similarity search.
//!
//! ```no_run
//! # async fn run() -> dataintel_rs::Result<()> {
//! use dataintel_rs::{Client, ClientConfig};
//!
//! let config = ClientConfig::new("https://dataintel.example.com");
//! let client = Client::login(&config, "user", "secret").await?;
//! for collection in client.collections().get_collections().await?.iter() {
//!     println!("{}", collection.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
mod client;

pub use api::{
    AuthApi, CollectionApi, EmbeddingModelApi, PipelineApi, SchemaApi, SimilaritySearchApi,
};
pub use client::Client;
pub use dataintel_core::models::*;
pub use dataintel_core::{
    ApiSession, AuthenticatedSession, ClientConfig, ClientError, Result, RetryPolicy, Session,
    TransportOptions,
};
