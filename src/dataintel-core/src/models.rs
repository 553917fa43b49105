use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Deref;

/// Ordered list response, kept in wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordList<T>(Vec<T>);

impl<T> RecordList<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Deref for RecordList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for RecordList<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> IntoIterator for RecordList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ---- collections ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub id: String,
    pub name: String,
}

pub type CollectionList = RecordList<CollectionSummary>;

/// Collection details: the pipeline it runs and the buckets feeding it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub pipeline: String,
    pub buckets: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub pipeline: String,
    pub buckets: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketUpdateRequest {
    pub buckets: Vec<String>,
}

/// Outcome of assigning or unassigning buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketUpdate {
    pub success: bool,
    pub message: String,
}

// ---- pipelines ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub id: String,
    pub name: String,
}

pub type PipelineList = RecordList<PipelineSummary>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub name: String,
    #[serde(rename = "type")]
    pub pipeline_type: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub custom_function: Option<String>,
    #[serde(default)]
    pub event_filter: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub schema: Option<String>,
}

/// Which bucket events trigger the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_suffix: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_object_size: Option<u64>,
}

/// NewPipeline is the body of a create-pipeline request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPipeline {
    pub name: String,
    #[serde(rename = "type")]
    pub pipeline_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_function: Option<String>,
    pub event_filter: EventFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl NewPipeline {
    pub fn new(name: impl Into<String>, pipeline_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pipeline_type: pipeline_type.into(),
            model: None,
            custom_function: None,
            event_filter: EventFilter::default(),
            schema: None,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn custom_function(mut self, function: impl Into<String>) -> Self {
        self.custom_function = Some(function.into());
        self
    }

    pub fn object_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_filter.object_suffix = suffixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_object_size(mut self, bytes: u64) -> Self {
        self.event_filter.max_object_size = Some(bytes);
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineCreated {
    pub success: bool,
    pub message: String,
}

/// The server reports deletion details under a capitalised `Error` key even
/// on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDeleted {
    pub status: String,
    #[serde(rename = "Error", default)]
    pub error: Option<HashMap<String, serde_json::Value>>,
}

// ---- schemas ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaList {
    pub schemas: Vec<SchemaSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(rename = "schema")]
    pub fields: Vec<SchemaField>,
}

// ---- embedding models ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelList {
    pub models: Vec<ModelSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingModel {
    pub name: String,
    pub model_name: String,
    pub capabilities: Vec<String>,
    pub dimension: u32,
    pub maximum_tokens: u32,
    pub version: String,
}

// ---- similarity search ----

/// SearchQuery is the body of a similarity-search request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub collection_name: String,
    pub query: String,
    pub access_key: String,
    pub secret_key: String,
    pub top_k: u32,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub search_parameters: HashMap<String, serde_json::Value>,
}

impl SearchQuery {
    pub fn new(
        collection_name: impl Into<String>,
        query: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        top_k: u32,
    ) -> Self {
        Self {
            collection_name: collection_name.into(),
            query: query.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            top_k,
            search_parameters: HashMap::new(),
        }
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.search_parameters.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub score: f64,
    pub data_chunk: String,
    #[serde(default)]
    pub chunk_metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

// ---- auth ----

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Login reply. `Authorization` is optional on the wire; its absence is
/// reported by the auth API, not by decoding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "Authorization", default)]
    pub authorization: Option<serde_json::Value>,
}

impl LoginResponse {
    /// The bearer token, if present as a non-empty string.
    pub fn token(&self) -> Option<&str> {
        self.authorization
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .filter(|token| !token.is_empty())
    }
}
