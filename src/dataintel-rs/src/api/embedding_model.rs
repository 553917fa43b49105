use super::{item_path, request_options, API_PREFIX};
use dataintel_core::{
    execute_with_retry, parse_json, ApiSession, EmbeddingModel, Method, ModelList, Result,
};

/// Read-only access to the embedding models known to the service.
pub struct EmbeddingModelApi<S> {
    session: S,
}

impl<S: ApiSession> EmbeddingModelApi<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub async fn get_models(&self) -> Result<ModelList> {
        let response = execute_with_retry(
            self.session.session(),
            Method::GET,
            &format!("{}/models", API_PREFIX),
            request_options(&self.session),
        )
        .await?;
        parse_json(response)
    }

    pub async fn get_model(&self, name: &str) -> Result<EmbeddingModel> {
        let response = execute_with_retry(
            self.session.session(),
            Method::GET,
            &item_path("models", name),
            request_options(&self.session),
        )
        .await?;
        parse_json(response)
    }
}
