use super::{item_path, request_options, API_PREFIX};
use dataintel_core::{
    execute_with_retry, parse_json, ApiSession, Method, NewPipeline, Pipeline, PipelineCreated,
    PipelineDeleted, PipelineList, Result,
};
use tracing::debug;

/// Pipelines bind an embedding model and event filter to bucket events.
pub struct PipelineApi<S> {
    session: S,
}

impl<S: ApiSession> PipelineApi<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub async fn create_pipeline(&self, pipeline: &NewPipeline) -> Result<PipelineCreated> {
        debug!(name = %pipeline.name, pipeline_type = %pipeline.pipeline_type, "creating pipeline");
        let response = execute_with_retry(
            self.session.session(),
            Method::POST,
            &format!("{}/pipelines", API_PREFIX),
            request_options(&self.session).json(pipeline)?,
        )
        .await?;
        parse_json(response)
    }

    pub async fn get_pipeline(&self, name: &str) -> Result<Pipeline> {
        let response = execute_with_retry(
            self.session.session(),
            Method::GET,
            &item_path("pipelines", name),
            request_options(&self.session),
        )
        .await?;
        parse_json(response)
    }

    pub async fn get_pipelines(&self) -> Result<PipelineList> {
        let response = execute_with_retry(
            self.session.session(),
            Method::GET,
            &format!("{}/pipelines", API_PREFIX),
            request_options(&self.session),
        )
        .await?;
        parse_json(response)
    }

    pub async fn delete_pipeline(&self, name: &str) -> Result<PipelineDeleted> {
        let response = execute_with_retry(
            self.session.session(),
            Method::DELETE,
            &item_path("pipelines", name),
            request_options(&self.session),
        )
        .await?;
        parse_json(response)
    }
}
