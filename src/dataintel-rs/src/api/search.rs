use super::{request_options, API_PREFIX};
use dataintel_core::{
    check_search_status, execute_with_retry, ApiSession, Method, Result, SearchQuery,
    SearchResponse, SearchResult,
};
use tracing::debug;

pub struct SimilaritySearchApi<S> {
    session: S,
}

impl<S: ApiSession> SimilaritySearchApi<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// Run a similarity search. Results keep the server's ranking; a reply
    /// without `results` yields an empty list.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let response = execute_with_retry(
            self.session.session(),
            Method::POST,
            &format!("{}/similarity-search", API_PREFIX),
            request_options(&self.session).json(query)?,
        )
        .await?;

        let body: SearchResponse = check_search_status(response)?.json()?;
        debug!(
            collection = %query.collection_name,
            hits = body.results.len(),
            "similarity search finished"
        );
        Ok(body.results)
    }
}
