use crate::api::{
    AuthApi, CollectionApi, EmbeddingModelApi, PipelineApi, SchemaApi, SimilaritySearchApi,
};
use dataintel_core::{AuthenticatedSession, ClientConfig, Result, Session};

/// DataIntel API client
///
/// Owns an authenticated session and hands out the resource APIs over it.
/// All of them share one HTTP client handle.
pub struct Client {
    session: AuthenticatedSession,
}

impl Client {
    /// Log in using the settings in `config`
    pub async fn login(config: &ClientConfig, username: &str, password: &str) -> Result<Self> {
        Self::login_with(Session::from_config(config), username, password).await
    }

    /// Log in through a prepared session
    pub async fn login_with(session: Session, username: &str, password: &str) -> Result<Self> {
        let session = AuthApi::login_with(session, username, password).await?;
        Ok(Self { session })
    }

    /// Wrap a session that already holds a token
    pub fn from_session(session: AuthenticatedSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &AuthenticatedSession {
        &self.session
    }

    pub fn into_session(self) -> AuthenticatedSession {
        self.session
    }

    pub fn collections(&self) -> CollectionApi<&AuthenticatedSession> {
        CollectionApi::new(&self.session)
    }

    pub fn pipelines(&self) -> PipelineApi<&AuthenticatedSession> {
        PipelineApi::new(&self.session)
    }

    pub fn schemas(&self) -> SchemaApi<&AuthenticatedSession> {
        SchemaApi::new(&self.session)
    }

    pub fn models(&self) -> EmbeddingModelApi<&AuthenticatedSession> {
        EmbeddingModelApi::new(&self.session)
    }

    pub fn search(&self) -> SimilaritySearchApi<&AuthenticatedSession> {
        SimilaritySearchApi::new(&self.session)
    }

    /// Fetch a fresh token with the stored credentials
    pub async fn refresh(&mut self) -> Result<()> {
        AuthApi::refresh(&mut self.session).await
    }

    pub async fn logout(&self) -> Result<()> {
        AuthApi::logout(&self.session).await
    }
}
