use super::API_PREFIX;
use dataintel_core::{
    execute_with_retry, not_implemented, AuthenticatedSession, ClientError, LoginRequest,
    LoginResponse, Method, RequestOptions, Result, Session,
};
use tracing::info;

/// Login, token refresh and logout.
pub struct AuthApi;

impl AuthApi {
    /// Log in against `uri` with a default session.
    pub async fn login(uri: &str, username: &str, password: &str) -> Result<AuthenticatedSession> {
        Self::login_with(Session::new(uri), username, password).await
    }

    /// Log in through an already configured session. The returned session
    /// keeps its settings and client handle.
    pub async fn login_with(
        session: Session,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedSession> {
        let token = request_token(&session, username, password).await?;
        info!(uri = %session.uri(), username, "login successful");
        Ok(AuthenticatedSession::new(session, token, username, password))
    }

    /// Replace the session's token using its stored credentials.
    pub async fn refresh(session: &mut AuthenticatedSession) -> Result<()> {
        let token = request_token(session.session(), session.username(), session.password()).await?;
        session.set_token(token);
        info!(uri = %session.uri(), username = session.username(), "token refreshed");
        Ok(())
    }

    /// The service has no logout endpoint; this always fails.
    pub async fn logout(_session: &AuthenticatedSession) -> Result<()> {
        Err(not_implemented("Logout"))
    }
}

async fn request_token(session: &Session, username: &str, password: &str) -> Result<String> {
    let options = RequestOptions::new().json(&LoginRequest { username, password })?;
    let response = execute_with_retry(
        session,
        Method::POST,
        &format!("{}/login", API_PREFIX),
        options,
    )
    .await?;

    let status = response.status();
    if status != 200 {
        return Err(ClientError::HttpStatus {
            status,
            message: format!("Login failed with status code {}", status),
        });
    }

    // A body that is not a JSON object carries no token either.
    let body: LoginResponse = response.json().unwrap_or_default();
    match body.token() {
        Some(token) => Ok(token.to_string()),
        None => Err(ClientError::HttpStatus {
            status,
            message: "Login failed, no JWT token in response".to_string(),
        }),
    }
}
