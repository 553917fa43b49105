use super::{item_path, request_options, API_PREFIX};
use dataintel_core::{execute_with_retry, parse_json, ApiSession, Method, Result, Schema, SchemaList};

pub struct SchemaApi<S> {
    session: S,
}

impl<S: ApiSession> SchemaApi<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub async fn get_schemas(&self) -> Result<SchemaList> {
        let response = execute_with_retry(
            self.session.session(),
            Method::GET,
            &format!("{}/schemas", API_PREFIX),
            request_options(&self.session),
        )
        .await?;
        parse_json(response)
    }

    pub async fn get_schema(&self, name: &str) -> Result<Schema> {
        let response = execute_with_retry(
            self.session.session(),
            Method::GET,
            &item_path("schemas", name),
            request_options(&self.session),
        )
        .await?;
        parse_json(response)
    }
}
