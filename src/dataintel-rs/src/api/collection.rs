use super::{item_path, request_options, API_PREFIX};
use dataintel_core::{
    check_status, execute_with_retry, parse_json, ApiSession, BucketUpdate, BucketUpdateRequest,
    Collection, CollectionList, CreateCollectionRequest, Method, Result,
};

/// Collections group buckets under a processing pipeline.
pub struct CollectionApi<S> {
    session: S,
}

impl<S: ApiSession> CollectionApi<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub async fn get_collections(&self) -> Result<CollectionList> {
        let response = execute_with_retry(
            self.session.session(),
            Method::GET,
            &format!("{}/collections", API_PREFIX),
            request_options(&self.session),
        )
        .await?;
        parse_json(response)
    }

    pub async fn get_collection(&self, name: &str) -> Result<Collection> {
        let response = execute_with_retry(
            self.session.session(),
            Method::GET,
            &item_path("collections", name),
            request_options(&self.session),
        )
        .await?;
        parse_json(response)
    }

    pub async fn create_collection(
        &self,
        name: &str,
        pipeline: &str,
        buckets: &[String],
    ) -> Result<Collection> {
        let body = CreateCollectionRequest {
            name: name.to_string(),
            pipeline: pipeline.to_string(),
            buckets: buckets.to_vec(),
        };
        let response = execute_with_retry(
            self.session.session(),
            Method::POST,
            &format!("{}/collections", API_PREFIX),
            request_options(&self.session).json(&body)?,
        )
        .await?;
        parse_json(response)
    }

    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        let response = execute_with_retry(
            self.session.session(),
            Method::DELETE,
            &item_path("collections", name),
            request_options(&self.session),
        )
        .await?;
        check_status(response)?;
        Ok(())
    }

    pub async fn assign_buckets_to_collection(
        &self,
        collection_name: &str,
        buckets: &[String],
    ) -> Result<BucketUpdate> {
        self.update_buckets(collection_name, "assign", buckets).await
    }

    pub async fn unassign_buckets_from_collection(
        &self,
        collection_name: &str,
        buckets: &[String],
    ) -> Result<BucketUpdate> {
        self.update_buckets(collection_name, "unassign", buckets).await
    }

    async fn update_buckets(
        &self,
        collection_name: &str,
        action: &str,
        buckets: &[String],
    ) -> Result<BucketUpdate> {
        let body = BucketUpdateRequest {
            buckets: buckets.to_vec(),
        };
        let path = format!("{}/buckets/{}", item_path("collections", collection_name), action);
        let response = execute_with_retry(
            self.session.session(),
            Method::POST,
            &path,
            request_options(&self.session).json(&body)?,
        )
        .await?;
        parse_json(response)
    }
}
