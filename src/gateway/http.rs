/// HTTP gateway - the REST API behind the feed
use crate::{
    config::ApiConfig,
    error::{FeedError, FeedResult},
    gateway::{
        wire::{CommentEnvelope, PostsEnvelope, VoteEnvelope},
        CredentialProvider, FeedGateway,
    },
    models::{Comment, FeedScope, PageCursor, PageResult, PostId, VoteDirection, VoteReceipt},
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// reqwest-backed implementation of [`FeedGateway`]
#[derive(Clone)]
pub struct HttpGateway {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpGateway {
    /// Create a new gateway
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialProvider>) -> FeedResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FeedError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer credential when one is available
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Same as [`authorize`](Self::authorize) but the endpoint refuses anonymous callers
    fn require_auth(&self, request: RequestBuilder) -> FeedResult<RequestBuilder> {
        let token = self.credentials.bearer_token().ok_or_else(|| {
            FeedError::Authentication("No signed-in user; please log in".to_string())
        })?;
        Ok(request.bearer_auth(token))
    }

    async fn get_posts(&self, scope: FeedScope, cursor: PageCursor) -> FeedResult<PageResult> {
        let path = scope.path();
        debug!("GET {} page={} limit={}", path, cursor.page(), cursor.limit());

        let response = self
            .authorize(self.http_client.get(self.url(&path)))
            .query(&[("page", cursor.page()), ("limit", cursor.limit())])
            .send()
            .await?;

        let envelope: PostsEnvelope = check_status(response).await?.json().await?;
        envelope.into_page(cursor)
    }
}

/// Map non-2xx responses onto the error taxonomy
async fn check_status(response: Response) -> FeedResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!("Feed API returned {}: {}", status, body);

    match status {
        StatusCode::UNAUTHORIZED => Err(FeedError::Authentication(body)),
        StatusCode::NOT_FOUND => Err(FeedError::NotFound(body)),
        _ => Err(FeedError::Status { status, body }),
    }
}

#[async_trait]
impl FeedGateway for HttpGateway {
    async fn fetch_page(&self, scope: FeedScope, cursor: PageCursor) -> FeedResult<PageResult> {
        self.get_posts(scope, cursor).await
    }

    async fn fetch_latest(&self, scope: FeedScope, limit: u32) -> FeedResult<PageResult> {
        // No dedicated endpoint: the first page with a larger limit.
        self.get_posts(scope, PageCursor::first(limit)).await
    }

    async fn vote(&self, post_id: PostId, direction: VoteDirection) -> FeedResult<VoteReceipt> {
        let endpoint = match direction {
            VoteDirection::Up => "upvote",
            VoteDirection::Down => "downvote",
        };
        debug!("POST /posts/{}/{}", post_id, endpoint);

        let response = self
            .authorize(
                self.http_client
                    .post(self.url(&format!("/posts/{}/{}", post_id, endpoint))),
            )
            .send()
            .await?;

        let envelope: VoteEnvelope = check_status(response).await?.json().await?;
        envelope.into_receipt(direction)
    }

    async fn add_comment(&self, post_id: PostId, text: &str) -> FeedResult<Comment> {
        debug!("POST /posts/{}/comment", post_id);

        let request = self
            .http_client
            .post(self.url(&format!("/posts/{}/comment", post_id)))
            .json(&json!({ "comment": text }));

        let response = self.require_auth(request)?.send().await?;

        let envelope: CommentEnvelope = check_status(response).await?.json().await?;
        envelope.into_comment()
    }

    async fn delete_post(&self, post_id: PostId) -> FeedResult<()> {
        debug!("DELETE /posts/{}", post_id);

        let request = self
            .http_client
            .delete(self.url(&format!("/posts/{}", post_id)));

        let response = self.require_auth(request)?.send().await?;
        check_status(response).await?;

        Ok(())
    }
}
