/// Fetch Gateway
///
/// The contract the feed core needs from the REST API: paged fetches,
/// "newest N" fetches, vote toggles, comment creation and post removal.
/// `HttpGateway` is the production implementation; tests substitute
/// scripted gateways.

pub mod http;
pub mod wire;

pub use http::HttpGateway;

use crate::error::FeedResult;
use crate::models::{Comment, FeedScope, PageCursor, PageResult, PostId, VoteDirection, VoteReceipt};
use async_trait::async_trait;

/// Feed API backend trait
///
/// Every method returns a fully validated value or an error; no partial
/// results ever reach the store.
#[async_trait]
pub trait FeedGateway: Send + Sync {
    /// Fetch one page of posts in `scope`, newest first
    async fn fetch_page(&self, scope: FeedScope, cursor: PageCursor) -> FeedResult<PageResult>;

    /// Fetch the newest `limit` posts in `scope` for pull-to-refresh
    async fn fetch_latest(&self, scope: FeedScope, limit: u32) -> FeedResult<PageResult>;

    /// Toggle a vote on a post and return the authoritative counter
    async fn vote(&self, post_id: PostId, direction: VoteDirection) -> FeedResult<VoteReceipt>;

    /// Create a comment as the current user
    async fn add_comment(&self, post_id: PostId, text: &str) -> FeedResult<Comment>;

    /// Remove a post (moderation or author deletion)
    async fn delete_post(&self, post_id: PostId) -> FeedResult<()>;
}

/// "Current user identity" capability supplied by the auth layer
pub trait CredentialProvider: Send + Sync {
    /// Bearer token for the signed-in user, if any
    fn bearer_token(&self) -> Option<String>;
}

/// Credential fixed at startup
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}
