/// Box Feed - feed synchronization core
///
/// Keeps a paginated, infinitely scrollable list of posts consistent
/// across forward pagination, pull-to-refresh, optimistic votes and
/// comment appends.

pub mod config;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod metrics;
pub mod models;
pub mod session;
pub mod sync;

pub use config::FeedConfig;
pub use error::{FailureKind, FeedError, FeedResult};
pub use feed::{CategoryFilter, FeedStore, MergeMode};
pub use gateway::{CredentialProvider, FeedGateway, HttpGateway, StaticCredentials};
pub use models::{Comment, FeedScope, PageCursor, PageResult, Post, PostId, VoteDirection, VoteIntent, VoteState};
pub use session::{FeedSession, PageOutcome, RefreshOutcome, VoteOutcome};
