/// Feed data model
///
/// Posts, comments, media attachments, page results and vote state.
/// Everything here is plain data; wire decoding lives in the gateway.

pub mod page;
pub mod post;
pub mod vote;

pub use page::{FeedScope, PageCursor, PageResult};
pub use post::{Author, Comment, CommentId, MediaAttachment, MediaKind, Post, PostId};
pub use vote::{VoteAction, VoteDirection, VoteIntent, VoteReceipt, VoteState};
