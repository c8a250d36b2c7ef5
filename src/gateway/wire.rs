/// JSON wire formats for the feed API and their conversion into models.
///
/// Decoding is lenient: missing or mistyped optional fields become empty
/// values. Only the fields the feed cannot work without (the `posts`
/// array, post ids, vote counters, the created comment) are enforced.
use crate::error::{FeedError, FeedResult};
use crate::models::{
    Author, Comment, CommentId, MediaAttachment, PageCursor, PageResult, Post, VoteAction,
    VoteDirection, VoteReceipt,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// `GET /posts` response body
#[derive(Debug, Deserialize)]
pub struct PostsEnvelope {
    #[serde(default)]
    pub posts: Option<Vec<Value>>,
    #[serde(default)]
    pub has_next: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WirePost {
    id: Option<i64>,
    user: Option<Value>,
    username: Option<Value>,
    profile_picture: Option<Value>,
    content: Option<Value>,
    images: Option<Value>,
    videos: Option<Value>,
    is_anonymous: Option<Value>,
    user_data: Option<Value>,
    created_at: Option<Value>,
    updated_at: Option<Value>,
    upvotes: Option<Value>,
    downvotes: Option<Value>,
    comments: Option<Value>,
    parties: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireComment {
    id: Option<Value>,
    username: Option<String>,
    full_name: Option<String>,
    profile_picture: Option<String>,
    text: Option<String>,
    timestamp: Option<String>,
    created_at: Option<String>,
}

/// `POST /posts/{id}/upvote` and `/downvote` response body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VoteEnvelope {
    pub new_upvotes: Option<i64>,
    pub new_downvotes: Option<i64>,
    pub action: Option<String>,
}

/// `POST /posts/{id}/comment` response body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentEnvelope {
    pub comment: Option<Value>,
}

impl PostsEnvelope {
    /// Validate the envelope and convert every post, all or nothing
    pub fn into_page(self, cursor: PageCursor) -> FeedResult<PageResult> {
        let raw = self
            .posts
            .ok_or_else(|| FeedError::Malformed("Response has no posts array".to_string()))?;

        let posts = raw
            .into_iter()
            .map(decode_post)
            .collect::<FeedResult<Vec<Post>>>()?;

        let next_cursor = if self.has_next.unwrap_or(false) {
            Some(cursor.next())
        } else {
            None
        };

        Ok(PageResult::new(posts, next_cursor))
    }
}

impl VoteEnvelope {
    pub fn into_receipt(self, direction: VoteDirection) -> FeedResult<VoteReceipt> {
        let count = match direction {
            VoteDirection::Up => self.new_upvotes,
            VoteDirection::Down => self.new_downvotes,
        }
        .ok_or_else(|| {
            FeedError::Malformed(format!("Vote response has no new {}vote count", direction.as_str()))
        })?;

        let action = match self.action.as_deref() {
            Some("added") => VoteAction::Added,
            Some("removed") => VoteAction::Removed,
            other => {
                return Err(FeedError::Malformed(format!(
                    "Unknown vote action: {:?}",
                    other
                )))
            }
        };

        Ok(VoteReceipt {
            direction,
            count,
            action,
        })
    }
}

impl CommentEnvelope {
    pub fn into_comment(self) -> FeedResult<Comment> {
        let raw = self
            .comment
            .ok_or_else(|| FeedError::Malformed("Response has no comment".to_string()))?;
        decode_comment(raw)
            .ok_or_else(|| FeedError::Malformed("Comment is not an object".to_string()))
    }
}

fn decode_post(raw: Value) -> FeedResult<Post> {
    if !raw.is_object() {
        return Err(FeedError::Malformed("Post is not an object".to_string()));
    }

    let wire: WirePost = serde_json::from_value(raw)
        .map_err(|e| FeedError::Malformed(format!("Invalid post: {}", e)))?;
    let id = wire
        .id
        .ok_or_else(|| FeedError::Malformed("Post has no id".to_string()))?;

    let mut post = Post::new(id, text(&wire.content).unwrap_or_default())
        .with_votes(count(&wire.upvotes), count(&wire.downvotes));

    if wire.is_anonymous.as_ref().and_then(Value::as_bool).unwrap_or(false) {
        post = post.anonymous();
    } else {
        post = post.with_author(decode_author(&wire));
    }

    // Images first, then videos; each entry is routed by its own MIME prefix.
    post.media = items(&wire.images)
        .chain(items(&wire.videos))
        .filter_map(media_payload)
        .filter_map(MediaAttachment::sniff)
        .collect();

    post.created_at = text(&wire.created_at).as_deref().and_then(parse_timestamp);
    post.updated_at = text(&wire.updated_at).as_deref().and_then(parse_timestamp);

    post.comments = items(&wire.comments)
        .cloned()
        .filter_map(decode_comment)
        .collect();

    post.categories = items(&wire.parties)
        .filter_map(|party| party.get("party_name").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    Ok(post)
}

/// Elements of an optional JSON array; anything else is treated as empty
fn items(value: &Option<Value>) -> impl Iterator<Item = &Value> {
    value
        .as_ref()
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn text(value: &Option<Value>) -> Option<String> {
    value
        .as_ref()
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn count(value: &Option<Value>) -> i64 {
    value.as_ref().and_then(Value::as_i64).unwrap_or(0)
}

fn decode_author(wire: &WirePost) -> Option<Author> {
    let user = wire.user.as_ref();
    let user_data = wire.user_data.as_ref();

    let field = |value: Option<&Value>, key: &str| {
        value
            .and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let username = field(user, "username")
        .or_else(|| text(&wire.username))
        .or_else(|| field(user_data, "username"))?;

    Some(Author {
        user_id: user.and_then(|u| u.get("id")).and_then(Value::as_i64),
        username,
        full_name: field(user, "full_name").or_else(|| field(user_data, "fullName")),
        profile_picture: field(user, "profile_picture")
            .or_else(|| text(&wire.profile_picture))
            .or_else(|| field(user_data, "profilePicture")),
    })
}

/// Accepts `{ "data": "data:..." }` objects as well as bare strings
fn media_payload(item: &Value) -> Option<&str> {
    match item {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("data").and_then(Value::as_str),
        _ => None,
    }
}

fn decode_comment(raw: Value) -> Option<Comment> {
    if !raw.is_object() {
        return None;
    }
    let wire: WireComment = serde_json::from_value(raw).ok()?;

    let id = match wire.id {
        Some(Value::Number(n)) => n.as_i64().map(CommentId::Number),
        Some(Value::String(s)) if !s.is_empty() => Some(CommentId::Text(s)),
        _ => None,
    };

    let author_name = wire
        .full_name
        .filter(|s| !s.is_empty())
        .or(wire.username.filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "Anonymous".to_string());

    Some(Comment {
        id,
        author_name,
        author_avatar: wire
            .profile_picture
            .as_deref()
            .and_then(Comment::normalize_avatar),
        text: wire.text.unwrap_or_default(),
        timestamp: wire
            .timestamp
            .or(wire.created_at)
            .as_deref()
            .and_then(parse_timestamp),
    })
}

/// Parse RFC3339, falling back to naive ISO-8601 interpreted as UTC
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaKind, PostId};
    use serde_json::json;

    fn envelope(value: Value) -> PostsEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_full_post() {
        let page = envelope(json!({
            "posts": [{
                "id": 42,
                "user": { "id": 3, "username": "thandi", "full_name": "Thandi N" },
                "content": "Vote on Friday",
                "images": [{ "data": "data:video/mp4;base64,AAAA" }, { "data": "data:image/png;base64,AAAA" }],
                "videos": [],
                "is_anonymous": false,
                "created_at": "2024-03-01T10:00:00.123456Z",
                "upvotes": 4,
                "downvotes": 1,
                "comments": [{ "id": "comment_42_1", "username": "sipho", "text": "agreed", "timestamp": "2024-03-01T11:00:00.5" }],
                "parties": [{ "id": 1, "party_name": "Green Front" }]
            }],
            "has_next": true
        }))
        .into_page(PageCursor::first(5))
        .unwrap();

        let post = &page.posts[0];
        assert_eq!(post.id, PostId(42));
        assert_eq!(post.author_label(), "Thandi N");
        assert_eq!(post.upvotes, 4);
        assert_eq!(post.media.len(), 2);
        assert_eq!(post.media[0].kind, MediaKind::Video);
        assert!(post.created_at.is_some());
        assert_eq!(post.comments[0].id, Some(CommentId::Text("comment_42_1".into())));
        assert_eq!(post.comments[0].author_name, "sipho");
        assert!(post.comments[0].timestamp.is_some());
        assert_eq!(post.categories, vec!["Green Front".to_string()]);
        assert_eq!(page.next_cursor.map(|c| c.page()), Some(2));
        assert_eq!(page.as_of, Some(PostId(42)));
    }

    #[test]
    fn test_missing_optional_fields_are_empty() {
        let page = envelope(json!({
            "posts": [
                { "id": 1, "images": "not-a-list", "comments": null, "upvotes": "many" },
                { "id": 2 }
            ]
        }))
        .into_page(PageCursor::first(5))
        .unwrap();

        for post in &page.posts {
            assert!(post.media.is_empty());
            assert!(post.comments.is_empty());
            assert!(post.categories.is_empty());
            assert!(post.author().is_none());
            assert_eq!(post.upvotes, 0);
        }
        assert!(!page.has_next());
    }

    #[test]
    fn test_anonymous_post_drops_identity() {
        let page = envelope(json!({
            "posts": [{ "id": 5, "username": "secret", "is_anonymous": true }]
        }))
        .into_page(PageCursor::first(5))
        .unwrap();

        assert!(page.posts[0].author().is_none());
    }

    #[test]
    fn test_missing_posts_array_is_malformed() {
        let result = envelope(json!({ "message": "ok" })).into_page(PageCursor::first(5));
        assert!(matches!(result, Err(FeedError::Malformed(_))));
    }

    #[test]
    fn test_post_without_id_rejects_whole_page() {
        let result = envelope(json!({ "posts": [{ "id": 1 }, { "content": "x" }] }))
            .into_page(PageCursor::first(5));
        assert!(matches!(result, Err(FeedError::Malformed(_))));
    }

    #[test]
    fn test_vote_envelope() {
        let receipt = VoteEnvelope {
            new_upvotes: Some(6),
            action: Some("added".to_string()),
            ..Default::default()
        }
        .into_receipt(VoteDirection::Up)
        .unwrap();
        assert_eq!(receipt.count, 6);
        assert_eq!(receipt.action, VoteAction::Added);

        let missing = VoteEnvelope {
            new_upvotes: Some(6),
            action: Some("added".to_string()),
            ..Default::default()
        }
        .into_receipt(VoteDirection::Down);
        assert!(missing.is_err());

        let bad_action = VoteEnvelope {
            new_downvotes: Some(1),
            action: Some("flipped".to_string()),
            ..Default::default()
        }
        .into_receipt(VoteDirection::Down);
        assert!(bad_action.is_err());
    }

    #[test]
    fn test_comment_envelope() {
        let envelope: CommentEnvelope = serde_json::from_value(json!({
            "comment": { "id": 9, "full_name": "", "username": "lebo", "profile_picture": "abcd", "text": "yes" }
        }))
        .unwrap();
        let comment = envelope.into_comment().unwrap();
        assert_eq!(comment.id, Some(CommentId::Number(9)));
        assert_eq!(comment.author_name, "lebo");
        assert_eq!(
            comment.author_avatar.as_deref(),
            Some("data:image/jpeg;base64,abcd")
        );

        let empty: CommentEnvelope = serde_json::from_value(json!({})).unwrap();
        assert!(empty.into_comment().is_err());
    }
}
